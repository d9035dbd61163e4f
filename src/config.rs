//! File-based configuration for the command-line front end.
//!
//! ```yaml
//! url_filter: "/a\\.com/i"
//! run:
//!   jobs: 4
//!   retries: 1
//! rules:
//!   skip:
//!     - id: oopif
//!       reason: "no OOPIF support"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::errors::{SmokeError, SmokeResult};
use crate::options::{RunOptions, SmokehouseOptions};
use crate::pattern::Pattern;
use crate::rules::{RuleSet, SkipRule};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmokehouseConfig {
    #[serde(default)]
    pub url_filter: Option<Pattern>,
    #[serde(default)]
    pub run: RunOptions,
    #[serde(default)]
    pub rules: RuleSet,
}

impl SmokehouseConfig {
    /// Reads a YAML or JSON config; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> SmokeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SmokeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| SmokeError::config(format!("{}: {}", path.display(), e)))
    }

    /// Layers command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> SmokeResult<()> {
        if let Some(filter) = &overrides.url_filter {
            self.url_filter = Some(filter.parse()?);
        }
        if let Some(jobs) = overrides.jobs {
            if jobs == 0 {
                return Err(SmokeError::config("--jobs must be at least 1"));
            }
            self.run.jobs = jobs;
        }
        if let Some(retries) = overrides.retries {
            self.run.retries = retries;
        }
        if overrides.debug {
            self.run.is_debug = true;
        }
        for spec in &overrides.skip {
            self.rules.skip.push(parse_skip_spec(spec)?);
        }
        Ok(())
    }

    /// Builds run options whose hooks come from the rule set.
    pub fn into_options<'a>(self) -> SmokehouseOptions<'a> {
        SmokehouseOptions::new()
            .policies(self.rules.into_policies(self.url_filter))
            .run_options(self.run)
    }
}

/// Values given on the command line that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url_filter: Option<String>,
    pub jobs: Option<usize>,
    pub retries: Option<usize>,
    pub debug: bool,
    pub skip: Vec<String>,
}

/// Parses `ID` or `ID:REASON` into a skip rule.
pub fn parse_skip_spec(spec: &str) -> SmokeResult<SkipRule> {
    let (id, reason) = match spec.split_once(':') {
        Some((id, reason)) => (id.trim(), reason.trim()),
        None => (spec.trim(), "skipped from the command line"),
    };
    if id.is_empty() {
        return Err(SmokeError::config(format!("invalid --skip value '{}'", spec)));
    }
    let reason = if reason.is_empty() {
        "skipped from the command line"
    } else {
        reason
    };
    Ok(SkipRule::for_id(id, reason))
}
