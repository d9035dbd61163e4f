//! Caller configuration for a smokehouse run.
//!
//! [`SmokehouseOptions`] carries the three filtering policies (url filter,
//! skip, modify), the diagnostic sink, and the [`RunOptions`] that are handed
//! to the execution engine untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::{Expectation, TestDefinition};
use crate::errors::HookError;
use crate::output::{OutputSink, StdoutSink};
use crate::pattern::Pattern;

/// Skip predicate: `Ok(Some(reason))` drops the expectation.
pub type SkipFn<'a> =
    Box<dyn FnMut(&TestDefinition, &Expectation) -> Result<Option<String>, HookError> + 'a>;

/// Modify procedure: rewrites the expectation in place.
pub type ModifyFn<'a> =
    Box<dyn FnMut(&TestDefinition, &mut Expectation) -> Result<(), HookError> + 'a>;

fn default_jobs() -> usize {
    1
}

/// Options forwarded verbatim to the execution engine.
///
/// Unrecognised fields are kept in `extra` and serialized back out flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default)]
    pub retries: usize,
    #[serde(default)]
    pub is_debug: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            retries: 0,
            is_debug: false,
            extra: BTreeMap::new(),
        }
    }
}

/// The filtering half of the options, consumed by the filter stage.
#[derive(Default)]
pub struct Policies<'a> {
    pub url_filter: Option<Pattern>,
    pub skip: Option<SkipFn<'a>>,
    pub modify: Option<ModifyFn<'a>>,
}

impl fmt::Debug for Policies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policies")
            .field("url_filter", &self.url_filter)
            .field("skip", &self.skip.is_some())
            .field("modify", &self.modify.is_some())
            .finish()
    }
}

impl<'a> Policies<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url_filter(mut self, pattern: Pattern) -> Self {
        self.url_filter = Some(pattern);
        self
    }

    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: FnMut(&TestDefinition, &Expectation) -> Result<Option<String>, HookError> + 'a,
    {
        self.skip = Some(Box::new(skip));
        self
    }

    pub fn with_modify<F>(mut self, modify: F) -> Self
    where
        F: FnMut(&TestDefinition, &mut Expectation) -> Result<(), HookError> + 'a,
    {
        self.modify = Some(Box::new(modify));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.url_filter.is_none() && self.skip.is_none() && self.modify.is_none()
    }
}

/// Everything a caller can configure for one run.
#[derive(Default)]
pub struct SmokehouseOptions<'a> {
    pub policies: Policies<'a>,
    pub run: RunOptions,
    /// Where skip lines go; stdout when unset.
    pub output: Option<Box<dyn OutputSink + 'a>>,
}

impl fmt::Debug for SmokehouseOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmokehouseOptions")
            .field("policies", &self.policies)
            .field("run", &self.run)
            .field("output", &self.output.is_some())
            .finish()
    }
}

impl<'a> SmokehouseOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_filter(mut self, pattern: Pattern) -> Self {
        self.policies = self.policies.with_url_filter(pattern);
        self
    }

    pub fn skip<F>(mut self, skip: F) -> Self
    where
        F: FnMut(&TestDefinition, &Expectation) -> Result<Option<String>, HookError> + 'a,
    {
        self.policies = self.policies.with_skip(skip);
        self
    }

    pub fn modify<F>(mut self, modify: F) -> Self
    where
        F: FnMut(&TestDefinition, &mut Expectation) -> Result<(), HookError> + 'a,
    {
        self.policies = self.policies.with_modify(modify);
        self
    }

    pub fn policies(mut self, policies: Policies<'a>) -> Self {
        self.policies = policies;
        self
    }

    pub fn run_options(mut self, run: RunOptions) -> Self {
        self.run = run;
        self
    }

    pub fn output(mut self, sink: impl OutputSink + 'a) -> Self {
        self.output = Some(Box::new(sink));
        self
    }

    /// Splits the options into the filter policies, the engine options, and
    /// the diagnostic sink.
    pub fn into_parts(self) -> (Policies<'a>, RunOptions, Box<dyn OutputSink + 'a>) {
        let output = self.output.unwrap_or_else(|| Box::new(StdoutSink));
        (self.policies, self.run, output)
    }
}
