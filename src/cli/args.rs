//! Defines the command-line arguments and subcommands for the smokehouse CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "smokehouse",
    version,
    about = "Filter, skip, and rewrite smoke test expectations before they run."
)]
pub struct SmokehouseArgs {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which test definitions and urls would run.
    List(SelectionArgs),
    /// Print the filtered corpus and run options as encoded JSON.
    Dump {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Indent the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Show what the modify rules change in each expectation.
    Diff(SelectionArgs),
}

/// Where the corpus comes from and how it is filtered.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Corpus file (.json, .yaml) or directory; the embedded corpus otherwise.
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// Config file with url filter, run options, and rules.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Only keep expectations whose requested url matches, e.g. `/a\.com/i`.
    /// Text whose tail after the last slash is not a flag string, such as
    /// `/redirects/final`, is matched as written.
    #[arg(long, value_name = "PATTERN")]
    pub url_filter: Option<String>,
    /// Skip a test definition by id, optionally with a reason: `ID[:REASON]`.
    #[arg(long, value_name = "ID[:REASON]")]
    pub skip: Vec<String>,
    /// Number of parallel jobs passed to the engine.
    #[arg(long)]
    pub jobs: Option<usize>,
    /// Retries per test passed to the engine.
    #[arg(long)]
    pub retries: Option<usize>,
    /// Ask the engine for debug output.
    #[arg(long)]
    pub debug: bool,
    /// Reject malformed encoded patterns instead of keeping them as strings.
    #[arg(long)]
    pub strict: bool,
}

impl SelectionArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url_filter: self.url_filter.clone(),
            jobs: self.jobs,
            retries: self.retries,
            debug: self.debug,
            skip: self.skip.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_consistent() {
        SmokehouseArgs::command().debug_assert();
    }

    #[test]
    fn skip_is_repeatable() {
        let args = SmokehouseArgs::parse_from([
            "smokehouse",
            "list",
            "--skip",
            "oopif",
            "--skip",
            "seo:flaky",
            "-vv",
        ]);
        assert_eq!(args.verbose, 2);
        let Command::List(selection) = args.command else {
            panic!("expected list");
        };
        assert_eq!(selection.overrides().skip, vec!["oopif", "seo:flaky"]);
    }
}
