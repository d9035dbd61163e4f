//! The smokehouse command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Every command runs the full pipeline against
//! the dry-run engine, so nothing is executed, only selected and rewritten.

use crate::cli::args::{Command, SelectionArgs, SmokehouseArgs};
use crate::cli::output::{ExpectationChange, StderrSink};
use crate::cloner::Codec;
use crate::config::SmokehouseConfig;
use crate::corpus::{Corpus, TestDefinition};
use crate::engine::{smokehouse, smokehouse_with_corpus, DryRunEngine, RunPlan};
use crate::errors::{SmokeError, SmokeResult};
use crate::logging;
use crate::options::SmokehouseOptions;
use clap::Parser;
use std::process;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = SmokehouseArgs::parse();

    if let Err(e) = logging::init_logging(args.verbose, args.quiet) {
        output::print_error(e);
        process::exit(1);
    }

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::List(selection) => handle_list(&selection),
        Command::Dump { selection, pretty } => handle_dump(&selection, pretty),
        Command::Diff(selection) => handle_diff(&selection),
    };

    if let Err(e) = result {
        output::print_error(e);
        process::exit(1);
    }
}

/// Handles the `list` subcommand.
fn handle_list(selection: &SelectionArgs) -> SmokeResult<()> {
    let (corpus, config) = load_selection(selection)?;
    let plan = execute(corpus.as_deref(), config.into_options())?;
    output::print_plan(&plan);
    Ok(())
}

/// Handles the `dump` subcommand. Skip lines go to stderr so stdout stays JSON.
fn handle_dump(selection: &SelectionArgs, pretty: bool) -> SmokeResult<()> {
    let codec = codec_for(selection);
    let (corpus, config) = load_selection(selection)?;
    let options = config.into_options().output(StderrSink);
    let plan = execute(corpus.as_deref(), options)?;

    let document = serde_json::json!({
        "tests": codec.to_json(&Corpus::to_value(&plan.tests)),
        "options": serde_json::to_value(&plan.options).map_err(SmokeError::Serialize)?,
    });
    let text = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(SmokeError::Serialize)?;
    println!("{}", text);
    Ok(())
}

/// Handles the `diff` subcommand.
fn handle_diff(selection: &SelectionArgs) -> SmokeResult<()> {
    let codec = codec_for(selection);
    let (corpus, config) = load_selection(selection)?;
    let mut changes: Vec<ExpectationChange> = Vec::new();
    {
        let mut options = config.into_options();
        if let Some(mut inner) = options.policies.modify.take() {
            let changes = &mut changes;
            let policies = std::mem::take(&mut options.policies);
            options.policies = policies.with_modify(move |test, expectation| {
                let before = expectation.clone();
                inner(test, expectation)?;
                if *expectation != before {
                    changes.push(ExpectationChange {
                        test_id: test.id.clone(),
                        url: before.requested_url().unwrap_or_default().to_string(),
                        before: codec.encode_pretty(before.as_value())?,
                        after: codec.encode_pretty(expectation.as_value())?,
                    });
                }
                Ok(())
            });
        }
        execute(corpus.as_deref(), options)?;
    }
    tracing::debug!(changed = changes.len(), "Collected modify changes");
    output::print_changes(&changes);
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn codec_for(selection: &SelectionArgs) -> Codec {
    if selection.strict {
        Codec::strict()
    } else {
        Codec::default()
    }
}

/// Loads the corpus (`None` means the embedded one) and the layered config.
fn load_selection(
    selection: &SelectionArgs,
) -> SmokeResult<(Option<Vec<TestDefinition>>, SmokehouseConfig)> {
    let codec = codec_for(selection);
    let corpus = match &selection.corpus {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading corpus");
            Some(Corpus::load(path, &codec)?)
        }
        None => None,
    };
    let mut config = match &selection.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading config");
            SmokehouseConfig::load(path)?
        }
        None => SmokehouseConfig::default(),
    };
    config.apply_overrides(&selection.overrides())?;
    Ok((corpus, config))
}

fn execute(
    corpus: Option<&[TestDefinition]>,
    options: SmokehouseOptions<'_>,
) -> SmokeResult<RunPlan> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| SmokeError::config(format!("cannot start async runtime: {}", e)))?;
    match corpus {
        Some(tests) => runtime.block_on(smokehouse_with_corpus(tests, &DryRunEngine, options)),
        None => runtime.block_on(smokehouse(&DryRunEngine, options)),
    }
}
