//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing, colorizing output, and
//! formatting errors. By centralizing output logic here, we ensure a
//! consistent user experience across all commands.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::engine::RunPlan;
use crate::errors::SmokeError;
use crate::output::OutputSink;

/// StderrSink: skip lines for commands whose stdout must stay machine-readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn emit(&mut self, text: &str) {
        eprintln!("{}", text);
    }
}

/// One expectation a modify rule changed.
#[derive(Debug, Clone)]
pub struct ExpectationChange {
    pub test_id: String,
    pub url: String,
    pub before: String,
    pub after: String,
}

/// Prints the selected definitions and their urls.
pub fn print_plan(plan: &RunPlan) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for test in plan.summary() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "{}", test.id);
        let _ = stdout.reset();
        for url in &test.urls {
            let _ = writeln!(stdout, "  {}", url);
        }
    }
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = writeln!(
        stdout,
        "{} test definitions, {} expectations (jobs: {}, retries: {})",
        plan.tests.len(),
        plan.expectation_count(),
        plan.options.jobs,
        plan.options.retries
    );
    let _ = stdout.reset();
}

/// Prints a colored line diff for every changed expectation.
pub fn print_changes(changes: &[ExpectationChange]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if changes.is_empty() {
        let _ = writeln!(stdout, "No expectations changed.");
        return;
    }
    for change in changes {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "--- {}: {} ---", change.test_id, change.url);
        let _ = stdout.reset();
        let changeset = Changeset::new(&change.before, &change.after, "\n");
        print_diff(&mut stdout, &changeset.diffs);
        let _ = stdout.reset();
        let _ = writeln!(stdout);
    }
}

/// Prints a SmokeError with full miette diagnostics.
pub fn print_error(error: SmokeError) {
    let report = miette::Report::new(error);
    eprintln!("{:?}", report);
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    let _ = writeln!(stdout, " {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "-{}", line);
                }
            }
        }
    }
}
