//! The smokehouse pipeline and its handoff to an execution engine.
//!
//! ```text
//! corpus -> deep copy -> url filter / skip / modify -> ExecutionEngine::run
//! ```
//!
//! Everything up to the handoff is synchronous. The engine decides what
//! running a test means and what it returns; this crate passes that result
//! back untouched.

use std::future::Future;

use serde::Serialize;

use crate::cloner::clone_corpus;
use crate::corpus::{Corpus, TestDefinition};
use crate::errors::SmokeResult;
use crate::filter::filter_definitions;
use crate::options::{RunOptions, SmokehouseOptions};

/// Consumer of the filtered corpus.
pub trait ExecutionEngine {
    type Output;

    fn run(
        &self,
        tests: Vec<TestDefinition>,
        options: RunOptions,
    ) -> impl Future<Output = Self::Output>;
}

/// Runs the embedded corpus through the pipeline and hands it to `engine`.
///
/// The corpus is decoded fresh for every call.
pub async fn smokehouse<E: ExecutionEngine>(
    engine: &E,
    options: SmokehouseOptions<'_>,
) -> SmokeResult<E::Output> {
    let corpus = Corpus::embedded()?;
    smokehouse_with_corpus(&corpus, engine, options).await
}

/// Same as [`smokehouse`] over a caller-provided corpus, which is never
/// modified.
pub async fn smokehouse_with_corpus<E: ExecutionEngine>(
    corpus: &[TestDefinition],
    engine: &E,
    options: SmokehouseOptions<'_>,
) -> SmokeResult<E::Output> {
    let (tests, run) = prepare_run(corpus, options)?;
    tracing::info!(
        tests = tests.len(),
        jobs = run.jobs,
        "Handing filtered corpus to execution engine"
    );
    Ok(engine.run(tests, run).await)
}

/// The synchronous part of the pipeline: clone, then filter and mutate.
///
/// Returns the tests for the engine and the options it should receive.
pub fn prepare_run(
    corpus: &[TestDefinition],
    options: SmokehouseOptions<'_>,
) -> SmokeResult<(Vec<TestDefinition>, RunOptions)> {
    let (mut policies, run, mut output) = options.into_parts();
    let cloned = clone_corpus(corpus);
    tracing::debug!(
        tests = cloned.len(),
        url_filter = ?policies.url_filter.as_ref().map(ToString::to_string),
        "Cloned corpus"
    );
    let tests = filter_definitions(cloned, &mut policies, output.as_mut())?;
    Ok((tests, run))
}

/// What an engine would have been asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub tests: Vec<TestDefinition>,
    pub options: RunOptions,
}

/// Serializable one-line-per-expectation summary of a [`RunPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTest {
    pub id: String,
    pub urls: Vec<String>,
}

impl RunPlan {
    pub fn expectation_count(&self) -> usize {
        self.tests.iter().map(|t| t.expectations.len()).sum()
    }

    pub fn summary(&self) -> Vec<PlannedTest> {
        self.tests
            .iter()
            .map(|t| PlannedTest {
                id: t.id.clone(),
                urls: t
                    .expectations
                    .iter()
                    .filter_map(|e| e.requested_url().map(str::to_string))
                    .collect(),
            })
            .collect()
    }
}

/// Engine that runs nothing and returns the plan it was given.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunEngine;

impl ExecutionEngine for DryRunEngine {
    type Output = RunPlan;

    fn run(
        &self,
        tests: Vec<TestDefinition>,
        options: RunOptions,
    ) -> impl Future<Output = Self::Output> {
        std::future::ready(RunPlan { tests, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Expectation;
    use crate::output::OutputBuffer;

    #[test]
    fn prepare_run_leaves_input_untouched() {
        let corpus = vec![TestDefinition::new("t", vec![Expectation::new("http://a/")])];
        let options = SmokehouseOptions::new()
            .modify(|_, e| {
                e.set("lhr.extra", true);
                Ok(())
            })
            .output(OutputBuffer::new());
        let (tests, run) = prepare_run(&corpus, options).unwrap();
        assert!(tests[0].expectations[0].lookup("lhr.extra").is_some());
        assert!(corpus[0].expectations[0].lookup("lhr.extra").is_none());
        assert_eq!(run, RunOptions::default());
    }

    #[tokio::test]
    async fn dry_run_returns_plan() {
        let options = SmokehouseOptions::new().output(OutputBuffer::new());
        let plan = smokehouse(&DryRunEngine, options).await.unwrap();
        let embedded = Corpus::embedded().unwrap();
        assert_eq!(plan.tests, embedded);
        assert_eq!(
            plan.expectation_count(),
            embedded.iter().map(|t| t.expectations.len()).sum::<usize>()
        );
        assert_eq!(plan.summary()[0].id, "a11y");
    }
}
