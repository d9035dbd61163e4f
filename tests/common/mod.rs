//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;

use smokehouse::{ExecutionEngine, Expectation, RunOptions, TestDefinition};

/// A definition with one expectation per url.
pub fn definition(id: &str, urls: &[&str]) -> TestDefinition {
    TestDefinition::new(id, urls.iter().map(|u| Expectation::new(*u)).collect())
}

/// Three single-url definitions, in order: first, second, third.
pub fn three_definitions() -> Vec<TestDefinition> {
    vec![
        definition("first", &["http://a.com/1"]),
        definition("second", &["http://b.com/2"]),
        definition("third", &["http://a.com/3"]),
    ]
}

/// Engine that remembers every batch it was handed and returns its size.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub calls: RefCell<Vec<(Vec<TestDefinition>, RunOptions)>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_ids(&self) -> Vec<String> {
        self.calls
            .borrow()
            .last()
            .map(|(tests, _)| tests.iter().map(|t| t.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl ExecutionEngine for RecordingEngine {
    type Output = usize;

    fn run(
        &self,
        tests: Vec<TestDefinition>,
        options: RunOptions,
    ) -> impl Future<Output = Self::Output> {
        let count = tests.len();
        self.calls.borrow_mut().push((tests, options));
        async move { count }
    }
}

pub const CORPUS_YAML: &str = r#"
- id: yaml-first
  expectations:
    - lhr:
        requestedUrl: http://localhost/one.html
        runWarnings:
          - "__REGEXP /slow/i"
- id: yaml-second
  expectations:
    - lhr:
        requestedUrl: http://localhost/two.html
"#;
