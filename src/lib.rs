pub use crate::engine::{
    prepare_run, smokehouse, smokehouse_with_corpus, DryRunEngine, ExecutionEngine, RunPlan,
};
pub use crate::errors::{HookError, SmokeError, SmokeResult};
pub use crate::options::{Policies, RunOptions, SmokehouseOptions};

pub mod cli;
pub mod cloner;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod options;
pub mod output;
pub mod pattern;
pub mod rules;
pub mod value;

pub use crate::corpus::{Corpus, Expectation, TestDefinition};
pub use crate::pattern::Pattern;
pub use crate::value::Value;
