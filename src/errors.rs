//! Smokehouse error handling.
//!
//! Every failure the pipeline can produce is a variant of [`SmokeError`].
//! Variants carry a stable `miette` diagnostic code so the CLI can render
//! them with help text, and library callers can match on them directly.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error type returned by caller-supplied skip and modify hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Which caller-supplied hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Skip,
    Modify,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Skip => "skip",
            HookKind::Modify => "modify",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for all smokehouse failure modes.
#[derive(Debug, Error, Diagnostic)]
pub enum SmokeError {
    #[error("Codec error: failed to serialize corpus value")]
    #[diagnostic(code(smokehouse::codec::serialize))]
    Serialize(#[source] serde_json::Error),

    #[error("Codec error: failed to parse corpus text")]
    #[diagnostic(code(smokehouse::codec::deserialize))]
    Deserialize(#[source] serde_json::Error),

    #[error("Codec error: failed to parse YAML corpus text")]
    #[diagnostic(code(smokehouse::codec::yaml))]
    Yaml(#[source] serde_yaml::Error),

    #[error("Pattern error: '{pattern}' is not a valid pattern: {reason}")]
    #[diagnostic(
        code(smokehouse::pattern::invalid),
        help("pattern bodies follow JavaScript RegExp syntax, including look-around and backreferences")
    )]
    InvalidPattern { pattern: String, reason: String },

    #[error("Pattern error: flag '{flag}' in '{flags}' is unknown or repeated")]
    #[diagnostic(
        code(smokehouse::pattern::flags),
        help("supported flags are g, i, m, s, u and y, each at most once")
    )]
    InvalidFlags { flags: String, flag: char },

    #[error("Pattern error: malformed pattern encoding '{text}'")]
    #[diagnostic(
        code(smokehouse::pattern::malformed),
        help("encoded patterns look like `__REGEXP /body/flags`")
    )]
    MalformedPattern { text: String },

    #[error("Corpus error: {message}")]
    #[diagnostic(code(smokehouse::corpus::malformed))]
    MalformedCorpus { message: String },

    #[error("Corpus error: duplicate test definition id '{id}'")]
    #[diagnostic(code(smokehouse::corpus::duplicate_id))]
    DuplicateTestId { id: String },

    #[error("Corpus error: expectation #{index} of '{test_id}' has no string lhr.requestedUrl")]
    #[diagnostic(code(smokehouse::corpus::requested_url))]
    MissingRequestedUrl { test_id: String, index: usize },

    #[error("Hook error: {hook} hook failed for '{test_id}'")]
    #[diagnostic(code(smokehouse::hook::failed))]
    Hook {
        hook: HookKind,
        test_id: String,
        #[source]
        source: HookError,
    },

    #[error("IO error: cannot read '{}'", path.display())]
    #[diagnostic(code(smokehouse::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {message}")]
    #[diagnostic(code(smokehouse::config))]
    Config { message: String },
}

impl SmokeError {
    pub fn malformed_corpus(message: impl Into<String>) -> Self {
        SmokeError::MalformedCorpus {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SmokeError::Config {
            message: message.into(),
        }
    }

    /// Returns the caller's original error when this is a hook failure.
    pub fn hook_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            SmokeError::Hook { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
