//! Test definitions, expectations, and the places a corpus can come from.
//!
//! A corpus is an ordered list of [`TestDefinition`]s. Each definition owns an
//! ordered list of [`Expectation`]s, and each expectation names the page it
//! applies to through `lhr.requestedUrl`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cloner::{deep_copy, Codec};
use crate::errors::{SmokeError, SmokeResult};
use crate::value::{Map, Value};

/// Dotted path of the url every expectation is keyed by.
pub const REQUESTED_URL_PATH: &str = "lhr.requestedUrl";

/// The corpus compiled into the binary, in sentinel-encoded JSON.
const EMBEDDED_CORPUS: &str = include_str!("../corpus/core-tests.json");

/// One assertion record: a map with at least `lhr.requestedUrl`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    value: Value,
}

impl Expectation {
    /// Creates an expectation holding only `lhr.requestedUrl`.
    pub fn new(requested_url: impl Into<String>) -> Self {
        let mut value = Value::Map(Map::new());
        value.set_path(REQUESTED_URL_PATH, Value::String(requested_url.into()));
        Self { value }
    }

    /// Wraps a map value. Fails when it is not a map.
    pub fn from_value(value: Value) -> SmokeResult<Self> {
        match value {
            Value::Map(_) => Ok(Self { value }),
            other => Err(SmokeError::malformed_corpus(format!(
                "expectation must be a map, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn requested_url(&self) -> Option<&str> {
        self.value.lookup(REQUESTED_URL_PATH).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    pub fn lookup(&self, path: &str) -> Option<&Value> {
        self.value.lookup(path)
    }

    pub fn lookup_mut(&mut self, path: &str) -> Option<&mut Value> {
        self.value.lookup_mut(path)
    }

    /// Sets a field at a dotted path, creating intermediate maps.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> bool {
        self.value.set_path(path, value.into())
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.value.remove_path(path)
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            value: deep_copy(&self.value),
        }
    }
}

/// One named end-to-end test case.
///
/// `extra` holds every field other than `id` and `expectations` (for example
/// `config` or `runSerially`) and is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDefinition {
    pub id: String,
    pub expectations: Vec<Expectation>,
    pub extra: Map,
}

impl TestDefinition {
    pub fn new(id: impl Into<String>, expectations: Vec<Expectation>) -> Self {
        Self {
            id: id.into(),
            expectations,
            extra: Map::new(),
        }
    }

    /// Builds a definition from a map value, checking its shape.
    pub fn from_value(value: Value) -> SmokeResult<Self> {
        let Value::Map(mut map) = value else {
            return Err(SmokeError::malformed_corpus("test definition must be a map"));
        };
        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            _ => {
                return Err(SmokeError::malformed_corpus(
                    "test definition needs a string 'id'",
                ))
            }
        };
        let expectations = match map.remove("expectations") {
            Some(Value::List(items)) => items
                .into_iter()
                .map(Expectation::from_value)
                .collect::<SmokeResult<Vec<_>>>()?,
            _ => {
                return Err(SmokeError::malformed_corpus(format!(
                    "test definition '{}' needs an 'expectations' list",
                    id
                )))
            }
        };
        let test = Self {
            id,
            expectations,
            extra: map,
        };
        test.check_requested_urls()?;
        Ok(test)
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            "expectations".to_string(),
            Value::List(
                self.expectations
                    .iter()
                    .map(|e| e.as_value().clone())
                    .collect(),
            ),
        );
        Value::Map(map)
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            id: self.id.as_str().to_owned(),
            expectations: self.expectations.iter().map(Expectation::deep_copy).collect(),
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.as_str().to_owned(), deep_copy(v)))
                .collect(),
        }
    }

    /// Fails on the first expectation without a string `lhr.requestedUrl`.
    pub fn check_requested_urls(&self) -> SmokeResult<()> {
        match self
            .expectations
            .iter()
            .position(|e| e.requested_url().is_none())
        {
            Some(index) => Err(SmokeError::MissingRequestedUrl {
                test_id: self.id.clone(),
                index,
            }),
            None => Ok(()),
        }
    }
}

/// Loads corpora from the embedded source, strings, files, and directories.
#[derive(Debug)]
pub struct Corpus;

impl Corpus {
    /// Decodes the embedded corpus. Each call returns a fresh tree.
    pub fn embedded() -> SmokeResult<Vec<TestDefinition>> {
        Self::from_json_str(EMBEDDED_CORPUS, &Codec::default())
    }

    pub fn from_json_str(text: &str, codec: &Codec) -> SmokeResult<Vec<TestDefinition>> {
        Self::from_value(codec.decode(text)?)
    }

    pub fn from_yaml_str(text: &str, codec: &Codec) -> SmokeResult<Vec<TestDefinition>> {
        Self::from_value(codec.decode_yaml(text)?)
    }

    /// Builds a corpus from a list value, rejecting duplicate ids.
    pub fn from_value(value: Value) -> SmokeResult<Vec<TestDefinition>> {
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(SmokeError::malformed_corpus(format!(
                    "corpus must be a list of test definitions, found {}",
                    other.type_name()
                )))
            }
        };
        let tests = items
            .into_iter()
            .map(TestDefinition::from_value)
            .collect::<SmokeResult<Vec<_>>>()?;
        check_unique_ids(&tests)?;
        Ok(tests)
    }

    pub fn to_value(tests: &[TestDefinition]) -> Value {
        Value::List(tests.iter().map(TestDefinition::to_value).collect())
    }

    /// Returns true if the path has a corpus file extension.
    fn is_corpus_file(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == "json" || ext == "yaml" || ext == "yml")
    }

    /// Loads a single file; the extension picks JSON or YAML.
    pub fn load_file<P: AsRef<Path>>(path: P, codec: &Codec) -> SmokeResult<Vec<TestDefinition>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SmokeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml {
            Self::from_yaml_str(&text, codec)
        } else {
            Self::from_json_str(&text, codec)
        }
    }

    /// Recursively finds corpus files under `root`, sorted for a stable order.
    pub fn discover_files<P: AsRef<Path>>(root: P) -> SmokeResult<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| SmokeError::Io {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || !Self::is_corpus_file(entry.path()) {
                continue;
            }
            files.push(entry.path().to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    /// Concatenates the definitions of every corpus file under `root`.
    pub fn discover<P: AsRef<Path>>(root: P, codec: &Codec) -> SmokeResult<Vec<TestDefinition>> {
        let mut tests = Vec::new();
        for file in Self::discover_files(root)? {
            tracing::debug!(file = %file.display(), "Loading corpus file");
            tests.extend(Self::load_file(&file, codec)?);
        }
        check_unique_ids(&tests)?;
        Ok(tests)
    }

    /// Loads a file or a directory of files.
    pub fn load<P: AsRef<Path>>(path: P, codec: &Codec) -> SmokeResult<Vec<TestDefinition>> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::discover(path, codec)
        } else {
            Self::load_file(path, codec)
        }
    }
}

fn check_unique_ids(tests: &[TestDefinition]) -> SmokeResult<()> {
    let mut seen = HashSet::new();
    for test in tests {
        if !seen.insert(test.id.as_str()) {
            return Err(SmokeError::DuplicateTestId {
                id: test.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn embedded_corpus_decodes() {
        let tests = Corpus::embedded().unwrap();
        assert!(tests.len() >= 5);
        assert_eq!(tests[0].id, "a11y");
        for test in &tests {
            assert!(!test.expectations.is_empty());
        }
    }

    #[test]
    fn embedded_corpus_contains_patterns() {
        let tests = Corpus::embedded().unwrap();
        let hung = tests
            .iter()
            .find(|t| t.id == "errors-infinite-loop")
            .unwrap();
        let message = hung.expectations[0]
            .lookup("lhr.runtimeError.message")
            .and_then(Value::as_pattern)
            .unwrap();
        assert_eq!(
            message,
            &Pattern::new("because the page stopped responding", "").unwrap()
        );
        assert_eq!(hung.extra.get("runSerially"), Some(&Value::Bool(true)));
    }

    #[test]
    fn embedded_corpus_is_fresh_each_call() {
        let mut first = Corpus::embedded().unwrap();
        first[0].expectations.clear();
        let second = Corpus::embedded().unwrap();
        assert!(!second[0].expectations.is_empty());
    }

    #[test]
    fn missing_requested_url_is_rejected() {
        let text = r#"[{"id": "x", "expectations": [{"lhr": {}}]}]"#;
        let err = Corpus::from_json_str(text, &Codec::default()).unwrap_err();
        assert!(matches!(
            err,
            SmokeError::MissingRequestedUrl { ref test_id, index: 0 } if test_id == "x"
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"[
            {"id": "x", "expectations": [{"lhr": {"requestedUrl": "http://a/"}}]},
            {"id": "x", "expectations": [{"lhr": {"requestedUrl": "http://b/"}}]}
        ]"#;
        let err = Corpus::from_json_str(text, &Codec::default()).unwrap_err();
        assert!(matches!(err, SmokeError::DuplicateTestId { .. }));
    }

    #[test]
    fn definition_round_trips_through_value() {
        let mut test = TestDefinition::new("t", vec![Expectation::new("http://a/")]);
        test.extra.insert("runSerially".to_string(), Value::Bool(true));
        let back = TestDefinition::from_value(test.to_value()).unwrap();
        assert_eq!(back, test);
    }

    #[test]
    fn yaml_corpus_loads() {
        let text = "- id: yaml\n  expectations:\n    - lhr:\n        requestedUrl: http://y/\n        finalUrl: \"__REGEXP /y/\"\n";
        let tests = Corpus::from_yaml_str(text, &Codec::default()).unwrap();
        assert_eq!(tests[0].expectations[0].requested_url(), Some("http://y/"));
        assert!(tests[0].expectations[0]
            .lookup("lhr.finalUrl")
            .and_then(Value::as_pattern)
            .is_some());
    }
}
