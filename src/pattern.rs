//! Pattern values: "match any string satisfying this pattern".
//!
//! A [`Pattern`] keeps the body and flags exactly as written in the corpus
//! and a compiled [`Regex`] for matching. Two patterns are equal when body and
//! flags are equal; the compiled program never takes part in comparisons.

use std::fmt;
use std::hash::{Hash, Hasher};

use fancy_regex::Regex;

use crate::errors::{SmokeError, SmokeResult};

/// Flags accepted in the `/body/flags` form.
pub const SUPPORTED_FLAGS: &str = "gimsuy";

#[derive(Debug, Clone)]
pub struct Pattern {
    body: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    /// Builds a pattern from a body and a flag string such as `"i"`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use smokehouse::pattern::Pattern;
    /// let p = Pattern::new("a\\.com", "i").unwrap();
    /// assert!(p.is_match("https://A.com/"));
    /// assert_eq!(p.to_string(), "/a\\.com/i");
    /// ```
    pub fn new(body: impl Into<String>, flags: impl Into<String>) -> SmokeResult<Self> {
        let body = body.into();
        let flags = flags.into();
        let mut seen = String::new();
        let mut inline = String::new();
        for flag in flags.chars() {
            if !SUPPORTED_FLAGS.contains(flag) || seen.contains(flag) {
                return Err(SmokeError::InvalidFlags {
                    flags: flags.clone(),
                    flag,
                });
            }
            seen.push(flag);
            // g, u and y do not change whether a string matches at all.
            if matches!(flag, 'i' | 'm' | 's') {
                inline.push(flag);
            }
        }
        let source = if inline.is_empty() {
            body.clone()
        } else {
            format!("(?{}){}", inline, body)
        };
        let regex = Regex::new(&source).map_err(|e| SmokeError::InvalidPattern {
            pattern: format!("/{}/{}", body, flags),
            reason: e.to_string(),
        })?;
        Ok(Self { body, flags, regex })
    }

    /// Parses the canonical `/body/flags` text form.
    ///
    /// The body runs from the first `/` to the last `/`; whatever follows the
    /// last `/` is the flag string. Returns `Ok(None)` when the text does not
    /// have that shape at all, and an error when it does but the body or flags
    /// are rejected.
    pub fn parse_literal(text: &str) -> SmokeResult<Option<Self>> {
        match split_literal(text) {
            Some((body, flags)) => Self::new(body, flags).map(Some),
            None => Ok(None),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// True when `text` contains a match anywhere.
    ///
    /// A match that exceeds the backtracking limit counts as no match.
    pub fn is_match(&self, text: &str) -> bool {
        match self.regex.is_match(text) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(pattern = %self, error = %e, "Pattern match gave up");
                false
            }
        }
    }

    /// Recompiles this pattern from its body and flags.
    pub fn rebuild(&self) -> Self {
        // Body and flags were accepted once already.
        Self::new(self.body.as_str(), self.flags.as_str()).unwrap_or_else(|_| self.clone())
    }
}

/// Splits `/body/flags` into its parts. The body runs from the first slash to
/// the last one, so it may itself contain unescaped slashes.
fn split_literal(text: &str) -> Option<(&str, &str)> {
    let open = text.find('/')?;
    let rest = &text[open + 1..];
    let close = rest.rfind('/')?;
    Some((&rest[..close], &rest[close + 1..]))
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body && self.flags == other.flags
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.body.hash(state);
        self.flags.hash(state);
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.body, self.flags)
    }
}

impl std::str::FromStr for Pattern {
    type Err = SmokeError;

    /// Accepts `/body/flags`, or a bare body with no flags.
    ///
    /// Text such as `/redirects/final`, whose tail after the last slash holds
    /// letters that are not flags, is a bare body. A repeated flag is still
    /// an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('/') {
            match Self::parse_literal(s) {
                Ok(Some(pattern)) => return Ok(pattern),
                Err(SmokeError::InvalidFlags { flags, .. })
                    if flags.chars().any(|f| !SUPPORTED_FLAGS.contains(f)) => {}
                Err(e) => return Err(e),
                Ok(None) => {}
            }
        }
        Self::new(s, "")
    }
}

impl serde::Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_flag_applies() {
        let p = Pattern::new("abc", "i").unwrap();
        assert!(p.is_match("xxABCxx"));
        assert!(!Pattern::new("abc", "").unwrap().is_match("ABC"));
    }

    #[test]
    fn unknown_and_repeated_flags_are_rejected() {
        assert!(matches!(
            Pattern::new("a", "x"),
            Err(SmokeError::InvalidFlags { flag: 'x', .. })
        ));
        assert!(matches!(
            Pattern::new("a", "ii"),
            Err(SmokeError::InvalidFlags { flag: 'i', .. })
        ));
        assert!(Pattern::new("a", "gimsuy").is_ok());
    }

    #[test]
    fn invalid_body_is_an_error() {
        let err = Pattern::new("(unclosed", "").unwrap_err();
        assert!(matches!(err, SmokeError::InvalidPattern { .. }));
    }

    #[test]
    fn literal_body_runs_to_last_slash() {
        let p = Pattern::parse_literal("/https://a.com/x/i").unwrap().unwrap();
        assert_eq!(p.body(), "https://a.com/x");
        assert_eq!(p.flags(), "i");

        let p = Pattern::parse_literal("/a/b/").unwrap().unwrap();
        assert_eq!(p.body(), "a/b");
        assert_eq!(p.flags(), "");
    }

    #[test]
    fn literal_without_shape_is_none() {
        assert!(Pattern::parse_literal("no slashes").unwrap().is_none());
        assert!(Pattern::parse_literal("/only-one").unwrap().is_none());
    }

    #[test]
    fn equality_ignores_compiled_program() {
        let a = Pattern::new("abc", "i").unwrap();
        let b = a.rebuild();
        assert_eq!(a, b);
        assert_ne!(a, Pattern::new("abc", "").unwrap());
    }

    #[test]
    fn from_str_accepts_bare_body() {
        let p: Pattern = "a\\.com".parse().unwrap();
        assert_eq!(p.flags(), "");
        let p: Pattern = "/a\\.com/i".parse().unwrap();
        assert_eq!(p.flags(), "i");
    }

    #[test]
    fn from_str_reads_slashed_path_as_bare_body() {
        let p: Pattern = "/redirects/final".parse().unwrap();
        assert_eq!(p.body(), "/redirects/final");
        assert_eq!(p.flags(), "");
        assert!(p.is_match("http://localhost/redirects/final.html"));
        assert!("/a/ii".parse::<Pattern>().is_err());
    }

    #[test]
    fn look_around_and_backreferences_compile() {
        let p = Pattern::new("^(?!.*\\.map$).*\\.js", "").unwrap();
        assert!(p.is_match("bundle.js"));
        assert!(!p.is_match("bundle.js.map"));

        let p = Pattern::new("(a)\\1", "").unwrap();
        assert!(p.is_match("xaax"));
        assert!(!p.is_match("xabx"));

        let p = Pattern::new("(?<=id=)\\d+", "").unwrap();
        assert!(p.is_match("?id=42"));
        assert!(!p.is_match("?id=x"));
    }

    #[test]
    fn multi_line_and_dot_all_flags_apply() {
        assert!(Pattern::new("^b", "m").unwrap().is_match("a\nb"));
        assert!(!Pattern::new("^b", "").unwrap().is_match("a\nb"));
        assert!(Pattern::new("a.b", "s").unwrap().is_match("a\nb"));
    }
}
