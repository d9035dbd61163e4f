//! Declarative skip and modify rules.
//!
//! A [`RuleSet`] is the data form of the skip/modify hooks, so policies can
//! live in a config file instead of code. Selectors (`id`, `url`) that are
//! present must all match; a rule with no selectors matches everything.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cloner::Codec;
use crate::corpus::{Expectation, TestDefinition};
use crate::errors::{SmokeError, SmokeResult};
use crate::options::Policies;
use crate::pattern::Pattern;
use crate::value::Value;

/// Drops matching expectations with a fixed reason.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkipRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<Pattern>,
    pub reason: String,
}

impl SkipRule {
    pub fn for_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: None,
            reason: reason.into(),
        }
    }

    pub fn matches(&self, test: &TestDefinition, expectation: &Expectation) -> bool {
        selectors_match(self.id.as_deref(), self.url.as_ref(), test, expectation)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModifyRule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<Pattern>,
    #[serde(default)]
    set: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    remove: Vec<String>,
}

/// Rewrites matching expectations: `set` entries first, then `remove`.
///
/// Keys are dotted paths; values use the corpus text encoding, so a
/// `"__REGEXP /.../"` string becomes a pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawModifyRule")]
pub struct ModifyRule {
    pub id: Option<String>,
    pub url: Option<Pattern>,
    pub set: Vec<(String, Value)>,
    pub remove: Vec<String>,
}

impl TryFrom<RawModifyRule> for ModifyRule {
    type Error = SmokeError;

    fn try_from(raw: RawModifyRule) -> Result<Self, Self::Error> {
        let codec = Codec::default();
        let set = raw
            .set
            .into_iter()
            .map(|(path, json)| Ok((path, codec.from_json(json)?)))
            .collect::<SmokeResult<Vec<_>>>()?;
        Ok(Self {
            id: raw.id,
            url: raw.url,
            set,
            remove: raw.remove,
        })
    }
}

impl ModifyRule {
    pub fn matches(&self, test: &TestDefinition, expectation: &Expectation) -> bool {
        selectors_match(self.id.as_deref(), self.url.as_ref(), test, expectation)
    }

    /// Applies the edits. Fails when a `set` or `remove` path runs through a
    /// non-map; removing a path that does not exist is a no-op.
    pub fn apply(&self, expectation: &mut Expectation) -> SmokeResult<()> {
        for (path, value) in &self.set {
            if !expectation.set(path, value.clone()) {
                return Err(SmokeError::config(format!(
                    "cannot set '{}' on expectation for {}",
                    path,
                    expectation.requested_url().unwrap_or("<unknown url>")
                )));
            }
        }
        for path in &self.remove {
            let parent = match path.rsplit_once('.') {
                Some((parent, _)) => expectation.lookup(parent),
                None => Some(expectation.as_value()),
            };
            if parent.is_some_and(|node| node.as_map().is_none()) {
                return Err(SmokeError::config(format!(
                    "cannot remove '{}' from expectation for {}",
                    path,
                    expectation.requested_url().unwrap_or("<unknown url>")
                )));
            }
            expectation.remove(path);
        }
        Ok(())
    }
}

fn selectors_match(
    id: Option<&str>,
    url: Option<&Pattern>,
    test: &TestDefinition,
    expectation: &Expectation,
) -> bool {
    let id_ok = id.map_or(true, |id| id == test.id);
    let url_ok = url.map_or(true, |pattern| {
        expectation
            .requested_url()
            .is_some_and(|u| pattern.is_match(u))
    });
    id_ok && url_ok
}

/// All declarative rules of a config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub skip: Vec<SkipRule>,
    #[serde(default)]
    pub modify: Vec<ModifyRule>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.skip.is_empty() && self.modify.is_empty()
    }

    /// Reason of the first matching skip rule.
    pub fn skip_reason(&self, test: &TestDefinition, expectation: &Expectation) -> Option<String> {
        self.skip
            .iter()
            .find(|rule| rule.matches(test, expectation))
            .map(|rule| rule.reason.clone())
    }

    /// Applies every matching modify rule in order.
    pub fn modify(&self, test: &TestDefinition, expectation: &mut Expectation) -> SmokeResult<()> {
        for rule in &self.modify {
            if rule.matches(test, expectation) {
                rule.apply(expectation)?;
            }
        }
        Ok(())
    }

    /// Turns the rules into skip/modify hooks. Empty rule lists leave the
    /// corresponding hook unset.
    pub fn into_policies<'a>(self, url_filter: Option<Pattern>) -> Policies<'a> {
        let mut policies = Policies {
            url_filter,
            ..Policies::default()
        };
        if !self.skip.is_empty() {
            let rules = RuleSet {
                skip: self.skip,
                modify: Vec::new(),
            };
            policies = policies
                .with_skip(move |test, expectation| Ok(rules.skip_reason(test, expectation)));
        }
        if !self.modify.is_empty() {
            let rules = RuleSet {
                skip: Vec::new(),
                modify: self.modify,
            };
            policies = policies.with_modify(move |test, expectation| {
                rules.modify(test, expectation).map_err(Into::into)
            });
        }
        policies
    }
}
