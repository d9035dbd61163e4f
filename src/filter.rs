//! Expectation filter and mutator.
//!
//! Walks a (cloned) corpus and applies, per expectation and in this order:
//! the url filter, the skip predicate, then the modify procedure. Definitions
//! left without expectations are dropped.

use crate::corpus::TestDefinition;
use crate::errors::{HookKind, SmokeError, SmokeResult};
use crate::options::Policies;
use crate::output::OutputSink;

/// Filters and mutates `tests`, preserving the order of everything kept.
///
/// Every skipped expectation produces one `skipping <url>: <reason>` line on
/// `output`. The first hook error aborts the whole run.
pub fn filter_definitions(
    tests: Vec<TestDefinition>,
    policies: &mut Policies<'_>,
    output: &mut dyn OutputSink,
) -> SmokeResult<Vec<TestDefinition>> {
    let total = tests.len();
    let mut kept = Vec::with_capacity(total);
    for test in tests {
        if let Some(test) = filter_definition(test, policies, output)? {
            kept.push(test);
        }
    }
    tracing::debug!(total, kept = kept.len(), "Filtered test definitions");
    Ok(kept)
}

/// Applies the policies to one definition; `None` when nothing survives.
pub fn filter_definition(
    mut test: TestDefinition,
    policies: &mut Policies<'_>,
    output: &mut dyn OutputSink,
) -> SmokeResult<Option<TestDefinition>> {
    let mut keep = vec![false; test.expectations.len()];

    for index in 0..test.expectations.len() {
        let url = test.expectations[index]
            .requested_url()
            .ok_or_else(|| SmokeError::MissingRequestedUrl {
                test_id: test.id.clone(),
                index,
            })?
            .to_string();

        if let Some(filter) = &policies.url_filter {
            if !filter.is_match(&url) {
                tracing::trace!(test = %test.id, %url, "Expectation excluded by url filter");
                continue;
            }
        }

        if let Some(skip) = policies.skip.as_mut() {
            let reason = skip(&test, &test.expectations[index]).map_err(|source| {
                SmokeError::Hook {
                    hook: HookKind::Skip,
                    test_id: test.id.clone(),
                    source,
                }
            })?;
            // An empty reason does not skip.
            if let Some(reason) = reason.filter(|r| !r.is_empty()) {
                output.emit(&format!("skipping {}: {}", url, reason));
                continue;
            }
        }

        if let Some(modify) = policies.modify.as_mut() {
            // The definition stays readable while the hook edits a copy.
            let mut expectation = test.expectations[index].clone();
            modify(&test, &mut expectation).map_err(|source| SmokeError::Hook {
                hook: HookKind::Modify,
                test_id: test.id.clone(),
                source,
            })?;
            test.expectations[index] = expectation;
        }

        keep[index] = true;
    }

    if !keep.contains(&true) {
        tracing::trace!(test = %test.id, "Dropping test definition with no expectations left");
        return Ok(None);
    }
    let mut flags = keep.into_iter();
    test.expectations.retain(|_| flags.next().unwrap_or(false));
    Ok(Some(test))
}
