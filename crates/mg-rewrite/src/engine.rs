use log::debug;
use regex::Regex;
use similar::TextDiff;

use crate::rule::{Action, Pattern, Placement, Replacement, Rule, RuleSet};
use crate::{Result, RewriteError};

/// What happened when a single rule ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Number of substitutions (or 1 for an insertion).
    Applied(usize),
    NoMatch,
    /// The guard rejected the current blob.
    Guarded,
    /// Insertion marker was already in the blob.
    AlreadyPresent,
}

impl RuleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RuleOutcome::Applied(_))
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    original: String,
    output: String,
    outcomes: Vec<(String, RuleOutcome)>,
}

impl TransformResult {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// Per-rule outcomes, in rule order.
    pub fn outcomes(&self) -> &[(String, RuleOutcome)] {
        &self.outcomes
    }

    pub fn rules_applied(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    pub fn rules_noop(&self) -> usize {
        self.outcomes.len() - self.rules_applied()
    }

    pub fn changed(&self) -> bool {
        self.original != self.output
    }

    /// Unified diff between the original and rewritten blob. Empty when
    /// nothing changed.
    pub fn diff(&self, label: &str) -> String {
        if !self.changed() {
            return String::new();
        }
        let diff = TextDiff::from_lines(self.original.as_str(), self.output.as_str());
        format!(
            "{}",
            diff.unified_diff()
                .context_radius(3)
                .header(&format!("old/{label}"), &format!("new/{label}"))
        )
    }
}

/// Apply every rule in `rules` to `blob`, in order.
///
/// Each rule sees the output of the previous one. The first fatal rule error
/// aborts the whole set; no partially rewritten blob is returned.
pub fn apply(blob: &str, rules: &RuleSet) -> Result<TransformResult> {
    let mut current = blob.to_string();
    let mut outcomes = Vec::with_capacity(rules.len());

    for rule in rules.rules() {
        let outcome = apply_rule(rule, &mut current)?;
        debug!("rule `{}`: {:?}", rule.name, outcome);
        outcomes.push((rule.name.clone(), outcome));
    }

    Ok(TransformResult {
        original: blob.to_string(),
        output: current,
        outcomes,
    })
}

fn apply_rule(rule: &Rule, blob: &mut String) -> Result<RuleOutcome> {
    if let Some(guard) = &rule.guard
        && !guard.allows(blob)
    {
        return Ok(RuleOutcome::Guarded);
    }

    match &rule.action {
        Action::Replace {
            pattern,
            replacement,
        } => substitute_rule(rule, blob, pattern, replacement),
        Action::Delete { pattern } => {
            substitute_rule(rule, blob, pattern, &Replacement::Text(String::new()))
        }
        Action::Insert {
            marker,
            anchor,
            placement,
            text,
        } => {
            if marker.is_match(blob) {
                return Ok(RuleOutcome::AlreadyPresent);
            }
            let (start, end) = anchor
                .find(blob)
                .ok_or_else(|| RewriteError::AnchorNotFound {
                    rule: rule.name.clone(),
                })?;
            let at = match placement {
                Placement::Before => start,
                Placement::After => end,
            };
            blob.insert_str(at, text);
            Ok(RuleOutcome::Applied(1))
        }
    }
}

fn substitute_rule(
    rule: &Rule,
    blob: &mut String,
    pattern: &Pattern,
    replacement: &Replacement,
) -> Result<RuleOutcome> {
    let (output, count) = substitute(blob, pattern, replacement, rule.limit);
    if count == 0 {
        if rule.require_match {
            return Err(RewriteError::RequiredMatchNotFound {
                rule: rule.name.clone(),
            });
        }
        return Ok(RuleOutcome::NoMatch);
    }
    *blob = output;
    Ok(RuleOutcome::Applied(count))
}

/// Replace non-overlapping matches left to right, up to `limit`.
fn substitute(
    haystack: &str,
    pattern: &Pattern,
    replacement: &Replacement,
    limit: Option<usize>,
) -> (String, usize) {
    let max = limit.unwrap_or(usize::MAX);
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    let mut count = 0;

    match pattern {
        Pattern::Literal(needle) if needle.is_empty() => {}
        Pattern::Literal(needle) => {
            for (start, matched) in haystack.match_indices(needle.as_str()).take(max) {
                out.push_str(&haystack[last..start]);
                render_literal(replacement, matched, &mut out);
                last = start + matched.len();
                count += 1;
            }
        }
        Pattern::Regex(re) => {
            count = substitute_regex(re, haystack, replacement, max, &mut out, &mut last);
        }
    }

    out.push_str(&haystack[last..]);
    (out, count)
}

fn substitute_regex(
    re: &Regex,
    haystack: &str,
    replacement: &Replacement,
    max: usize,
    out: &mut String,
    last: &mut usize,
) -> usize {
    let mut count = 0;
    for caps in re.captures_iter(haystack).take(max) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&haystack[*last..whole.start()]);
        match replacement {
            Replacement::Text(text) => out.push_str(text),
            Replacement::Template(template) => caps.expand(template, out),
            Replacement::Function(f) => out.push_str(&f(whole.as_str())),
        }
        *last = whole.end();
        count += 1;
    }
    count
}

fn render_literal(replacement: &Replacement, matched: &str, out: &mut String) {
    match replacement {
        Replacement::Text(text) => out.push_str(text),
        Replacement::Template(template) => expand_literal(template, matched, out),
        Replacement::Function(f) => out.push_str(&f(matched)),
    }
}

/// Single-pass template expansion for a match with no capture groups.
///
/// Follows `Captures::expand`: `$$` is a literal `$`, `$0` and `${0}` are the
/// whole match, any other group reference expands to nothing, and a `$` that
/// starts no reference (bare, or an unclosed `${`) is kept as is.
fn expand_literal(template: &str, matched: &str, out: &mut String) {
    let mut rest = template;
    while let Some(at) = rest.find('$') {
        out.push_str(&rest[..at]);
        rest = &rest[at + 1..];

        if let Some(after) = rest.strip_prefix('$') {
            out.push('$');
            rest = after;
            continue;
        }

        let reference = match rest.strip_prefix('{') {
            Some(braced) => braced
                .find('}')
                .map(|end| (&braced[..end], &braced[end + 1..])),
            None => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                (end > 0).then(|| (&rest[..end], &rest[end..]))
            }
        };
        let Some((name, after)) = reference else {
            out.push('$');
            continue;
        };
        if name.parse::<usize>() == Ok(0) {
            out.push_str(matched);
        }
        rest = after;
    }
    out.push_str(rest);
}
