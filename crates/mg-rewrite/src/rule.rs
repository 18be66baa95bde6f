use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::{Result, RewriteError};

/// Regex compilation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// `^` and `$` match at line boundaries.
    pub multiline: bool,
    /// `.` also matches `\n`.
    pub dot_all: bool,
    pub case_insensitive: bool,
}

impl Flags {
    pub const NONE: Flags = Flags {
        multiline: false,
        dot_all: false,
        case_insensitive: false,
    };

    pub const DOT_ALL: Flags = Flags {
        multiline: false,
        dot_all: true,
        case_insensitive: false,
    };

    pub const CASE_INSENSITIVE: Flags = Flags {
        multiline: false,
        dot_all: false,
        case_insensitive: true,
    };
}

/// What a rule looks for in the blob.
#[derive(Clone)]
pub enum Pattern {
    /// Exact substring.
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Compile `pattern` with default flags.
    pub fn regex(pattern: &str) -> Result<Self> {
        Self::regex_with(pattern, Flags::NONE)
    }

    pub fn regex_with(pattern: &str, flags: Flags) -> Result<Self> {
        RegexBuilder::new(pattern)
            .multi_line(flags.multiline)
            .dot_matches_new_line(flags.dot_all)
            .case_insensitive(flags.case_insensitive)
            .build()
            .map(Pattern::Regex)
            .map_err(|source| RewriteError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            Pattern::Literal(needle) => !needle.is_empty() && haystack.contains(needle.as_str()),
            Pattern::Regex(re) => re.is_match(haystack),
        }
    }

    /// Byte range of the leftmost match.
    pub fn find(&self, haystack: &str) -> Option<(usize, usize)> {
        match self {
            Pattern::Literal(needle) if needle.is_empty() => None,
            Pattern::Literal(needle) => haystack
                .find(needle.as_str())
                .map(|start| (start, start + needle.len())),
            Pattern::Regex(re) => re.find(haystack).map(|m| (m.start(), m.end())),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Pattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "{s:?}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Text substituted for each match.
#[derive(Clone)]
pub enum Replacement {
    /// Inserted verbatim.
    Text(String),
    /// Expands `$1`, `${name}` and `$0` from the regex captures. Against a
    /// literal pattern there are no groups, so only `$0` expands.
    Template(String),
    /// Computes the replacement from the matched text.
    Function(fn(&str) -> String),
}

impl Replacement {
    pub fn template(template: impl Into<String>) -> Self {
        Replacement::Template(template.into())
    }
}

impl From<&str> for Replacement {
    fn from(text: &str) -> Self {
        Replacement::Text(text.to_string())
    }
}

impl From<String> for Replacement {
    fn from(text: String) -> Self {
        Replacement::Text(text)
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Replacement::Template(s) => f.debug_tuple("Template").field(s).finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Where an insertion lands relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Precondition evaluated against the current blob before a rule runs.
#[derive(Debug, Clone)]
pub enum Guard {
    /// Run only when the pattern does not occur.
    Absent(Pattern),
    /// Run only when the pattern occurs.
    Present(Pattern),
}

impl Guard {
    pub fn allows(&self, blob: &str) -> bool {
        match self {
            Guard::Absent(p) => !p.is_match(blob),
            Guard::Present(p) => p.is_match(blob),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Replace {
        pattern: Pattern,
        replacement: Replacement,
    },
    /// Remove every match of `pattern`.
    Delete { pattern: Pattern },
    /// Insert `text` next to the first `anchor` match, unless `marker` is
    /// already present.
    Insert {
        marker: Pattern,
        anchor: Pattern,
        placement: Placement,
        text: String,
    },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub action: Action,
    pub guard: Option<Guard>,
    /// Zero substitutions is an error rather than a no-op.
    pub require_match: bool,
    /// Stop after this many substitutions.
    pub limit: Option<usize>,
}

impl Rule {
    fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
            guard: None,
            require_match: false,
            limit: None,
        }
    }

    pub fn replace(
        name: impl Into<String>,
        pattern: Pattern,
        replacement: impl Into<Replacement>,
    ) -> Self {
        Self::new(
            name,
            Action::Replace {
                pattern,
                replacement: replacement.into(),
            },
        )
    }

    pub fn delete(name: impl Into<String>, pattern: Pattern) -> Self {
        Self::new(name, Action::Delete { pattern })
    }

    pub fn insert(
        name: impl Into<String>,
        marker: Pattern,
        anchor: Pattern,
        placement: Placement,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Action::Insert {
                marker,
                anchor,
                placement,
                text: text.into(),
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.require_match = true;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn when_absent(mut self, pattern: Pattern) -> Self {
        self.guard = Some(Guard::Absent(pattern));
        self
    }

    pub fn when_present(mut self, pattern: Pattern) -> Self {
        self.guard = Some(Guard::Present(pattern));
        self
    }
}

/// Rules in application order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, blob: &str) -> Result<crate::TransformResult> {
        crate::apply(blob, self)
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
