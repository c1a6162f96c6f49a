//! Name-based inclusion rules.

use regex::{Regex, RegexBuilder};
use std::fmt;
use tracing::debug;

/// Predicate over a fully-qualified object name.
#[derive(Clone)]
pub enum InclusionRule {
    IncludeAll,
    ExcludeAll,
    /// Case-insensitive `.*<pattern>.*` full match.
    Pattern(Regex),
    /// Every contained rule must accept the name.
    Intersection(Vec<InclusionRule>),
}

impl InclusionRule {
    /// Build a rule from free-form text supplied by a caller.
    ///
    /// Blank text matches everything. Text that is not a valid regular
    /// expression is matched literally.
    pub fn matching(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Self::IncludeAll;
        }

        match Self::compile(pattern) {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => {
                debug!("Pattern '{}' is not a valid regex ({}), matching literally", pattern, e);
                match Self::compile(&regex::escape(pattern)) {
                    Ok(regex) => Self::Pattern(regex),
                    // An escaped literal can only fail on size limits.
                    Err(_) => Self::ExcludeAll,
                }
            }
        }
    }

    /// Rule accepting full names whose schema part matches `pattern` exactly.
    ///
    /// Objects without a schema are rejected unless the pattern is blank.
    pub fn schema(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Self::IncludeAll;
        }

        let build = |p: &str| {
            RegexBuilder::new(&format!("^(?:{})\\..+$", p))
                .case_insensitive(true)
                .build()
        };
        match build(pattern).or_else(|_| build(&regex::escape(pattern))) {
            Ok(regex) => Self::Pattern(regex),
            Err(_) => Self::ExcludeAll,
        }
    }

    fn compile(pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&format!("^(?:.*(?:{}).*)$", pattern))
            .case_insensitive(true)
            .build()
    }

    pub fn test(&self, name: &str) -> bool {
        match self {
            Self::IncludeAll => true,
            Self::ExcludeAll => false,
            Self::Pattern(regex) => regex.is_match(name),
            Self::Intersection(rules) => rules.iter().all(|rule| rule.test(name)),
        }
    }

    /// Combine two rules so that a name must satisfy both.
    pub fn intersect(self, other: InclusionRule) -> Self {
        match (self, other) {
            (Self::IncludeAll, rule) | (rule, Self::IncludeAll) => rule,
            (Self::ExcludeAll, _) | (_, Self::ExcludeAll) => Self::ExcludeAll,
            (Self::Intersection(mut left), Self::Intersection(right)) => {
                left.extend(right);
                Self::Intersection(left)
            }
            (Self::Intersection(mut rules), rule) | (rule, Self::Intersection(mut rules)) => {
                rules.push(rule);
                Self::Intersection(rules)
            }
            (left, right) => Self::Intersection(vec![left, right]),
        }
    }

    pub fn is_include_all(&self) -> bool {
        matches!(self, Self::IncludeAll)
    }
}

impl Default for InclusionRule {
    fn default() -> Self {
        Self::IncludeAll
    }
}

impl fmt::Debug for InclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncludeAll => f.write_str("IncludeAll"),
            Self::ExcludeAll => f.write_str("ExcludeAll"),
            Self::Pattern(regex) => write!(f, "Pattern({})", regex.as_str()),
            Self::Intersection(rules) => f.debug_list().entries(rules).finish(),
        }
    }
}
