// src/discovery/rules.rs

//! Pattern and ignore rules for the module walk.
//!
//! A rule is either a literal substring test or, when written as a
//! `/regex/flags` literal, a compiled regular expression tested against the
//! relative path. Supported flags are `i`, `m`, `s` and `x`, mapped to the
//! equivalent inline groups.

use std::fmt;

use regex::Regex;

use crate::errors::{ConveyorError, Result};

pub enum Rule {
    Substring(String),
    Pattern(Regex),
}

impl Rule {
    /// Parse one raw rule string. `/.../flags` compiles to a regex; anything
    /// else is a substring test. A malformed regex or unknown flag is a
    /// configuration error.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(stripped) = raw.strip_prefix('/') else {
            return Ok(Rule::Substring(raw.to_string()));
        };

        let Some(end) = stripped.rfind('/') else {
            return Ok(Rule::Substring(raw.to_string()));
        };
        let body = &stripped[..end];
        let flags = &stripped[end + 1..];

        if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x')) {
            return Err(ConveyorError::ConfigError(format!(
                "unsupported regex flags '{flags}' in rule {raw}"
            )));
        }

        let pattern = if flags.is_empty() {
            body.to_string()
        } else {
            format!("(?{flags}){body}")
        };

        let regex = Regex::new(&pattern).map_err(|e| {
            ConveyorError::ConfigError(format!("invalid regex in rule {raw}: {e}"))
        })?;
        Ok(Rule::Pattern(regex))
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            Rule::Substring(needle) => rel_path.contains(needle.as_str()),
            Rule::Pattern(regex) => regex.is_match(rel_path),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Substring(s) => write!(f, "Substring({s:?})"),
            Rule::Pattern(r) => write!(f, "Pattern(/{}/)", r.as_str()),
        }
    }
}

/// An ordered set of rules; a path matches the set if any rule matches.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn parse(raw: &[String]) -> Result<Self> {
        let rules = raw
            .iter()
            .map(|r| Rule::parse(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.rules.iter().any(|r| r.matches(rel_path))
    }
}
