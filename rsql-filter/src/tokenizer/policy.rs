use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Only listed values are allowed
    Whitelist,
    /// Everything except listed values is allowed
    Blacklist,
}

/// Allow/deny predicate over token text. Immutable once built, so one
/// instance can back any number of parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    mode: PolicyMode,
    values: HashSet<String>,
}

impl Policy {
    pub fn new<I, S>(mode: PolicyMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn whitelist<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PolicyMode::Whitelist, values)
    }

    pub fn blacklist<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PolicyMode::Blacklist, values)
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn allow(&self, value: &str) -> bool {
        let listed = self.values.contains(value);
        match self.mode {
            PolicyMode::Whitelist => listed,
            PolicyMode::Blacklist => !listed,
        }
    }
}
