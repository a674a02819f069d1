//! Options for one resolution run.

use crate::resolve::{FirstEnd, Lexical, OwnerPolicy, Reject, SecondEnd};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid options: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Namespace separator must not be empty")]
    EmptySeparator,
    #[error("Default text length must be positive")]
    ZeroTextLength,
}

/// How a one-to-one relationship is placed when column names give no hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OneToOne {
    /// The end listed first owns the foreign key.
    FirstEnd,
    /// The end listed second owns the foreign key.
    SecondEnd,
    /// The table whose qualified name sorts first is the parent.
    #[default]
    Lexical,
    /// Leave the relationship out.
    Reject,
}

impl OneToOne {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first-end" | "first" => Some(Self::FirstEnd),
            "second-end" | "second" => Some(Self::SecondEnd),
            "lexical" => Some(Self::Lexical),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn policy(self) -> Box<dyn OwnerPolicy> {
        match self {
            Self::FirstEnd => Box::new(FirstEnd),
            Self::SecondEnd => Box::new(SecondEnd),
            Self::Lexical => Box::new(Lexical),
            Self::Reject => Box::new(Reject),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Options {
    /// Splits a qualified entity name into namespace and table, at the last
    /// occurrence.
    pub separator: String,
    /// Namespace given to entities whose name has no separator. When unset
    /// such entities are skipped.
    pub default_namespace: Option<String>,
    pub one_to_one: OneToOne,
    /// Length given to text-like columns declared without one.
    pub default_text_length: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            default_namespace: None,
            one_to_one: OneToOne::default(),
            default_text_length: 255,
        }
    }
}

impl Options {
    /// Parse options from JSON; absent keys keep their defaults.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let options: Options = serde_json::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        if self.default_text_length == 0 {
            return Err(ConfigError::ZeroTextLength);
        }
        Ok(())
    }

    /// Split a qualified name into `(namespace, table)`.
    pub fn split_name<'n>(&'n self, name: &'n str) -> Option<(&'n str, &'n str)> {
        match name.rsplit_once(self.separator.as_str()) {
            Some((namespace, table)) if !namespace.is_empty() && !table.is_empty() => {
                Some((namespace, table))
            }
            Some(_) => None,
            None => match &self.default_namespace {
                Some(namespace) if !name.is_empty() => Some((namespace.as_str(), name)),
                _ => None,
            },
        }
    }
}
