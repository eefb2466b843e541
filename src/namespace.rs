use std::fmt;
use thiserror::Error;

pub const MIN_NAMESPACE_LEN: usize = 3;
pub const MAX_NAMESPACE_LEN: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("Namespace must be at least 3 characters, got {0}")]
    TooShort(usize),

    #[error("Namespace must be at most 255 characters, got {0}")]
    TooLong(usize),

    #[error("Invalid character {0:?} in namespace")]
    InvalidCharacter(char),
}

// Doubles as the mapping table's name, so table naming rules apply.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self, NamespaceError> {
        let name = name.into();
        let len = name.chars().count();

        if len < MIN_NAMESPACE_LEN { return Err(NamespaceError::TooShort(len)); }
        if len > MAX_NAMESPACE_LEN { return Err(NamespaceError::TooLong(len)); }

        if let Some(c) = name.chars().find(|c| !is_table_char(*c)) {
            return Err(NamespaceError::InvalidCharacter(c));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_table_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

impl TryFrom<&str> for Namespace {
    type Error = NamespaceError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<String> for Namespace {
    type Error = NamespaceError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
