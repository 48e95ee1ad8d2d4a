//! Namespaced identifiers.
//!
//! Native catalogue ids are bare decimal strings. Ids that belong to the
//! external movie/TV service carry a single-character prefix naming the
//! namespace they live in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace an [`Identifier`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdPrefix {
    /// Native series, group, episode and file ids.
    Native,
    /// External show seasons (and their episodes).
    TmdbShow,
    /// External movies.
    TmdbMovie,
    /// External movie collections.
    TmdbMovieCollection,
}

impl IdPrefix {
    /// The prefix character, if the namespace has one.
    pub fn as_char(self) -> Option<char> {
        match self {
            IdPrefix::Native => None,
            IdPrefix::TmdbShow => Some('a'),
            IdPrefix::TmdbMovie => Some('b'),
            IdPrefix::TmdbMovieCollection => Some('c'),
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(IdPrefix::TmdbShow),
            'b' => Some(IdPrefix::TmdbMovie),
            'c' => Some(IdPrefix::TmdbMovieCollection),
            _ => None,
        }
    }

    /// Whether ids in this namespace are resolved through the external service.
    pub fn is_external(self) -> bool {
        self != IdPrefix::Native
    }
}

/// A namespaced identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    prefix: IdPrefix,
    value: u32,
}

impl Identifier {
    /// Build an identifier from its parts.
    pub fn new(prefix: IdPrefix, value: u32) -> Self {
        Self { prefix, value }
    }

    pub fn native(value: u32) -> Self {
        Self::new(IdPrefix::Native, value)
    }

    pub fn tmdb_show(value: u32) -> Self {
        Self::new(IdPrefix::TmdbShow, value)
    }

    pub fn tmdb_movie(value: u32) -> Self {
        Self::new(IdPrefix::TmdbMovie, value)
    }

    pub fn tmdb_collection(value: u32) -> Self {
        Self::new(IdPrefix::TmdbMovieCollection, value)
    }

    /// Parse an identifier such as `"123"` or `"a456"`.
    ///
    /// The prefix is matched first; only the stripped remainder is read as
    /// a number.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let mut chars = input.chars();
        let first = chars.next()?;
        let (prefix, rest) = match IdPrefix::from_char(first) {
            Some(prefix) => (prefix, chars.as_str()),
            None => (IdPrefix::Native, input),
        };
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok().map(|value| Self::new(prefix, value))
    }

    pub fn prefix(&self) -> IdPrefix {
        self.prefix
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_native(&self) -> bool {
        self.prefix() == IdPrefix::Native
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix().as_char() {
            Some(c) => write!(f, "{}{}", c, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

impl std::str::FromStr for Identifier {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s).ok_or_else(|| crate::Error::other(format!("Invalid identifier: {}", s)))
    }
}

impl TryFrom<String> for Identifier {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}
