use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Buckets selected by an include mask string: `D` drafts, `F` published
/// and featured, `P` published and not featured. Letters are matched
/// case-insensitively anywhere in the string; an empty string selects all
/// three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeMask {
    pub drafts: bool,
    pub featured: bool,
    pub published: bool,
}

impl IncludeMask {
    pub const ALL: IncludeMask = IncludeMask {
        drafts: true,
        featured: true,
        published: true,
    };

    pub const PUBLIC: IncludeMask = IncludeMask {
        drafts: false,
        featured: true,
        published: true,
    };

    pub fn parse(mask: &str) -> Self {
        if mask.is_empty() {
            return Self::ALL;
        }
        let mask = mask.to_uppercase();
        Self {
            drafts: mask.contains('D'),
            featured: mask.contains('F'),
            published: mask.contains('P'),
        }
    }
}

impl Default for IncludeMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for IncludeMask {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for IncludeMask {
    fn from(mask: &str) -> Self {
        Self::parse(mask)
    }
}

/// Criteria shared by listing and search.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub author_id: Option<i64>,
    /// Only honoured by listing; search ignores it.
    pub category: Option<String>,
    pub include: IncludeMask,
    /// Mask author emails in the returned summaries.
    pub sanitize: bool,
}

impl ListFilter {
    /// Published posts of every author with emails masked.
    pub fn public() -> Self {
        Self {
            include: IncludeMask::PUBLIC,
            sanitize: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishedStatus {
    Published,
    Drafts,
    Featured,
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_includes_everything() {
        assert_eq!(IncludeMask::parse(""), IncludeMask::ALL);
    }

    #[test]
    fn mask_letters_are_case_insensitive() {
        let mask: IncludeMask = "pf".parse().unwrap();
        assert_eq!(mask, IncludeMask::PUBLIC);
    }

    #[test]
    fn single_bucket() {
        let mask = IncludeMask::from("D");
        assert!(mask.drafts);
        assert!(!mask.featured);
        assert!(!mask.published);
    }

    #[test]
    fn unknown_letters_select_nothing() {
        let mask = IncludeMask::parse("x");
        assert!(!mask.drafts && !mask.featured && !mask.published);
    }
}
