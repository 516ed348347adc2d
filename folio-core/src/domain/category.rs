//! Category
//!
//! The portfolio groups photos into a fixed set of categories. A category is
//! the partition key for ordering: positions are only compared within one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entity::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    People,
    Building,
    Nature,
}

impl Category {
    /// Every category, in gallery display order
    pub const ALL: [Category; 3] = [Category::People, Category::Building, Category::Nature];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Building => "building",
            Category::Nature => "nature",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "people" => Ok(Category::People),
            "building" => Ok(Category::Building),
            "nature" => Ok(Category::Nature),
            other => Err(DomainError::InvalidInput(format!("unknown category '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse_is_lenient_about_case() {
        assert_eq!(" Nature ".parse::<Category>().unwrap(), Category::Nature);
    }

    #[test]
    fn test_unknown_category_is_invalid_input() {
        let err = "landscape".parse::<Category>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Building).unwrap(), "\"building\"");
    }
}
