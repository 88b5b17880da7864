use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("unknown category: {0}, please provide one of (A, B, C, D)")]
    InvalidCategory(String),
    #[error("cannot set category {0} when there is no match")]
    InvalidState(Category),
    #[error("categories mismatch: [{left}] vs [{right}]")]
    CategoryConflict { left: Category, right: Category },
    #[error("unsupported key '{key}' at {location}")]
    UnsupportedMatcherKey { key: String, location: String },
    #[error("missing category for cost rule at {location}")]
    MissingCategory { location: String },
    #[error("malformed rules configuration: {0}")]
    MalformedRules(String),
}

/// Cost category of a qualifying cost record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Category {
    A,
    B,
    C,
    D,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::A, Category::B, Category::C, Category::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
            Category::D => "D",
        }
    }
}

impl FromStr for Category {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Category::A),
            "B" => Ok(Category::B),
            "C" => Ok(Category::C),
            "D" => Ok(Category::D),
            other => Err(ClassificationError::InvalidCategory(other.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a condition against a record.
///
/// The default value is the identity result: no match, no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClassificationResult {
    matches: bool,
    category: Option<Category>,
}

impl ClassificationResult {
    /// Build a result, rejecting a category on a non-matching result.
    pub fn new(matches: bool, category: Option<Category>) -> Result<Self, ClassificationError> {
        match category {
            Some(category) if !matches => Err(ClassificationError::InvalidState(category)),
            _ => Ok(ClassificationResult { matches, category }),
        }
    }

    /// A positive result carrying an optional category
    pub fn matched(category: Option<Category>) -> Self {
        ClassificationResult {
            matches: true,
            category,
        }
    }

    pub fn matches(&self) -> bool {
        self.matches
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Matches if either side matches.
    ///
    /// Categories are merged before the match is decided, so a conflict
    /// surfaces even if only one side matches.
    pub fn or(self, other: Self) -> Result<Self, ClassificationError> {
        let category = merge_category(self.category, other.category)?;
        if self.matches || other.matches {
            Ok(Self::matched(category))
        } else {
            Ok(Self::default())
        }
    }

    /// Matches only if both sides match. Categories merge as in [`Self::or`].
    pub fn and(self, other: Self) -> Result<Self, ClassificationError> {
        let category = merge_category(self.category, other.category)?;
        if self.matches && other.matches {
            Ok(Self::matched(category))
        } else {
            Ok(Self::default())
        }
    }
}

pub fn merge_category(
    left: Option<Category>,
    right: Option<Category>,
) -> Result<Option<Category>, ClassificationError> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(ClassificationError::CategoryConflict { left: l, right: r }),
        (Some(l), _) => Ok(Some(l)),
        (None, r) => Ok(r),
    }
}
