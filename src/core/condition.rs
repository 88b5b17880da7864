use super::classification::{Category, ClassificationError, ClassificationResult};
use super::record::BookkeepingRecord;

/// Record field a [`PropertyMatcher`] reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    CompanyName,
}

impl Field {
    pub fn extract(self, record: &BookkeepingRecord) -> &str {
        match self {
            Field::Description => &record.description,
            Field::CompanyName => &record.company_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    StartsWith(String),
    Contains(String),
    Equals(String),
}

impl Predicate {
    fn holds(&self, value: &str) -> bool {
        match self {
            Predicate::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            Predicate::Contains(part) => value.contains(part.as_str()),
            Predicate::Equals(expected) => value == expected,
        }
    }
}

/// String predicates applied to one field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMatcher {
    field: Field,
    predicates: Vec<Predicate>,
}

impl PropertyMatcher {
    pub fn new(field: Field, predicates: Vec<Predicate>) -> Self {
        PropertyMatcher { field, predicates }
    }

    /// Never matches without predicates
    pub fn matches(&self, record: &BookkeepingRecord) -> bool {
        let value = self.field.extract(record);
        !self.predicates.is_empty() && self.predicates.iter().all(|p| p.holds(value))
    }
}

/// Leaf condition built from a configured rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurableCondition {
    category: Option<Category>,
    matchers: Vec<PropertyMatcher>,
}

impl ConfigurableCondition {
    pub fn new(category: Option<Category>, matchers: Vec<PropertyMatcher>) -> Self {
        ConfigurableCondition { category, matchers }
    }

    fn evaluate(
        &self,
        record: &BookkeepingRecord,
    ) -> Result<ClassificationResult, ClassificationError> {
        let matches = self.matchers.iter().all(|m| m.matches(record));
        // income records never carry a category
        let category = self.category.filter(|_| matches && record.is_cost());
        ClassificationResult::new(matches, category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    AnyOf(Vec<Condition>),
    // not reachable from rule configuration
    #[allow(dead_code)]
    AllOf(Vec<Condition>),
    Configurable(ConfigurableCondition),
    RecordTypeSplit {
        income: Box<Condition>,
        cost: Box<Condition>,
    },
}

impl Condition {
    pub fn evaluate(
        &self,
        record: &BookkeepingRecord,
    ) -> Result<ClassificationResult, ClassificationError> {
        match self {
            Condition::AnyOf(children) => children
                .iter()
                .try_fold(ClassificationResult::default(), |acc, child| {
                    acc.or(child.evaluate(record)?)
                }),
            Condition::AllOf(children) => {
                let mut result: Option<ClassificationResult> = None;
                for child in children {
                    let current = child.evaluate(record)?;
                    if !current.matches() {
                        return Ok(ClassificationResult::default());
                    }
                    result = Some(match result {
                        Some(acc) => acc.and(current)?,
                        None => current,
                    });
                }
                Ok(result.unwrap_or_default())
            }
            Condition::Configurable(leaf) => leaf.evaluate(record),
            Condition::RecordTypeSplit { income, cost } => {
                if record.is_income() {
                    income.evaluate(record)
                } else if record.is_cost() {
                    cost.evaluate(record)
                } else {
                    Ok(ClassificationResult::default())
                }
            }
        }
    }
}
