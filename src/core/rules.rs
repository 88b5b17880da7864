use super::classification::{Category, ClassificationError};
use super::condition::{Condition, ConfigurableCondition, Field, Predicate, PropertyMatcher};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GROUP_KEYS: &[&str] = &["incomes", "costs"];
const RULE_KEYS: &[&str] = &["category", "description", "companyName"];
const MATCHER_KEYS: &[&str] = &["startsWith", "contains", "equals"];

/// Classification rules for bookkeeping records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rules matching qualifying income records
    #[serde(default)]
    pub incomes: Vec<RuleConfig>,
    /// Rules matching qualifying cost records, each tagged with a category
    #[serde(default)]
    pub costs: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConfig {
    /// Cost category: A, B, C or D
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<MatcherConfig>,
    #[serde(default)]
    pub company_name: Option<MatcherConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatcherConfig {
    #[serde(default)]
    pub starts_with: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub equals: Option<String>,
}

impl RulesConfig {
    /// Validate keys, then deserialize. The value is left untouched.
    pub fn from_value(value: &Value) -> Result<Self, ClassificationError> {
        validate_keys(value)?;
        serde_json::from_value(value.clone())
            .map_err(|e| ClassificationError::MalformedRules(e.to_string()))
    }

    /// Condition evaluated against income records
    pub fn income_condition(&self) -> Condition {
        let rules = self
            .incomes
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                if let Some(category) = &rule.category {
                    log::warn!("Ignoring category {category} on income rule incomes[{idx}]");
                }
                Condition::Configurable(ConfigurableCondition::new(None, rule.matchers()))
            })
            .collect();
        Condition::AnyOf(rules)
    }

    /// Condition evaluated against cost records
    pub fn cost_condition(&self) -> Result<Condition, ClassificationError> {
        let rules = self
            .costs
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let category = rule
                    .category
                    .as_deref()
                    .ok_or_else(|| ClassificationError::MissingCategory {
                        location: format!("costs[{idx}]"),
                    })?
                    .parse::<Category>()?;
                Ok(Condition::Configurable(ConfigurableCondition::new(
                    Some(category),
                    rule.matchers(),
                )))
            })
            .collect::<Result<Vec<_>, ClassificationError>>()?;
        Ok(Condition::AnyOf(rules))
    }

    /// Income and cost conditions routed by record type
    pub fn condition(&self) -> Result<Condition, ClassificationError> {
        Ok(Condition::RecordTypeSplit {
            income: Box::new(self.income_condition()),
            cost: Box::new(self.cost_condition()?),
        })
    }
}

impl RuleConfig {
    fn matchers(&self) -> Vec<PropertyMatcher> {
        [
            (Field::Description, &self.description),
            (Field::CompanyName, &self.company_name),
        ]
        .into_iter()
        .filter_map(|(field, config)| {
            config
                .as_ref()
                .map(|c| PropertyMatcher::new(field, c.predicates()))
        })
        .collect()
    }
}

impl MatcherConfig {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(prefix) = &self.starts_with {
            predicates.push(Predicate::StartsWith(prefix.clone()));
        }
        if let Some(part) = &self.contains {
            predicates.push(Predicate::Contains(part.clone()));
        }
        if let Some(expected) = &self.equals {
            predicates.push(Predicate::Equals(expected.clone()));
        }
        predicates
    }
}

/// Reject any key the rules format does not know about
fn validate_keys(value: &Value) -> Result<(), ClassificationError> {
    let groups = expect_object(value, "rules")?;
    check_keys(groups, GROUP_KEYS, "rules")?;

    for group in GROUP_KEYS {
        let Some(rules) = groups.get(*group) else {
            continue;
        };
        let rules = rules.as_array().ok_or_else(|| {
            ClassificationError::MalformedRules(format!("{group} must be a list"))
        })?;
        for (idx, rule) in rules.iter().enumerate() {
            let location = format!("{group}[{idx}]");
            let rule = expect_object(rule, &location)?;
            check_keys(rule, RULE_KEYS, &location)?;
            for field in ["description", "companyName"] {
                if let Some(matcher) = rule.get(field) {
                    let location = format!("{location}.{field}");
                    let matcher = expect_object(matcher, &location)?;
                    check_keys(matcher, MATCHER_KEYS, &location)?;
                }
            }
        }
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    location: &str,
) -> Result<&'a serde_json::Map<String, Value>, ClassificationError> {
    value
        .as_object()
        .ok_or_else(|| ClassificationError::MalformedRules(format!("{location} must be an object")))
}

fn check_keys(
    object: &serde_json::Map<String, Value>,
    known: &[&str],
    location: &str,
) -> Result<(), ClassificationError> {
    match object.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(ClassificationError::UnsupportedMatcherKey {
            key: key.clone(),
            location: location.to_string(),
        }),
        None => Ok(()),
    }
}
