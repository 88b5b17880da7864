use super::project::Project;
use super::rules::RulesConfig;
use super::wage::{WageEntry, WageTable};
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Configuration root: projects, wages and record classification rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub projects: Vec<Project>,
    pub wages: Vec<WageEntry>,
    #[serde(default)]
    pub records: RulesConfig,
}

impl Config {
    pub fn wage_table(&self) -> WageTable {
        WageTable::new(self.wages.clone())
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

/// Read configuration JSON. Rule keys are validated before deserializing.
pub fn read_config<R: Read>(reader: R) -> anyhow::Result<Config> {
    let mut value: serde_json::Value = serde_json::from_reader(reader)?;
    let rules = value
        .as_object_mut()
        .and_then(|root| root.remove("records"))
        .map(|rules| RulesConfig::from_value(&rules))
        .transpose()?
        .unwrap_or_default();
    let mut config: Config = serde_json::from_value(value).context("invalid configuration")?;
    config.records = rules;
    log::debug!(
        "Loaded {} projects, {} wage entries, {} income and {} cost rules",
        config.projects.len(),
        config.wages.len(),
        config.records.incomes.len(),
        config.records.costs.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classification::ClassificationError;
    use rust_decimal_macros::dec;

    const CONFIG: &str = r#"{
        "projects": [{
            "id": "KPWI-1",
            "name": "Route planner",
            "startDate": "2024-01-01",
            "employee": "Jan Kowalski",
            "timesheet": [{"code": "acme", "types": ["Development"]}]
        }],
        "wages": [{"from": "2024-01-01", "wage": 80}],
        "records": {
            "incomes": [{"companyName": {"equals": "ACME"}}],
            "costs": [{"category": "A", "description": {"contains": "licence"}}]
        }
    }"#;

    #[test]
    fn reads_config() {
        let config = read_config(CONFIG.as_bytes()).unwrap();
        assert_eq!(config.projects[0].id, "KPWI-1");
        assert_eq!(config.projects[0].end_date, None);
        assert_eq!(config.wages[0].wage, dec!(80));
        assert_eq!(config.records.costs.len(), 1);
        assert!(config.project("KPWI-1").is_some());
        assert!(config.project("KPWI-2").is_none());
    }

    #[test]
    fn mistyped_project_key_rejected() {
        let config = CONFIG.replace("\"employee\"", "\"endDtae\": \"2024-02-01\", \"employee\"");
        let err = read_config(config.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field `endDtae`"));
    }

    #[test]
    fn unknown_keys_outside_rules_rejected() {
        let top_level = CONFIG.replace("\"wages\":", "\"wagez\": 1, \"wages\":");
        assert!(read_config(top_level.as_bytes()).is_err());

        let wage = CONFIG.replace("\"wage\": 80", "\"wage\": 80, \"currency\": \"PLN\"");
        assert!(read_config(wage.as_bytes()).is_err());

        let selector = CONFIG.replace("\"types\":", "\"kinds\": [], \"types\":");
        assert!(read_config(selector.as_bytes()).is_err());
    }

    #[test]
    fn unsupported_rule_key_reported() {
        let config = CONFIG.replace("\"contains\": \"licence\"", "\"matches\": \"lic.*\"");
        let err = read_config(config.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ClassificationError>(),
            Some(&ClassificationError::UnsupportedMatcherKey {
                key: "matches".to_string(),
                location: "costs[0].description".to_string()
            })
        );
    }
}
