use super::classification::{Category, ClassificationError, ClassificationResult};
use super::condition::Condition;
use super::project::{active_projects, Project};
use super::record::{BookkeepingRecord, ClassifiedRecord};
use super::rules::RulesConfig;

/// Projects a qualifying record applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingProjectSelection {
    pub project_ids: Vec<String>,
    /// Only meaningful for cost records
    pub category: Option<Category>,
}

/// Classification of one record: the rule result and the projects active
/// in the record's month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordClassification {
    pub result: ClassificationResult,
    pub active_projects: Vec<String>,
}

impl RecordClassification {
    /// Qualifies when a rule matched and a project was active
    pub fn selection(&self) -> Option<QualifyingProjectSelection> {
        if self.result.matches() && !self.active_projects.is_empty() {
            Some(QualifyingProjectSelection {
                project_ids: self.active_projects.clone(),
                category: self.result.category(),
            })
        } else {
            None
        }
    }
}

/// Classifies bookkeeping records against the configured rules
#[derive(Debug, Clone)]
pub struct RecordClassifier<'a> {
    condition: Condition,
    projects: &'a [Project],
}

impl<'a> RecordClassifier<'a> {
    pub fn new(rules: &RulesConfig, projects: &'a [Project]) -> Result<Self, ClassificationError> {
        Ok(RecordClassifier {
            condition: rules.condition()?,
            projects,
        })
    }

    pub fn classify(
        &self,
        record: &BookkeepingRecord,
    ) -> Result<RecordClassification, ClassificationError> {
        let result = self.condition.evaluate(record)?;
        let active_projects = active_projects(self.projects, record.year(), Some(record.month()))
            .into_iter()
            .map(|p| p.id.clone())
            .collect();
        log::debug!(
            "Record {} ({}): matches={} category={:?}",
            record.number,
            record.date,
            result.matches(),
            result.category()
        );
        Ok(RecordClassification {
            result,
            active_projects,
        })
    }

    /// Classify and attach the qualifying projects to the record
    pub fn classify_record(
        &self,
        record: BookkeepingRecord,
    ) -> Result<ClassifiedRecord, ClassificationError> {
        let selection = self.classify(&record)?.selection();
        let (project_ids, category) = match selection {
            Some(s) => (s.project_ids, s.category.filter(|_| record.is_cost())),
            None => (Vec::new(), None),
        };
        Ok(ClassifiedRecord {
            record,
            project_ids,
            category,
        })
    }

    pub fn classify_all(
        &self,
        records: Vec<BookkeepingRecord>,
    ) -> Result<Vec<ClassifiedRecord>, ClassificationError> {
        records
            .into_iter()
            .map(|r| self.classify_record(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::tests::record;
    use crate::core::project::tests::project;
    use serde_json::json;

    fn rules() -> RulesConfig {
        RulesConfig::from_value(&json!({
            "incomes": [{"companyName": {"equals": "Client"}}],
            "costs": [
                {"category": "A", "description": {"contains": "licence"}},
                {"category": "B", "companyName": {"startsWith": "Hardware"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn income_record_qualifies_for_active_projects() {
        let projects = vec![
            project("P1", "2024-01-01", None),
            project("P2", "2024-03-01", None),
        ];
        let classifier = RecordClassifier::new(&rules(), &projects).unwrap();

        let classification = classifier
            .classify(&record("Client", "Invoice", "1000", ""))
            .unwrap();
        let selection = classification.selection().unwrap();
        assert_eq!(selection.project_ids, vec!["P1"]);
        assert_eq!(selection.category, None);
    }

    #[test]
    fn cost_record_carries_category() {
        let projects = vec![project("P1", "2024-01-01", None)];
        let classifier = RecordClassifier::new(&rules(), &projects).unwrap();

        let classified = classifier
            .classify_record(record("Shop", "IDE licence", "", "300"))
            .unwrap();
        assert_eq!(classified.project_ids, vec!["P1"]);
        assert_eq!(classified.category, Some(Category::A));
    }

    #[test]
    fn no_active_project_means_not_qualifying() {
        let projects = vec![project("P1", "2025-01-01", None)];
        let classifier = RecordClassifier::new(&rules(), &projects).unwrap();

        let classification = classifier
            .classify(&record("Client", "Invoice", "1000", ""))
            .unwrap();
        assert!(classification.result.matches());
        assert_eq!(classification.selection(), None);
    }

    #[test]
    fn unmatched_record_not_qualifying() {
        let projects = vec![project("P1", "2024-01-01", None)];
        let classifier = RecordClassifier::new(&rules(), &projects).unwrap();

        let classified = classifier
            .classify_record(record("Bakery", "Bread", "", "12"))
            .unwrap();
        assert!(!classified.is_qualifying());
        assert_eq!(classified.category, None);
    }

    #[test]
    fn conflicting_rules_stop_classification() {
        let projects = vec![project("P1", "2024-01-01", None)];
        let classifier = RecordClassifier::new(&rules(), &projects).unwrap();

        let err = classifier
            .classify_all(vec![
                record("Client", "Invoice", "1000", ""),
                record("Hardware Store", "Laptop licence", "", "4000"),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            ClassificationError::CategoryConflict {
                left: Category::A,
                right: Category::B
            }
        );
    }
}
