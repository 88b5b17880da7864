use super::wage::{WageError, WageTable};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IncomeError {
    #[error("duplicated income for {period} - {project_id}")]
    DuplicateIncomeEntry { period: Period, project_id: String },
    #[error("missing data for {period}: {what}")]
    MissingPeriodData { period: Period, what: String },
    #[error("amount overflow for {period}: {what}")]
    Overflow { period: Period, what: String },
    #[error("invalid period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },
    #[error(transparent)]
    Wage(#[from] WageError),
}

/// Calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Period { year, month }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Hours worked on a project in a month, valued at the month's wage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectIncomeEntry {
    pub wage: Decimal,
    pub qualifying_hours: Decimal,
    pub other_hours: Decimal,
}

impl ProjectIncomeEntry {
    /// None when either income does not fit a `Decimal`
    fn new(wage: Decimal, qualifying_hours: Decimal, other_hours: Decimal) -> Option<Self> {
        wage.checked_mul(qualifying_hours)?;
        wage.checked_mul(other_hours)?;
        Some(ProjectIncomeEntry {
            wage,
            qualifying_hours,
            other_hours,
        })
    }

    pub fn qualifying_income(&self) -> Decimal {
        self.wage * self.qualifying_hours
    }

    pub fn other_income(&self) -> Decimal {
        self.wage * self.other_hours
    }
}

/// Per-project hours and per-period total income for one run
#[derive(Debug, Clone)]
pub struct IncomeRegistry<'a> {
    wages: &'a WageTable,
    project_income: BTreeMap<(Period, String), ProjectIncomeEntry>,
    total_income: BTreeMap<Period, Decimal>,
}

impl<'a> IncomeRegistry<'a> {
    pub fn new(wages: &'a WageTable) -> Self {
        IncomeRegistry {
            wages,
            project_income: BTreeMap::new(),
            total_income: BTreeMap::new(),
        }
    }

    /// Store a project's hours for a month. Only one entry per month and project.
    pub fn record_project_hours(
        &mut self,
        year: i32,
        month: u32,
        project_id: &str,
        qualifying_hours: Decimal,
        other_hours: Decimal,
    ) -> Result<(), IncomeError> {
        let period = Period::new(year, month);
        let key = (period, project_id.to_string());
        if self.project_income.contains_key(&key) {
            return Err(IncomeError::DuplicateIncomeEntry {
                period,
                project_id: project_id.to_string(),
            });
        }
        let first_day = period
            .first_day()
            .ok_or(IncomeError::InvalidPeriod { year, month })?;
        let wage = self.wages.lookup(first_day)?;
        log::debug!(
            "Project {project_id} {period}: wage={wage} qualifying={qualifying_hours} other={other_hours}"
        );
        let entry = ProjectIncomeEntry::new(wage, qualifying_hours, other_hours).ok_or_else(|| {
            IncomeError::Overflow {
                period,
                what: format!("project {project_id} income"),
            }
        })?;
        self.project_income.insert(key, entry);
        Ok(())
    }

    /// Add to the period's total income. Repeated calls accumulate.
    pub fn record_total_income(
        &mut self,
        year: i32,
        month: u32,
        amount: Decimal,
    ) -> Result<(), IncomeError> {
        let period = Period::new(year, month);
        let total = self.total_income.entry(period).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or_else(|| IncomeError::Overflow {
                period,
                what: "total income".to_string(),
            })?;
        Ok(())
    }

    pub fn project_income(
        &self,
        year: i32,
        month: u32,
        project_id: &str,
    ) -> Result<&ProjectIncomeEntry, IncomeError> {
        let period = Period::new(year, month);
        self.project_income
            .get(&(period, project_id.to_string()))
            .ok_or_else(|| IncomeError::MissingPeriodData {
                period,
                what: format!("project {project_id}"),
            })
    }

    pub fn total_income(&self, year: i32, month: u32) -> Result<Decimal, IncomeError> {
        let period = Period::new(year, month);
        self.total_income
            .get(&period)
            .copied()
            .ok_or_else(|| IncomeError::MissingPeriodData {
                period,
                what: "total income".to_string(),
            })
    }

    /// Share of the period's total income earned by the project's qualifying hours
    pub fn get_income_ratio(
        &self,
        year: i32,
        month: u32,
        project_id: &str,
    ) -> Result<Decimal, IncomeError> {
        let qualifying = self
            .project_income(year, month, project_id)?
            .qualifying_income();
        let total = self.total_income(year, month)?;
        qualifying
            .checked_div(total)
            .ok_or_else(|| IncomeError::MissingPeriodData {
                period: Period::new(year, month),
                what: "non-zero total income".to_string(),
            })
    }

    /// All project entries, ordered by period then project id
    pub fn project_entries(&self) -> impl Iterator<Item = (&Period, &str, &ProjectIncomeEntry)> {
        self.project_income
            .iter()
            .map(|((period, id), entry)| (period, id.as_str(), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wage::WageEntry;
    use rust_decimal_macros::dec;

    fn wages() -> WageTable {
        WageTable::new(vec![
            WageEntry {
                from: "2020-01-01".parse().unwrap(),
                wage: dec!(50),
            },
            WageEntry {
                from: "2021-06-01".parse().unwrap(),
                wage: dec!(60),
            },
        ])
    }

    #[test]
    fn project_hours_valued_at_month_wage() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry
            .record_project_hours(2021, 6, "P1", dec!(100), dec!(60))
            .unwrap();

        let entry = registry.project_income(2021, 6, "P1").unwrap();
        assert_eq!(entry.wage, dec!(60));
        assert_eq!(entry.qualifying_income(), dec!(6000));
        assert_eq!(entry.other_income(), dec!(3600));
    }

    #[test]
    fn duplicate_project_hours_rejected() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry
            .record_project_hours(2021, 3, "P1", dec!(10), dec!(0))
            .unwrap();
        registry
            .record_project_hours(2021, 3, "P2", dec!(10), dec!(0))
            .unwrap();
        assert_eq!(
            registry.record_project_hours(2021, 3, "P1", dec!(5), dec!(5)),
            Err(IncomeError::DuplicateIncomeEntry {
                period: Period::new(2021, 3),
                project_id: "P1".to_string()
            })
        );
    }

    #[test]
    fn hours_before_employment_fail() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        assert_eq!(
            registry.record_project_hours(2019, 12, "P1", dec!(1), dec!(1)),
            Err(IncomeError::Wage(WageError::DateBeforeEmployment(
                "2019-12-01".parse().unwrap()
            )))
        );
    }

    #[test]
    fn total_income_accumulates() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry.record_total_income(2021, 3, dec!(1000)).unwrap();
        registry.record_total_income(2021, 3, dec!(500.50)).unwrap();
        assert_eq!(registry.total_income(2021, 3), Ok(dec!(1500.50)));
    }

    #[test]
    fn income_ratio() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry
            .record_project_hours(2021, 3, "P1", dec!(80), dec!(80))
            .unwrap();
        registry.record_total_income(2021, 3, dec!(16000)).unwrap();
        assert_eq!(registry.get_income_ratio(2021, 3, "P1"), Ok(dec!(0.25)));
    }

    #[test]
    fn ratio_requires_both_sides() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry
            .record_project_hours(2021, 3, "P1", dec!(80), dec!(80))
            .unwrap();
        assert!(matches!(
            registry.get_income_ratio(2021, 3, "P1"),
            Err(IncomeError::MissingPeriodData { .. })
        ));

        registry.record_total_income(2021, 4, dec!(100)).unwrap();
        assert!(matches!(
            registry.get_income_ratio(2021, 4, "P1"),
            Err(IncomeError::MissingPeriodData { .. })
        ));
    }

    #[test]
    fn zero_total_income_is_missing_data() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        registry
            .record_project_hours(2021, 3, "P1", dec!(80), dec!(0))
            .unwrap();
        registry.record_total_income(2021, 3, Decimal::ZERO).unwrap();
        assert_eq!(
            registry.get_income_ratio(2021, 3, "P1"),
            Err(IncomeError::MissingPeriodData {
                period: Period::new(2021, 3),
                what: "non-zero total income".to_string()
            })
        );
    }

    #[test]
    fn income_overflow_reported() {
        let wages = wages();
        let mut registry = IncomeRegistry::new(&wages);
        assert_eq!(
            registry.record_project_hours(2021, 3, "P1", Decimal::MAX, dec!(0)),
            Err(IncomeError::Overflow {
                period: Period::new(2021, 3),
                what: "project P1 income".to_string()
            })
        );
        assert!(registry.project_income(2021, 3, "P1").is_err());

        registry.record_total_income(2021, 3, Decimal::MAX).unwrap();
        assert!(matches!(
            registry.record_total_income(2021, 3, dec!(1)),
            Err(IncomeError::Overflow { .. })
        ));
        assert_eq!(registry.total_income(2021, 3), Ok(Decimal::MAX));
    }
}
