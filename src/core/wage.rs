use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WageError {
    #[error("date {0} is before employment date")]
    DateBeforeEmployment(NaiveDate),
}

/// Hourly wage effective from a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WageEntry {
    #[schemars(with = "String")]
    pub from: NaiveDate,
    #[schemars(with = "f64")]
    pub wage: Decimal,
}

/// Hourly wages ordered by effective date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WageTable {
    entries: Vec<WageEntry>,
}

impl WageTable {
    pub fn new(mut entries: Vec<WageEntry>) -> Self {
        entries.sort_by_key(|e| e.from);
        WageTable { entries }
    }

    /// Wage of the latest entry effective on or before `date`
    pub fn lookup(&self, date: NaiveDate) -> Result<Decimal, WageError> {
        self.entries
            .iter()
            .take_while(|e| e.from <= date)
            .last()
            .map(|e| e.wage)
            .ok_or(WageError::DateBeforeEmployment(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn table() -> WageTable {
        WageTable::new(vec![
            WageEntry {
                from: date("2021-06-01"),
                wage: dec!(60),
            },
            WageEntry {
                from: date("2020-01-01"),
                wage: dec!(50),
            },
        ])
    }

    #[test]
    fn lookup_latest_effective_wage() {
        let wages = table();
        assert_eq!(wages.lookup(date("2020-01-01")), Ok(dec!(50)));
        assert_eq!(wages.lookup(date("2021-01-15")), Ok(dec!(50)));
        assert_eq!(wages.lookup(date("2021-06-01")), Ok(dec!(60)));
        assert_eq!(wages.lookup(date("2030-01-01")), Ok(dec!(60)));
    }

    #[test]
    fn before_employment_fails() {
        assert_eq!(
            table().lookup(date("2019-12-31")),
            Err(WageError::DateBeforeEmployment(date("2019-12-31")))
        );
        assert!(WageTable::default().lookup(date("2024-01-01")).is_err());
    }
}
