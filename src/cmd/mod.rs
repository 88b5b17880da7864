pub mod records;
pub mod schema;
pub mod summary;
pub mod timesheet;

use crate::core::{
    read_config as parse_config, read_records_csv, read_time_entries_csv, BookkeepingRecord,
    ClassifiedTimeEntry, Config, Project,
};
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read the JSON configuration file
pub fn read_config(path: &Path) -> anyhow::Result<Config> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    parse_config(BufReader::new(file)).with_context(|| format!("reading config {}", path.display()))
}

/// Read bookkeeping records (or stdin with "-"), optionally only one year
pub fn read_records(path: &Path, year: Option<i32>) -> anyhow::Result<Vec<BookkeepingRecord>> {
    let records = if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        read_records_csv(io::Cursor::new(buffer))?
    } else {
        let file =
            File::open(path).with_context(|| format!("opening records {}", path.display()))?;
        read_records_csv(BufReader::new(file))
            .with_context(|| format!("reading records {}", path.display()))?
    };
    Ok(records
        .into_iter()
        .filter(|r| year.is_none_or(|y| r.year() == y))
        .collect())
}

/// Read and classify a project's time entries for one month.
///
/// Each timesheet source is read from `<reports>/<YYYY>/<MM>/<code>.csv`;
/// missing reports are skipped.
pub fn read_project_month(
    reports: &Path,
    project: &Project,
    year: i32,
    month: u32,
) -> anyhow::Result<Vec<ClassifiedTimeEntry>> {
    let mut classified = Vec::new();
    for selector in &project.timesheet {
        let path = reports
            .join(year.to_string())
            .join(format!("{month:02}"))
            .join(format!("{}.csv", selector.code));
        if !path.is_file() {
            log::warn!("Report {} not found", path.display());
            continue;
        }
        let file = File::open(&path)?;
        let entries = read_time_entries_csv(BufReader::new(file))
            .with_context(|| format!("reading time entries {}", path.display()))?;
        log::info!(
            "Project {} {year}-{month:02}: {} entries from {}",
            project.id,
            entries.len(),
            selector.code
        );
        classified.extend(entries.into_iter().map(|entry| {
            let is_qualifying = selector.is_qualifying(&entry.task_label);
            ClassifiedTimeEntry::new(entry, is_qualifying)
        }));
    }
    Ok(classified)
}

/// Parse a `YYYY-MM` month into its first day
pub fn parse_month(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{value}', expected YYYY-MM"))
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn format_hours(hours: Decimal) -> String {
    let s = format!("{:.2}", hours);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

fn format_ratio(ratio: Decimal) -> String {
    format!("{:.2}%", ratio * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_month() {
        assert_eq!(
            parse_month("2024-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("02/2024").is_err());
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_hours(dec!(7.50)), "7.5");
        assert_eq!(format_hours(dec!(8)), "8");
        assert_eq!(format_amount(dec!(1234.5)), "1234.50");
        assert_eq!(format_ratio(dec!(0.25)), "25.00%");
    }
}
