//! Timesheet command - project hours per day or month

use super::{format_hours, parse_month, read_config, read_project_month};
use crate::core::{
    AggregatedEntry, CalendarAggregator, ClassifiedTimeEntry, DateRange, Granularity,
};
use chrono::Datelike;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct TimesheetCommand {
    /// JSON configuration with projects, wages and rules
    #[arg(short, long)]
    config: PathBuf,

    /// Directory of monthly reports, laid out as <YYYY>/<MM>/<code>.csv
    #[arg(short = 't', long)]
    reports: PathBuf,

    /// Project id
    #[arg(short, long)]
    project: String,

    /// First month (YYYY-MM)
    #[arg(long)]
    from: String,

    /// Last month (YYYY-MM), defaults to the first
    #[arg(long)]
    to: Option<String>,

    /// Bucket size of the aggregated hours
    #[arg(short, long, value_enum, default_value_t = GranularityArg::Day)]
    granularity: GranularityArg,

    /// Show the individual time entries instead of aggregated hours
    #[arg(long)]
    detailed: bool,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum GranularityArg {
    #[default]
    Day,
    Month,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Day => Granularity::Day,
            GranularityArg::Month => Granularity::Month,
        }
    }
}

impl TimesheetCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = read_config(&self.config)?;
        let project = config
            .project(&self.project)
            .ok_or_else(|| anyhow::anyhow!("unknown project '{}'", self.project))?;

        let start = parse_month(&self.from)?;
        let end = match &self.to {
            Some(to) => parse_month(to)?,
            None => start,
        };
        let range = DateRange::months(start, end)?;

        let mut entries = Vec::new();
        for month in Granularity::Month.buckets(range.start, range.end) {
            if !project.is_active(month.year(), Some(month.month())) {
                log::info!(
                    "Project {} not active in {}, skipping",
                    project.id,
                    Granularity::Month.format(month)
                );
                continue;
            }
            entries.extend(read_project_month(
                &self.reports,
                project,
                month.year(),
                month.month(),
            )?);
        }

        if self.detailed {
            let rows: Vec<_> = entries
                .iter()
                .filter(|e| range.contains(e.date))
                .map(EntryRow::from)
                .collect();
            return self.output(&rows);
        }

        let granularity = Granularity::from(self.granularity);
        let mut aggregator = CalendarAggregator::new(granularity, range);
        for entry in &entries {
            aggregator.append(entry)?;
        }
        let rows: Vec<_> = aggregator
            .flush()
            .iter()
            .map(|e| AggregatedRow::new(granularity, e))
            .collect();
        self.output(&rows)
    }

    fn output<T: Tabled + Serialize>(&self, rows: &[T]) -> anyhow::Result<()> {
        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        } else if self.json {
            println!("{}", serde_json::to_string_pretty(rows)?);
        } else if rows.is_empty() {
            println!("No time entries found");
        } else {
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
struct AggregatedRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Qualifying")]
    qualifying_hours: String,
    #[tabled(rename = "Other")]
    other_hours: String,
    #[tabled(rename = "Total")]
    total_hours: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl AggregatedRow {
    fn new(granularity: Granularity, entry: &AggregatedEntry) -> Self {
        AggregatedRow {
            date: granularity.format(entry.bucket_date),
            qualifying_hours: format_hours(entry.qualifying_hours),
            other_hours: format_hours(entry.other_hours),
            total_hours: format_hours(entry.total_hours()),
            notes: entry
                .notes
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
struct EntryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Notes")]
    notes: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Qualifying")]
    qualifying: bool,
}

impl From<&ClassifiedTimeEntry> for EntryRow {
    fn from(entry: &ClassifiedTimeEntry) -> Self {
        EntryRow {
            date: entry.date.format("%Y-%m-%d").to_string(),
            task: entry.task_label.clone(),
            notes: entry.notes.clone(),
            hours: format_hours(entry.hours),
            qualifying: entry.is_qualifying,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    #[test]
    fn aggregated_row_formats_bucket_and_notes() {
        let entry = AggregatedEntry {
            bucket_date: "2024-02-01".parse().unwrap(),
            qualifying_hours: dec!(6.5),
            other_hours: dec!(1.5),
            notes: BTreeSet::from(["parser".to_string(), "api".to_string()]),
        };
        let row = AggregatedRow::new(Granularity::Month, &entry);
        assert_eq!(row.date, "2024-02");
        assert_eq!(row.qualifying_hours, "6.5");
        assert_eq!(row.total_hours, "8");
        let mut notes: Vec<_> = row.notes.split("; ").collect();
        notes.sort();
        assert_eq!(notes, vec!["api", "parser"]);
    }
}
