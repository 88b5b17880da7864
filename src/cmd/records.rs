//! Records command - classify the bookkeeping ledger against the configured rules

use super::{format_amount, read_config, read_records};
use crate::core::record::CLASSIFIED_CSV_HEADER;
use crate::core::{ClassifiedRecord, RecordClassifier};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RecordsCommand {
    /// JSON configuration with projects, wages and rules
    #[arg(short, long)]
    config: PathBuf,

    /// Bookkeeping CSV file (or "-" for stdin)
    #[arg(short, long)]
    records: PathBuf,

    /// Only records dated in this year
    #[arg(short, long)]
    year: Option<i32>,

    /// Only records attributed to at least one project
    #[arg(short, long)]
    qualifying: bool,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl RecordsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = read_config(&self.config)?;
        let records = read_records(&self.records, self.year)?;
        let classifier = RecordClassifier::new(&config.records, &config.projects)?;
        let classified: Vec<_> = classifier
            .classify_all(records)?
            .into_iter()
            .filter(|r| !self.qualifying || r.is_qualifying())
            .collect();
        log::info!(
            "{} of {} records qualify, qualifying income {}",
            classified.iter().filter(|r| r.is_qualifying()).count(),
            classified.len(),
            classified
                .iter()
                .map(ClassifiedRecord::qualifying_income)
                .sum::<Decimal>()
        );

        if self.csv {
            write_csv(&classified)
        } else if self.json {
            let views: Vec<_> = classified.iter().map(RecordView::from).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
            Ok(())
        } else {
            print_table(&classified);
            Ok(())
        }
    }
}

fn print_table(records: &[ClassifiedRecord]) {
    if records.is_empty() {
        println!("No records found");
        return;
    }

    let rows: Vec<_> = records.iter().map(RecordRow::from).collect();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

fn write_csv(records: &[ClassifiedRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    wtr.write_record(CLASSIFIED_CSV_HEADER)?;
    for record in records {
        wtr.write_record(record.csv_fields())?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    number: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Projects")]
    projects: String,
    #[tabled(rename = "Category")]
    category: String,
}

impl From<&ClassifiedRecord> for RecordRow {
    fn from(classified: &ClassifiedRecord) -> Self {
        let record = &classified.record;
        let amount = |present: bool, value| {
            if present {
                format_amount(value)
            } else {
                "-".to_string()
            }
        };
        RecordRow {
            number: record.number,
            date: record.date.format("%Y-%m-%d").to_string(),
            company: record.company_name.clone(),
            description: record.description.clone(),
            income: amount(record.is_income(), record.total_income),
            cost: amount(record.is_cost(), record.total_cost),
            projects: classified.project_ids.join(", "),
            category: classified
                .category
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Record with its classification for JSON output
#[derive(Debug, Serialize)]
struct RecordView<'a> {
    #[serde(flatten)]
    record: &'a crate::core::BookkeepingRecord,
    projects: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<crate::core::Category>,
}

impl<'a> From<&'a ClassifiedRecord> for RecordView<'a> {
    fn from(classified: &'a ClassifiedRecord) -> Self {
        RecordView {
            record: &classified.record,
            projects: &classified.project_ids,
            category: classified.category,
        }
    }
}
