//! Summary command - apportioned income and costs with the qualified income per project

use super::{
    format_amount, format_hours, format_ratio, read_config, read_project_month, read_records,
};
use crate::core::{
    active_projects, CalendarAggregator, Category, ClassifiedRecord, Config, DateRange,
    Granularity, IncomeRegistry, RecordClassifier, YearSummary,
};
use chrono::{Datelike, NaiveDate};
use clap::Args;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// JSON configuration with projects, wages and rules
    #[arg(short, long)]
    config: PathBuf,

    /// Bookkeeping CSV file (or "-" for stdin)
    #[arg(short, long)]
    records: PathBuf,

    /// Directory of monthly reports, laid out as <YYYY>/<MM>/<code>.csv
    #[arg(short = 't', long)]
    reports: PathBuf,

    /// Year to summarise
    #[arg(short, long)]
    year: i32,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = read_config(&self.config)?;
        let wages = config.wage_table();
        let records = read_records(&self.records, Some(self.year))?;
        let classifier = RecordClassifier::new(&config.records, &config.projects)?;
        let classified = classifier.classify_all(records)?;

        let mut registry = IncomeRegistry::new(&wages);
        let project_ids = register_project_hours(&mut registry, &config, &self.reports, self.year)?;
        register_total_income(&mut registry, &classified)?;

        let summary = YearSummary::build(self.year, &classified, &registry, &project_ids)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary, &registry);
        }
        Ok(())
    }
}

/// Monthly hours of every project active in `year`. Returns the ids of those projects.
fn register_project_hours(
    registry: &mut IncomeRegistry,
    config: &Config,
    reports: &Path,
    year: i32,
) -> anyhow::Result<Vec<String>> {
    let range = DateRange::year(year).ok_or_else(|| anyhow::anyhow!("invalid year {year}"))?;
    let projects = active_projects(&config.projects, year, None);

    for project in &projects {
        let mut monthly = CalendarAggregator::new(Granularity::Month, range);
        for month in 1..=12 {
            if !project.is_active(year, Some(month)) {
                continue;
            }
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| anyhow::anyhow!("invalid month {year}-{month:02}"))?;
            // entries dated outside their report's month are dropped
            let mut daily =
                CalendarAggregator::new(Granularity::Day, DateRange::till_end_of_month(first));
            for entry in read_project_month(reports, project, year, month)? {
                daily.append(&entry)?;
            }
            for day in daily.flush() {
                monthly.append_aggregated(&day)?;
            }
        }
        for entry in monthly.flush() {
            let month = entry.bucket_date.month();
            if project.is_active(year, Some(month)) {
                registry.record_project_hours(
                    year,
                    month,
                    &project.id,
                    entry.qualifying_hours,
                    entry.other_hours,
                )?;
            }
        }
    }
    Ok(projects.into_iter().map(|p| p.id.clone()).collect())
}

fn register_total_income(
    registry: &mut IncomeRegistry,
    records: &[ClassifiedRecord],
) -> anyhow::Result<()> {
    for classified in records {
        let record = &classified.record;
        if record.is_income() {
            registry.record_total_income(record.year(), record.month(), record.total_income)?;
        }
    }
    Ok(())
}

fn print_summary(summary: &YearSummary, registry: &IncomeRegistry) {
    println!();
    println!("IP BOX SUMMARY ({})", summary.year);
    println!();
    println!(
        "  Total income: {} | Total costs: {}",
        format_amount(summary.total_income),
        format_amount(summary.total_costs)
    );
    println!();

    let hours: Vec<_> = registry
        .project_entries()
        .map(|(period, project_id, entry)| HoursRow {
            month: period.to_string(),
            project: project_id.to_string(),
            wage: format_amount(entry.wage),
            qualifying_hours: format_hours(entry.qualifying_hours),
            other_hours: format_hours(entry.other_hours),
            qualifying_income: format_amount(entry.qualifying_income()),
        })
        .collect();
    if !hours.is_empty() {
        println!("{}", styled(Table::new(hours)));
        println!();
    }

    if summary.entries.is_empty() {
        println!("No qualifying records");
    } else {
        let rows: Vec<_> = summary.entries.iter().map(EntryRow::from).collect();
        println!("{}", styled(Table::new(rows)));
    }
    println!();

    for result in &summary.projects {
        println!("PROJECT {}", result.project_id);
        println!(
            "  Qualifying income: {} | Costs: {} (direct {}, indirect {})",
            format_amount(result.qualifying_income),
            format_amount(result.costs()),
            format_amount(result.direct_costs),
            format_amount(result.indirect_costs)
        );
        println!("  Nexus: {:.4} (raw {:.4})", result.nexus, result.nexus_raw);
        println!(
            "  Qualified income: {} | Remaining income: {} | Tax @ 5%: {}",
            format_amount(result.qualified_income),
            format_amount(result.remaining_income),
            format_amount(result.preferential_tax)
        );
        println!();
    }
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}

#[derive(Debug, Clone, Tabled)]
struct HoursRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Wage")]
    wage: String,
    #[tabled(rename = "Qualifying h")]
    qualifying_hours: String,
    #[tabled(rename = "Other h")]
    other_hours: String,
    #[tabled(rename = "Qualifying income")]
    qualifying_income: String,
}

#[derive(Debug, Clone, Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    number: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Hours (Q/O)")]
    hours: String,
    #[tabled(rename = "Qualifying")]
    qualifying_income: String,
    #[tabled(rename = "Other")]
    other_income: String,
    #[tabled(rename = "A")]
    cost_a: String,
    #[tabled(rename = "B")]
    cost_b: String,
    #[tabled(rename = "C")]
    cost_c: String,
    #[tabled(rename = "D")]
    cost_d: String,
}

impl From<&crate::core::ApportionedEntry> for EntryRow {
    fn from(entry: &crate::core::ApportionedEntry) -> Self {
        let hours = match (entry.qualifying_hours, entry.other_hours) {
            (Some(q), Some(o)) => format!("{}/{}", format_hours(q), format_hours(o)),
            _ => "-".to_string(),
        };
        EntryRow {
            number: entry.number,
            date: entry.date.format("%Y-%m-%d").to_string(),
            project: entry.project_id.clone(),
            ratio: format_ratio(entry.ratio),
            hours,
            qualifying_income: format_amount(entry.qualifying_income),
            other_income: format_amount(entry.other_income),
            cost_a: format_amount(entry.cost(Category::A)),
            cost_b: format_amount(entry.cost(Category::B)),
            cost_c: format_amount(entry.cost(Category::C)),
            cost_d: format_amount(entry.cost(Category::D)),
        }
    }
}
