use super::classification::Category;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;

/// Number of columns in a bookkeeping row
pub const RECORD_FIELDS: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: expected 16 fields, found {found}")]
    WrongFieldCount { line: u64, found: usize },
    #[error("line {line}: invalid sequence number '{value}'")]
    InvalidNumber { line: u64, value: String },
    #[error("line {line}: invalid decimal '{value}' in column {column}")]
    InvalidDecimal {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: record {number} has both income and cost")]
    IncomeAndCost { line: u64, number: u32 },
}

/// Row of the revenue and expense ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookkeepingRecord {
    /// Source line, for error reporting
    #[serde(skip)]
    pub line: u64,
    pub number: u32,
    pub date: NaiveDate,
    pub invoice_number: String,
    pub company_name: String,
    pub company_address: String,
    pub description: String,
    pub sales_income: Decimal,
    pub other_income: Decimal,
    pub total_income: Decimal,
    pub goods_purchase: Decimal,
    pub incidental_costs: Decimal,
    pub salaries: Decimal,
    pub other_costs: Decimal,
    pub total_cost: Decimal,
    pub research_costs: String,
    pub remarks: String,
}

impl BookkeepingRecord {
    /// Parse a 16-field row. `line` identifies the row in its source.
    pub fn from_fields(line: u64, fields: &[&str]) -> Result<Self, RecordError> {
        if fields.len() != RECORD_FIELDS {
            return Err(RecordError::WrongFieldCount {
                line,
                found: fields.len(),
            });
        }

        let amount = |idx: usize, column: &'static str| {
            parse_amount(fields[idx]).ok_or_else(|| RecordError::InvalidDecimal {
                line,
                column,
                value: fields[idx].to_string(),
            })
        };

        let number = fields[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| RecordError::InvalidNumber {
                line,
                value: fields[0].to_string(),
            })?;
        let date = parse_date(fields[1]).ok_or_else(|| RecordError::InvalidDate {
            line,
            value: fields[1].to_string(),
        })?;

        let record = BookkeepingRecord {
            line,
            number,
            date,
            invoice_number: fields[2].to_string(),
            company_name: fields[3].to_string(),
            company_address: fields[4].to_string(),
            description: fields[5].to_string(),
            sales_income: amount(6, "sales_income")?,
            other_income: amount(7, "other_income")?,
            total_income: amount(8, "total_income")?,
            goods_purchase: amount(9, "goods_purchase")?,
            incidental_costs: amount(10, "incidental_costs")?,
            salaries: amount(11, "salaries")?,
            other_costs: amount(12, "other_costs")?,
            total_cost: amount(13, "total_cost")?,
            research_costs: fields[14].to_string(),
            remarks: fields[15].to_string(),
        };

        if record.is_income() && record.is_cost() {
            return Err(RecordError::IncomeAndCost { line, number });
        }
        Ok(record)
    }

    pub fn is_income(&self) -> bool {
        self.total_income > Decimal::ZERO
    }

    pub fn is_cost(&self) -> bool {
        self.total_cost > Decimal::ZERO
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.date.format("%Y-%m-%d").to_string(),
            self.invoice_number.clone(),
            self.company_name.clone(),
            self.company_address.clone(),
            self.description.clone(),
            self.sales_income.to_string(),
            self.other_income.to_string(),
            self.total_income.to_string(),
            self.goods_purchase.to_string(),
            self.incidental_costs.to_string(),
            self.salaries.to_string(),
            self.other_costs.to_string(),
            self.total_cost.to_string(),
            self.research_costs.clone(),
            self.remarks.clone(),
        ]
    }
}

/// Parse a decimal using either `.` or `,` as the fraction separator.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(&value.trim().replace(',', ".")).ok()
}

/// Empty ledger cells mean no amount
fn parse_amount(value: &str) -> Option<Decimal> {
    if value.trim().is_empty() {
        Some(Decimal::ZERO)
    } else {
        parse_decimal(value)
    }
}

/// Parse an ISO date, accepting a trailing time part
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Read bookkeeping records from CSV with a header row
pub fn read_records_csv<R: Read>(reader: R) -> anyhow::Result<Vec<BookkeepingRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        let fields: Vec<&str> = row.iter().collect();
        records.push(BookkeepingRecord::from_fields(line, &fields)?);
    }
    log::info!("Read {} bookkeeping records", records.len());
    Ok(records)
}

/// A bookkeeping record with its qualifying projects and cost category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub record: BookkeepingRecord,
    /// Empty when the record does not qualify
    pub project_ids: Vec<String>,
    /// Only set for qualifying cost records
    pub category: Option<Category>,
}

impl ClassifiedRecord {
    pub fn is_qualifying(&self) -> bool {
        !self.project_ids.is_empty()
    }

    /// Qualifying income of the record (before apportionment)
    pub fn qualifying_income(&self) -> Decimal {
        if self.record.is_income() && self.is_qualifying() {
            self.record.total_income
        } else {
            Decimal::ZERO
        }
    }

    /// Cost attributed to `category`, zero unless this qualifying cost has it
    pub fn cost(&self, category: Category) -> Decimal {
        if self.record.is_cost() && self.is_qualifying() && self.category == Some(category) {
            self.record.total_cost
        } else {
            Decimal::ZERO
        }
    }

    pub fn csv_fields(&self) -> Vec<String> {
        let mut fields = self.record.to_fields();
        fields.push(self.project_ids.join(", "));
        fields.push(
            self.category
                .filter(|_| self.record.is_cost())
                .map(|c| c.to_string())
                .unwrap_or_default(),
        );
        fields
    }
}

pub const CLASSIFIED_CSV_HEADER: &[&str] = &[
    "number",
    "date",
    "invoice_number",
    "company_name",
    "company_address",
    "description",
    "sales_income",
    "other_income",
    "total_income",
    "goods_purchase",
    "incidental_costs",
    "salaries",
    "other_costs",
    "total_cost",
    "research_costs",
    "remarks",
    "projects",
    "category",
];
