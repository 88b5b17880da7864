//! Schema command - print expected input formats

use crate::core::record::CLASSIFIED_CSV_HEADER;
use crate::core::Config;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the configuration file
    JsonSchema,
    /// Bookkeeping CSV column descriptions
    RecordsFields,
    /// Timesheet report CSV header row
    TimesheetHeader,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::RecordsFields => self.print_records_fields(),
            SchemaFormat::TimesheetHeader => self.print_timesheet_header(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_records_fields(&self) -> anyhow::Result<()> {
        println!("Bookkeeping CSV Format");
        println!("======================");
        println!();
        println!("Rows have {} fields, in this order:", RECORD_FIELD_DESCRIPTIONS.len());
        for (name, description) in RECORD_FIELD_DESCRIPTIONS {
            println!("  {:18}  {}", name, description);
        }
        println!();
        println!("Amounts accept ',' or '.' as decimal separator; empty amounts are zero.");
        println!(
            "The records command adds: {}",
            CLASSIFIED_CSV_HEADER[RECORD_FIELD_DESCRIPTIONS.len()..].join(", ")
        );
        Ok(())
    }

    fn print_timesheet_header(&self) -> anyhow::Result<()> {
        println!("{}", TIMESHEET_COLUMNS.join(","));
        Ok(())
    }
}

const TIMESHEET_COLUMNS: &[&str] = &["date", "task", "notes", "hours"];

const RECORD_FIELD_DESCRIPTIONS: &[(&str, &str)] = &[
    ("number", "Ledger entry number"),
    ("date", "Entry date (YYYY-MM-DD, optionally with a time)"),
    ("invoice_number", "Invoice or document number"),
    ("company_name", "Counterparty name"),
    ("company_address", "Counterparty address"),
    ("description", "Description of the event"),
    ("sales_income", "Income from sales"),
    ("other_income", "Other income"),
    ("total_income", "Total income"),
    ("goods_purchase", "Purchase of goods and materials"),
    ("incidental_costs", "Incidental purchase costs"),
    ("salaries", "Salaries in cash and kind"),
    ("other_costs", "Other expenses"),
    ("total_cost", "Total expenses"),
    ("research_costs", "Research and development costs"),
    ("remarks", "Remarks"),
];
