pub mod classification;
pub mod classifier;
pub mod condition;
pub mod config;
pub mod income;
pub mod project;
pub mod record;
pub mod rules;
pub mod summary;
pub mod timesheet;
pub mod wage;

// Flat public surface for domain types and functions.
pub use classification::Category;
pub use classifier::RecordClassifier;
pub use config::{read_config, Config};
pub use income::IncomeRegistry;
pub use project::{active_projects, Project};
pub use record::{read_records_csv, BookkeepingRecord, ClassifiedRecord};
pub use summary::{ApportionedEntry, YearSummary};
pub use timesheet::{
    read_time_entries_csv, AggregatedEntry, CalendarAggregator, ClassifiedTimeEntry, DateRange,
    Granularity,
};
