use super::record::{parse_date, parse_decimal};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TimesheetError {
    #[error("start date ({start}) is after end date ({end})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("line {line}: {reason}")]
    InvalidEntry { line: u64, reason: String },
    #[error("hours overflow in bucket {bucket}")]
    HoursOverflow { bucket: NaiveDate },
}

/// Logged work for one task on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub date: NaiveDate,
    pub task_label: String,
    pub notes: String,
    pub hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedTimeEntry {
    pub date: NaiveDate,
    pub task_label: String,
    pub notes: String,
    pub hours: Decimal,
    pub is_qualifying: bool,
}

impl ClassifiedTimeEntry {
    pub fn new(entry: TimeEntry, is_qualifying: bool) -> Self {
        ClassifiedTimeEntry {
            date: entry.date,
            task_label: entry.task_label,
            notes: entry.notes,
            hours: entry.hours,
            is_qualifying,
        }
    }
}

/// Hours summed over one calendar bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedEntry {
    pub bucket_date: NaiveDate,
    pub qualifying_hours: Decimal,
    pub other_hours: Decimal,
    /// Notes of qualifying work. Unordered in meaning.
    pub notes: BTreeSet<String>,
}

impl AggregatedEntry {
    pub fn empty(bucket_date: NaiveDate) -> Self {
        AggregatedEntry {
            bucket_date,
            qualifying_hours: Decimal::ZERO,
            other_hours: Decimal::ZERO,
            notes: BTreeSet::new(),
        }
    }

    fn from_classified(bucket_date: NaiveDate, entry: &ClassifiedTimeEntry) -> Self {
        let mut aggregated = Self::empty(bucket_date);
        if entry.is_qualifying {
            aggregated.qualifying_hours = entry.hours;
            if !entry.notes.is_empty() {
                aggregated.notes.insert(entry.notes.clone());
            }
        } else {
            aggregated.other_hours = entry.hours;
        }
        aggregated
    }

    pub fn total_hours(&self) -> Decimal {
        self.qualifying_hours + self.other_hours
    }

    /// Hours add, notes union. Keeps this entry's bucket date.
    /// Fails without changes when a sum, total included, does not fit a `Decimal`.
    pub fn merge(&mut self, other: &AggregatedEntry) -> Result<(), TimesheetError> {
        let overflow = TimesheetError::HoursOverflow {
            bucket: self.bucket_date,
        };
        let qualifying = self
            .qualifying_hours
            .checked_add(other.qualifying_hours)
            .ok_or_else(|| overflow.clone())?;
        let other_hours = self
            .other_hours
            .checked_add(other.other_hours)
            .ok_or_else(|| overflow.clone())?;
        qualifying.checked_add(other_hours).ok_or(overflow)?;

        self.qualifying_hours = qualifying;
        self.other_hours = other_hours;
        self.notes.extend(other.notes.iter().cloned());
        Ok(())
    }
}

/// Calendar bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

impl Granularity {
    /// First date of the bucket containing `date`
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn format(self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Month => date.format("%Y-%m").to_string(),
        }
    }

    fn next(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => bucket.succ_opt(),
            Granularity::Month => bucket.checked_add_months(Months::new(1)),
        }
    }

    /// Bucket starts covering `start..=end`, ascending
    pub fn buckets(self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let last = self.bucket(end);
        let mut buckets = Vec::new();
        let mut current = Some(self.bucket(start));
        while let Some(bucket) = current.filter(|b| *b <= last) {
            buckets.push(bucket);
            current = self.next(bucket);
        }
        buckets
    }
}

/// Inclusive range of dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimesheetError> {
        if start > end {
            return Err(TimesheetError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// From `date` to the last day of its month
    pub fn till_end_of_month(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: end_of_month(date),
        }
    }

    /// Whole months from the first of `start`'s month to the end of `end`'s
    pub fn months(start: NaiveDate, end: NaiveDate) -> Result<Self, TimesheetError> {
        let first = Granularity::Month.bucket(start);
        Self::new(first, end_of_month(end))
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(DateRange {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    Granularity::Month
        .bucket(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Folds classified time entries into one entry per calendar bucket
#[derive(Debug, Clone)]
pub struct CalendarAggregator {
    granularity: Granularity,
    range: DateRange,
    buckets: BTreeMap<NaiveDate, AggregatedEntry>,
}

impl CalendarAggregator {
    pub fn new(granularity: Granularity, range: DateRange) -> Self {
        CalendarAggregator {
            granularity,
            range,
            buckets: BTreeMap::new(),
        }
    }

    pub fn append(&mut self, entry: &ClassifiedTimeEntry) -> Result<(), TimesheetError> {
        let bucket = self.granularity.bucket(entry.date);
        self.merge_into(AggregatedEntry::from_classified(bucket, entry))
    }

    /// Re-bucket an already aggregated entry, e.g. days into months
    pub fn append_aggregated(&mut self, entry: &AggregatedEntry) -> Result<(), TimesheetError> {
        let mut rebucketed = entry.clone();
        rebucketed.bucket_date = self.granularity.bucket(entry.bucket_date);
        self.merge_into(rebucketed)
    }

    fn merge_into(&mut self, entry: AggregatedEntry) -> Result<(), TimesheetError> {
        log::debug!(
            "Aggregate {}: qualifying={} other={}",
            self.granularity.format(entry.bucket_date),
            entry.qualifying_hours,
            entry.other_hours
        );
        match self.buckets.get_mut(&entry.bucket_date) {
            Some(existing) => existing.merge(&entry),
            None => {
                self.buckets.insert(entry.bucket_date, entry);
                Ok(())
            }
        }
    }

    /// One entry for every bucket of the range, ascending. Buckets without
    /// input are zero with no notes. Entries outside the range are left out.
    pub fn flush(&self) -> Vec<AggregatedEntry> {
        self.granularity
            .buckets(self.range.start, self.range.end)
            .into_iter()
            .map(|bucket| {
                self.buckets
                    .get(&bucket)
                    .cloned()
                    .unwrap_or_else(|| AggregatedEntry::empty(bucket))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct TimeEntryRow {
    date: String,
    task: String,
    #[serde(default)]
    notes: String,
    hours: String,
}

/// Read time entries from CSV with a `date,task,notes,hours` header
pub fn read_time_entries_csv<R: Read>(reader: R) -> anyhow::Result<Vec<TimeEntry>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row: TimeEntryRow = record.deserialize(Some(&headers))?;
        let date = parse_date(&row.date).ok_or_else(|| TimesheetError::InvalidEntry {
            line,
            reason: format!("invalid date '{}'", row.date),
        })?;
        let hours = parse_decimal(&row.hours).ok_or_else(|| TimesheetError::InvalidEntry {
            line,
            reason: format!("invalid hours '{}'", row.hours),
        })?;
        entries.push(TimeEntry {
            date,
            task_label: row.task,
            notes: row.notes,
            hours,
        });
    }
    Ok(entries)
}
