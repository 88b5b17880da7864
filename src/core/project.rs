use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Source of time entries for a project and the task types that qualify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimesheetSelector {
    /// Report name, read from `<reports>/<YYYY>/<MM>/<code>.csv`
    pub code: String,
    /// Task labels counted as qualifying work
    pub types: Vec<String>,
}

impl TimesheetSelector {
    pub fn is_qualifying(&self, task_label: &str) -> bool {
        self.types.iter().any(|t| t == task_label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectResult {
    pub name: String,
    #[schemars(with = "String")]
    pub start_date: NaiveDate,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub end_date: Option<NaiveDate>,
}

/// A qualifying intellectual property project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schemars(with = "String")]
    pub start_date: NaiveDate,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub employee: String,
    #[serde(default)]
    pub interpretation_number: String,
    #[serde(default)]
    pub results: Vec<ProjectResult>,
    #[serde(default)]
    pub timesheet: Vec<TimesheetSelector>,
}

impl Project {
    /// Started on or before the given month (December when none given)
    pub fn has_started(&self, year: i32, month: Option<u32>) -> bool {
        month_start(self.start_date) <= first_of(year, month.unwrap_or(12))
    }

    /// Ended before the given month (January when none given)
    pub fn has_finished(&self, year: i32, month: Option<u32>) -> bool {
        self.end_date
            .is_some_and(|end| month_start(end) < first_of(year, month.unwrap_or(1)))
    }

    pub fn is_active(&self, year: i32, month: Option<u32>) -> bool {
        self.has_started(year, month) && !self.has_finished(year, month)
    }
}

/// Projects active in the period, in configuration order
pub fn active_projects(projects: &[Project], year: i32, month: Option<u32>) -> Vec<&Project> {
    projects.iter().filter(|p| p.is_active(year, month)).collect()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}
