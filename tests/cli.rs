//! E2E tests for the records, timesheet, summary and schema commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::process::{Command, Output};
use std::str::FromStr;

fn ipbox(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ipbox"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

const CONFIG: &str = "tests/data/config.json";
const RECORDS: &str = "tests/data/records.csv";
const REPORTS: &str = "tests/data/reports";

#[test]
fn records_table() {
    let output = ipbox(&["records", "-c", CONFIG, "-r", RECORDS]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("KPWI-1"));
    assert!(stdout.contains("R&D services for route planner"));
    assert!(stdout.contains("Office rent January"));
}

#[test]
fn records_csv_appends_projects_and_category() {
    let output = ipbox(&["records", "-c", CONFIG, "-r", RECORDS, "--csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    let lines: Vec<_> = stdout.lines().collect();
    assert!(lines[0].starts_with("number,date,invoice_number"));
    assert!(lines[0].ends_with("remarks,projects,category"));
    assert_eq!(lines.len(), 7);

    // cost matching a rule carries its category
    assert!(lines[2].starts_with("2,2024-01-15"));
    assert!(lines[2].ends_with(",KPWI-1,A"));
    // comma decimal in the ledger
    assert!(lines[4].contains(",300.50,"));
    assert!(lines[4].ends_with(",KPWI-1,D"));
    // unmatched cost
    assert!(lines[3].ends_with(",,"));
    // income before the project started
    assert!(lines[6].starts_with("6,2023-12-31"));
    assert!(lines[6].ends_with(",,"));
}

#[test]
fn records_json_filtered_by_year() {
    let output = ipbox(&[
        "records", "-c", CONFIG, "-r", RECORDS, "--year", "2024", "--qualifying", "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let records: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r["projects"] == serde_json::json!(["KPWI-1"])));
    assert_eq!(records[0]["number"], 1);
    assert!(records[0].get("category").is_none());
    assert_eq!(records[1]["category"], "A");
}

#[test]
fn timesheet_monthly_csv() {
    let output = ipbox(&[
        "timesheet", "-c", CONFIG, "-t", REPORTS, "-p", "KPWI-1", "--from", "2024-01", "--to",
        "2024-02", "-g", "month", "--csv",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "date,qualifying_hours,other_hours,total_hours,notes");
    assert!(lines[1].starts_with("2024-01,13.5,2,15.5,"));
    assert!(lines[1].contains("Graph search"));
    assert!(lines[1].contains("Route planner core"));
    assert_eq!(lines[2], "2024-02,8,2,10,Map import");
}

#[test]
fn timesheet_daily_fills_gaps() {
    let output = ipbox(&[
        "timesheet", "-c", CONFIG, "-t", REPORTS, "-p", "KPWI-1", "--from", "2024-01", "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let days: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[0]["date"], "2024-01-01");
    assert_eq!(days[0]["total_hours"], "0");
    assert_eq!(days[1]["qualifying_hours"], "6");
    assert_eq!(days[1]["other_hours"], "2");
    assert_eq!(days[2]["qualifying_hours"], "7.5");
}

#[test]
fn timesheet_detailed_entries() {
    let output = ipbox(&[
        "timesheet", "-c", CONFIG, "-t", REPORTS, "-p", "KPWI-1", "--from", "2024-02",
        "--detailed", "--csv",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("2024-02-05,Development,Map import,8,true"));
    assert!(stdout.contains("2024-02-06,Support,Customer call,2,false"));
}

#[test]
fn timesheet_unknown_project_fails() {
    let output = ipbox(&[
        "timesheet", "-c", CONFIG, "-t", REPORTS, "-p", "NOPE", "--from", "2024-01",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown project"));
}

#[test]
fn summary_json() {
    let output = ipbox(&[
        "summary", "-c", CONFIG, "-r", RECORDS, "-t", REPORTS, "-y", "2024", "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["year"], 2024);
    assert_eq!(decimal(&summary["total_income"]), dec!(28000));
    assert_eq!(decimal(&summary["total_costs"]), dec!(3300.50));
    assert_eq!(summary["entries"].as_array().unwrap().len(), 4);

    // 13.5h at 80 out of 16000
    let january_income = &summary["entries"][0];
    assert_eq!(january_income["number"], 1);
    assert_eq!(decimal(&january_income["ratio"]), dec!(0.0675));
    assert_eq!(decimal(&january_income["qualifying_income"]), dec!(1080));

    let projects = summary["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["project_id"], "KPWI-1");
    assert_eq!(decimal(&projects[0]["qualifying_income"]), dec!(1720));
}

#[test]
fn summary_text() {
    let output = ipbox(&["summary", "-c", CONFIG, "-r", RECORDS, "-t", REPORTS, "-y", "2024"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("IP BOX SUMMARY (2024)"));
    assert!(stdout.contains("PROJECT KPWI-1"));
    assert!(stdout.contains("Nexus"));
}

#[test]
fn schema_formats() {
    let output = ipbox(&["schema"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let schema: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(schema["properties"]["projects"].is_object());

    let output = ipbox(&["schema", "timesheet-header"]);
    assert_eq!(stdout(&output).trim(), "date,task,notes,hours");

    let output = ipbox(&["schema", "records-fields"]);
    assert!(stdout(&output).contains("research_costs"));
}
