//! Yearly apportionment of qualifying records across projects and the
//! resulting qualified income per project.

use super::classification::Category;
use super::income::{IncomeError, IncomeRegistry};
use super::record::ClassifiedRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const NEXUS_UPLIFT: Decimal = dec!(1.3);
const PREFERENTIAL_RATE: Decimal = dec!(0.05);

/// One qualifying record attributed to one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApportionedEntry {
    pub date: NaiveDate,
    pub invoice_number: String,
    pub number: u32,
    pub description: String,
    pub project_id: String,
    pub ratio: Decimal,
    pub qualifying_income: Decimal,
    pub other_income: Decimal,
    /// Apportioned costs in category order A, B, C, D
    pub costs: [Decimal; 4],
    pub original_income: Option<Decimal>,
    pub original_cost: Option<Decimal>,
    pub qualifying_hours: Option<Decimal>,
    pub other_hours: Option<Decimal>,
    pub wage: Option<Decimal>,
}

impl ApportionedEntry {
    pub fn cost(&self, category: Category) -> Decimal {
        self.costs[category_index(category)]
    }

    pub fn total_costs(&self) -> Decimal {
        self.costs.iter().sum()
    }
}

/// Qualified income of one project for the year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectResult {
    pub project_id: String,
    pub qualifying_income: Decimal,
    pub direct_costs: Decimal,
    pub indirect_costs: Decimal,
    pub nexus_raw: Decimal,
    pub nexus: Decimal,
    pub qualified_income: Decimal,
    pub remaining_income: Decimal,
    pub preferential_tax: Decimal,
}

impl ProjectResult {
    pub fn costs(&self) -> Decimal {
        self.direct_costs + self.indirect_costs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub total_income: Decimal,
    pub total_costs: Decimal,
    pub entries: Vec<ApportionedEntry>,
    pub projects: Vec<ProjectResult>,
}

impl YearSummary {
    /// Apportion qualifying records and compute per-project results.
    ///
    /// `project_ids` fixes the order of the results.
    pub fn build(
        year: i32,
        records: &[ClassifiedRecord],
        registry: &IncomeRegistry,
        project_ids: &[String],
    ) -> Result<Self, IncomeError> {
        let mut total_income = Decimal::ZERO;
        let mut total_costs = Decimal::ZERO;
        for classified in records {
            let record = &classified.record;
            if record.is_income() {
                total_income += record.total_income;
            } else if record.is_cost() {
                total_costs += record.total_cost;
            } else {
                log::warn!(
                    "Record {} ({}) is neither income nor cost, skipping",
                    record.number,
                    record.date
                );
            }
        }

        let entries = records
            .iter()
            .filter(|r| r.is_qualifying())
            .flat_map(|r| r.project_ids.iter().map(move |id| (r, id)))
            .map(|(r, id)| apportion(r, id, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let all_direct_costs: Decimal = entries.iter().map(ApportionedEntry::total_costs).sum();
        let projects = project_ids
            .iter()
            .map(|id| {
                let project_entries: Vec<_> =
                    entries.iter().filter(|e| &e.project_id == id).collect();
                project_result(id, &project_entries, total_income, total_costs, all_direct_costs)
            })
            .collect();

        Ok(YearSummary {
            year,
            total_income,
            total_costs,
            entries,
            projects,
        })
    }
}

fn apportion(
    classified: &ClassifiedRecord,
    project_id: &str,
    registry: &IncomeRegistry,
) -> Result<ApportionedEntry, IncomeError> {
    let record = &classified.record;
    let (year, month) = (record.year(), record.month());
    let ratio = registry.get_income_ratio(year, month, project_id)?;

    let mut entry = ApportionedEntry {
        date: record.date,
        invoice_number: record.invoice_number.clone(),
        number: record.number,
        description: record.description.clone(),
        project_id: project_id.to_string(),
        ratio,
        qualifying_income: Decimal::ZERO,
        other_income: Decimal::ZERO,
        costs: Category::ALL.map(|c| ratio * classified.cost(c)),
        original_income: None,
        original_cost: None,
        qualifying_hours: None,
        other_hours: None,
        wage: None,
    };

    if record.is_income() {
        let income = registry.project_income(year, month, project_id)?;
        entry.qualifying_income = income.qualifying_income();
        entry.other_income = income.other_income();
        entry.original_income = Some(record.total_income);
        entry.qualifying_hours = Some(income.qualifying_hours);
        entry.other_hours = Some(income.other_hours);
        entry.wage = Some(income.wage);
    } else {
        entry.original_cost = Some(record.total_cost);
    }
    Ok(entry)
}

fn project_result(
    project_id: &str,
    entries: &[&ApportionedEntry],
    total_income: Decimal,
    total_costs: Decimal,
    all_direct_costs: Decimal,
) -> ProjectResult {
    let qualifying_income: Decimal = entries.iter().map(|e| e.qualifying_income).sum();
    let category_costs = |c: Category| -> Decimal { entries.iter().map(|e| e.cost(c)).sum() };
    let abc = category_costs(Category::A) + category_costs(Category::B) + category_costs(Category::C);
    let direct_costs = abc + category_costs(Category::D);

    let indirect_costs = qualifying_income
        .checked_div(total_income)
        .map(|share| share * (total_costs - all_direct_costs))
        .unwrap_or(Decimal::ZERO);

    let nexus_raw = (NEXUS_UPLIFT * abc)
        .checked_div(direct_costs)
        .unwrap_or(Decimal::ONE);
    let nexus = nexus_raw.min(Decimal::ONE);

    let income = qualifying_income - direct_costs - indirect_costs;
    let qualified_income = income * nexus;

    ProjectResult {
        project_id: project_id.to_string(),
        qualifying_income,
        direct_costs,
        indirect_costs,
        nexus_raw,
        nexus,
        qualified_income,
        remaining_income: income * (Decimal::ONE - nexus),
        preferential_tax: qualified_income * PREFERENTIAL_RATE,
    }
}

fn category_index(category: Category) -> usize {
    match category {
        Category::A => 0,
        Category::B => 1,
        Category::C => 2,
        Category::D => 3,
    }
}
