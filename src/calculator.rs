// 🧮 Budget Calculator - Form snapshot → totals, balances, chart series
//
// Pure function of a full snapshot. Nothing is cached between calls: every
// "calculate" re-derives everything from the current form values.
//
// Internet rule:
// - internet_received is INCOME (what housemates pay back)
// - internet_cost is a FULL fixed EXPENSE
// - The two are never netted against each other, so the reimbursement is
//   counted exactly once

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::amount;
use crate::error::AppResult;

// ============================================================================
// INPUTS
// ============================================================================

/// Snapshot of every form value at the moment "calculate" is pressed
///
/// Deserialization is lenient: missing, null, or unparseable fields read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetInputs {
    // Income
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub salary: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub bolsa_familia: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub internet_received: f64,

    // Fixed bills
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub rent_current: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub rent_new: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub internet_cost: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub electricity: f64,

    /// One monthly payment per live person entry
    #[serde(default, deserialize_with = "amount::deserialize_seq")]
    pub personal_payments: Vec<f64>,

    // Food and transport
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub groceries: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub delivery: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub mobility: f64,
}

impl BudgetInputs {
    /// Read a saved form snapshot (JSON object, same keys as the web form)
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

// ============================================================================
// CHART SERIES
// ============================================================================

pub const PIE_TITLE: &str = "Distribuição das Despesas (Cenário Atual)";
pub const BAR_TITLE: &str = "Receita x Despesas x Saldo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Fixed,
    Personal,
    FoodTransport,
}

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Fixed => "Fixas",
            ExpenseCategory::Personal => "Pessoais",
            ExpenseCategory::FoodTransport => "Ali./Transp.",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ExpenseCategory::Fixed => "#00c49f",
            ExpenseCategory::Personal => "#ffbb28",
            ExpenseCategory::FoodTransport => "#0088fe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    /// Rent as it is today
    Current,
    /// Rent after the planned move
    New,
}

impl Scenario {
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Current => "Atual",
            Scenario::New => "Novo",
        }
    }
}

/// The three bars drawn for each scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarMeasure {
    Income,
    Expenses,
    Balance,
}

impl BarMeasure {
    pub const ALL: [BarMeasure; 3] = [BarMeasure::Income, BarMeasure::Expenses, BarMeasure::Balance];

    pub fn label(&self) -> &'static str {
        match self {
            BarMeasure::Income => "Receita",
            BarMeasure::Expenses => "Despesas",
            BarMeasure::Balance => "Saldo",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BarMeasure::Income => "#00c49f",
            BarMeasure::Expenses => "#ffbb28",
            BarMeasure::Balance => "#0088fe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub category: ExpenseCategory,
    pub label: String,
    pub color: String,
    pub value: f64,
}

impl PieSlice {
    fn new(category: ExpenseCategory, value: f64) -> Self {
        PieSlice {
            category,
            label: category.label().to_string(),
            color: category.color().to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarGroup {
    pub scenario: Scenario,
    pub label: String,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

impl BarGroup {
    fn new(scenario: Scenario, income: f64, expenses: f64, balance: f64) -> Self {
        BarGroup {
            scenario,
            label: scenario.label().to_string(),
            income,
            expenses,
            balance,
        }
    }

    pub fn value(&self, measure: BarMeasure) -> f64 {
        match measure {
            BarMeasure::Income => self.income,
            BarMeasure::Expenses => self.expenses,
            BarMeasure::Balance => self.balance,
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetResult {
    pub income_total: f64,
    pub fixed_total_current: f64,
    pub fixed_total_new: f64,
    pub personal_total: f64,
    pub food_total: f64,
    pub expenses_current: f64,
    pub expenses_new: f64,
    pub balance_current: f64,
    pub balance_new: f64,

    /// Current-scenario expense distribution
    pub pie_series: Vec<PieSlice>,

    /// Current and New, in that order
    pub bar_series: Vec<BarGroup>,
}

impl BudgetResult {
    pub fn expenses(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Current => self.expenses_current,
            Scenario::New => self.expenses_new,
        }
    }

    pub fn balance(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Current => self.balance_current,
            Scenario::New => self.balance_new,
        }
    }
}

// ============================================================================
// COMPUTE
// ============================================================================

/// Fold a form snapshot into totals, balances and chart series
pub fn compute(inputs: &BudgetInputs) -> BudgetResult {
    let v = amount::sanitize;

    let income_total = v(inputs.salary) + v(inputs.bolsa_familia) + v(inputs.internet_received);

    // Only rent differs between the two scenarios
    let shared_fixed = v(inputs.internet_cost) + v(inputs.electricity);
    let fixed_total_current = v(inputs.rent_current) + shared_fixed;
    let fixed_total_new = v(inputs.rent_new) + shared_fixed;

    let personal_total: f64 = inputs.personal_payments.iter().map(|&p| v(p)).sum();

    let food_total = v(inputs.groceries) + v(inputs.delivery) + v(inputs.mobility);

    let expenses_current = fixed_total_current + personal_total + food_total;
    let expenses_new = fixed_total_new + personal_total + food_total;

    let balance_current = income_total - expenses_current;
    let balance_new = income_total - expenses_new;

    let pie_series = vec![
        PieSlice::new(ExpenseCategory::Fixed, fixed_total_current),
        PieSlice::new(ExpenseCategory::Personal, personal_total),
        PieSlice::new(ExpenseCategory::FoodTransport, food_total),
    ];

    let bar_series = vec![
        BarGroup::new(Scenario::Current, income_total, expenses_current, balance_current),
        BarGroup::new(Scenario::New, income_total, expenses_new, balance_new),
    ];

    tracing::trace!(income_total, expenses_current, expenses_new, "budget computed");

    BudgetResult {
        income_total,
        fixed_total_current,
        fixed_total_new,
        personal_total,
        food_total,
        expenses_current,
        expenses_new,
        balance_current,
        balance_new,
        pie_series,
        bar_series,
    }
}
