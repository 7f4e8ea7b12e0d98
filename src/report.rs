// 🧾 Budget Report - pt-BR currency text for every total
//
// Output side of the calculator: the web page and the terminal UI both show
// the same labelled lines, formatted as "R$ 1.234,56".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount;
use crate::calculator::BudgetResult;

/// Format an amount as Brazilian reais: "R$ 1.234,56", "R$ -80,00"
pub fn format_brl(value: f64) -> String {
    let value = amount::sanitize(value);

    // Cents stay in f64 so magnitudes past i64 are printed digit for digit
    let cents = (value * 100.0).round();
    let (negative, digits) = if cents.is_finite() {
        (cents < 0.0, format!("{:03.0}", cents.abs()))
    } else {
        (value < 0.0, format!("{:.0}00", value.abs()))
    };

    let (units, fraction) = digits.split_at(digits.len() - 2);
    let sign = if negative { "-" } else { "" };

    format!("R$ {}{},{}", sign, group_thousands(units), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }

    out
}

/// One labelled total, e.g. "Receita Total Mensal: R$ 3.050,00"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub label: String,
    pub amount: f64,
    pub text: String,
}

impl ReportLine {
    fn new(label: &str, amount: f64) -> Self {
        ReportLine {
            label: label.to_string(),
            amount,
            text: format!("{}: {}", label, format_brl(amount)),
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Every total the UI displays, already formatted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub income: ReportLine,
    pub fixed_current: ReportLine,
    pub fixed_new: ReportLine,
    pub personal: ReportLine,
    pub food: ReportLine,
    pub balance_current: ReportLine,
    pub balance_new: ReportLine,
}

impl BudgetReport {
    pub fn from_result(result: &BudgetResult) -> Self {
        BudgetReport {
            income: ReportLine::new("Receita Total Mensal", result.income_total),
            fixed_current: ReportLine::new("Contas Fixas (atual)", result.fixed_total_current),
            fixed_new: ReportLine::new("Contas Fixas (novo)", result.fixed_total_new),
            personal: ReportLine::new("Contas Pessoais (mensal)", result.personal_total),
            food: ReportLine::new("Alimentação e Transporte", result.food_total),
            balance_current: ReportLine::new("SALDO FINAL (Atual)", result.balance_current),
            balance_new: ReportLine::new("SALDO FINAL (Novo)", result.balance_new),
        }
    }

    /// Section totals followed by both balances, in page order
    pub fn lines(&self) -> Vec<&ReportLine> {
        vec![
            &self.income,
            &self.fixed_current,
            &self.fixed_new,
            &self.personal,
            &self.food,
            &self.balance_current,
            &self.balance_new,
        ]
    }
}

impl fmt::Display for BudgetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
