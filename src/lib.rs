// Monthly Budget - Core Library
// Exposes all modules for use in the terminal UI, the web server, and tests

pub mod amount;
pub mod calculator;
pub mod config;
pub mod error;
pub mod person;
pub mod report;
pub mod session;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use calculator::{
    compute, BarGroup, BarMeasure, BudgetInputs, BudgetResult, ExpenseCategory, PieSlice,
    Scenario, BAR_TITLE, PIE_TITLE,
};
pub use config::ServerConfig;
pub use error::{AppResult, BudgetError};
pub use person::{PersonEntry, PersonField, PersonId, PersonRegistry};
pub use report::{format_brl, BudgetReport, ReportLine};
pub use session::{Session, SessionId, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
