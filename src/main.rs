// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use monthly_budget::{compute, format_brl, BudgetInputs, BudgetReport, PIE_TITLE};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "compute" {
        // One-shot mode
        let Some(path) = args.get(2) else {
            eprintln!("Usage: monthly-budget compute <inputs.json> [--json]");
            std::process::exit(2);
        };
        let as_json = args.iter().skip(3).any(|a| a == "--json");
        run_compute(Path::new(path), as_json)?;
    } else {
        // UI mode (default)
        run_ui_mode()?;
    }

    Ok(())
}

fn run_compute(path: &Path, as_json: bool) -> Result<()> {
    let inputs = BudgetInputs::from_file(path)
        .with_context(|| format!("Loading inputs file: {}", path.display()))?;

    let result = compute(&inputs);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("📊 Monthly Budget v{}", monthly_budget::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print!("{}", BudgetReport::from_result(&result));

    println!("\n{}", PIE_TITLE);
    for slice in &result.pie_series {
        println!("  {:<13} {}", slice.label, format_brl(slice.value));
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    let mut app = ui::App::new();
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin budget-server --features server");
    std::process::exit(1);
}
