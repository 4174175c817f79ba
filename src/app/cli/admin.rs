//! Administrative commands: apply, validate, interval.

use std::fs;
use std::path::Path;

use crate::app::AppContext;
use crate::app::api::{self, ConfigBatch};
use crate::domain::AppError;

fn read_batch(file: &Path) -> Result<ConfigBatch, AppError> {
    let content = fs::read_to_string(file)?;
    ConfigBatch::from_yaml(&content)
}

pub fn run_apply(ctx: &AppContext, file: &Path) -> Result<(), AppError> {
    let batch = read_batch(file)?;
    let outcome = api::submit(ctx.registry(), batch)?;

    for warning in &outcome.warnings {
        println!("⚠️  {}", warning);
    }
    println!("✅ Applied {} config(s)", outcome.entries);
    Ok(())
}

pub fn run_validate(file: &Path) -> Result<(), AppError> {
    let batch = read_batch(file)?;
    let warnings = api::validate_batch(&batch)?;

    for warning in &warnings {
        println!("⚠️  {}", warning);
    }
    println!("✅ {} config(s) are valid", batch.configs.len());
    Ok(())
}

pub fn run_interval(ctx: &AppContext, minutes: i64) -> Result<(), AppError> {
    ctx.registry().set_refresh_interval(minutes)?;
    if minutes > 0 {
        println!("✅ Refresh interval set to {} minute(s)", minutes);
    } else {
        println!("✅ Scheduled refresh disabled");
    }
    Ok(())
}
