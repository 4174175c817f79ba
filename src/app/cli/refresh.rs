//! Remote commands: refresh, check, watch.

use crate::app::api;
use crate::app::{AppContext, RefreshScheduler, SchedulerOptions};
use crate::domain::{AppError, RemoteSource};

pub fn run_refresh(ctx: &AppContext, name: Option<&str>) -> Result<i32, AppError> {
    if let Some(name) = name {
        let changed = ctx.registry().refresh_entry(name, ctx.repository(), ctx.credentials())?;
        if changed {
            println!("✅ Refreshed {}", name);
        } else {
            println!("✅ {} is inline; nothing to refresh", name);
        }
        return Ok(0);
    }

    let report = ctx.registry().refresh_all(ctx.repository(), ctx.credentials())?;
    println!(
        "Refreshed {} config(s), skipped {} inline config(s) in {} ms",
        report.refreshed.len(),
        report.skipped.len(),
        report.duration.as_millis()
    );
    for failure in &report.failures {
        println!("❌ {}: {}", failure.entry, failure.error);
    }
    if let Some(err) = &report.persist_error {
        println!("❌ Failed to save refreshed state: {}", err);
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}

pub fn run_check(ctx: &AppContext, source: RemoteSource) -> Result<i32, AppError> {
    let report = api::check_remote(ctx, &source)?;

    println!("Fetched {} byte(s) from {}", report.text.len(), source.request());
    match report.check {
        Ok(check) => {
            println!("✅ {}", check.message());
            Ok(0)
        }
        Err(err) => {
            println!("❌ {}", err);
            Ok(1)
        }
    }
}

pub fn run_watch(ctx: &AppContext, now: bool) -> Result<(), AppError> {
    let options = SchedulerOptions { run_on_start: now, ..SchedulerOptions::default() };
    let scheduler = RefreshScheduler::spawn(ctx.clone(), options)?;
    println!(
        "Watching {} config(s); refresh interval {} minute(s)",
        ctx.registry().len(),
        ctx.registry().refresh_interval_minutes()
    );
    scheduler.join();
    Ok(())
}
