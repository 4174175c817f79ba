//! Read-only commands. Listener lines go to stderr so stdout stays machine-readable.

use std::io;

use crate::app::AppContext;
use crate::app::api;
use crate::app::cli::OutputFormat;
use crate::domain::AppError;

pub fn run_get(ctx: &AppContext, name: Option<&str>, format: OutputFormat) -> Result<(), AppError> {
    let values = api::get_config(ctx.registry(), name, &mut io::stderr())?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&values)
            .map_err(|e| AppError::State(format!("Failed to render JSON: {}", e)))?,
        OutputFormat::Yaml => serde_yaml::to_string(&values)
            .map_err(|e| AppError::State(format!("Failed to render YAML: {}", e)))?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

pub fn run_names(ctx: &AppContext, category: Option<&str>) -> Result<(), AppError> {
    let mut log = io::stderr();
    let names = match category {
        Some(category) => api::get_config_names_by_category(ctx.registry(), category, &mut log)?,
        None => api::get_config_names(ctx.registry(), &mut log)?,
    };
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

pub fn run_categories(ctx: &AppContext) -> Result<(), AppError> {
    for category in api::get_categories(ctx.registry(), &mut io::stderr())? {
        println!("{}", category);
    }
    Ok(())
}
