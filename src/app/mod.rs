pub mod api;
pub mod cli;
pub mod config;
mod context;
mod refresh;
mod registry;
mod scheduler;

pub use context::AppContext;
pub use refresh::{RefreshFailure, RefreshReport};
pub use registry::ConfigRegistry;
pub use scheduler::{RefreshScheduler, SchedulerOptions};
