pub mod cli;
pub mod config;
pub mod core;
pub mod explorer;
pub mod export;
pub mod math;

pub use config::{AppConfig, NavigationConfig, PoolConfig};
pub use explorer::{Explorer, StepOutcome};
pub use export::{export_bmp, Exporter};
