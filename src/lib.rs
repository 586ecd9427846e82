pub mod cli;
pub mod config;
pub mod generator;
pub mod history;
pub mod i18n;
pub mod llm;
pub mod loader;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::state::{AnalysisOptions, AnalysisState};
pub use generator::workflow::Workflow;
