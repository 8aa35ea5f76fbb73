pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod tests;

// Main exports for external use
pub use application::AppContext;
pub use config::AppConfig;
