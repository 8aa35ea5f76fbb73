pub mod context;
pub mod panels;

pub use context::AppContext;
