mod filter;
mod loader;

pub use filter::NameFilter;
pub use loader::{Config, ReportConfig};
