// Application layer - configuration, the probe pipeline and its report.
// The CLI is one client of this layer; tests drive it directly.

pub mod config;
pub mod error;
pub mod probe;
pub mod report;

pub use config::*;
pub use error::*;
pub use probe::*;
pub use report::*;
