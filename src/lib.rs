pub mod application;
pub mod cli;
pub mod domain;
pub mod remote;

pub use application::{LedgerProbe, ProbeConfig, ProbeError, ProbeReport};
pub use domain::*;
