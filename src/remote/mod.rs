// Remote layer - HTTP access to the ledger service

mod client;
pub mod envelope;
mod error;

pub use client::*;
pub use error::*;
