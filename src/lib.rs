//! Nightly persona simulation harness
//!
//! Probes every persona against every model tier with a fixed battery of
//! questions, scores the answers with lexical safety checks and emits a JSON
//! report plus a CI-friendly exit code.

pub mod backend;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod persona;
pub mod queries;
pub mod report;
pub mod results;
pub mod tiers;
pub mod trial;
pub mod version;

pub use error::{Error, ErrorCode, Result};
