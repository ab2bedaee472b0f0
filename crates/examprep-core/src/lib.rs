//! examprep-core: Question bank model, quiz session engine, and scoring.
//!
//! This crate defines the question repository types, the session engine that
//! drives one exam attempt, and the pure scoring functions over its result.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scoring;
pub mod traits;
