//! Core use-case services.
//!
//! # Responsibility
//! - Expose the records operations consumed by presentation and import
//!   layers.
//! - Keep callers decoupled from storage details and SQL errors.

pub mod records_service;
