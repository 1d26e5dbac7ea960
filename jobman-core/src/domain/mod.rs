//! Core domain types
//!
//! This module contains the structures the job-management API speaks in.
//! They are shared between the HTTP client (which deserializes them) and the
//! CLI (which renders them).

pub mod finding;
pub mod job;
pub mod service;
