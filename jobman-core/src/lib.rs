//! Jobman Core
//!
//! Core types for the job-management client.
//!
//! This crate contains:
//! - Domain types: jobs, statuses, findings and the target service
//! - DTOs: request and response bodies of the job-management API

pub mod domain;
pub mod dto;
