//! Data Transfer Objects for the job-management API
//!
//! Request and response bodies exactly as they travel over the wire. Field
//! aliases absorb the naming differences between endpoints.

pub mod job;
