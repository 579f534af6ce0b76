//! Application layer orchestrating the workflow engine over the ports.
//!
//! `LeaveEngine` is the single entry point for submissions, approvals and HR
//! overrides. It threads an explicit `Session` through every call and
//! serializes mutations with an async lock.

pub mod engine;
pub mod stats;
