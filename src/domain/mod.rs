//! Domain model and the approval workflow engine.

pub mod approval;
pub mod leave;
pub mod ports;
pub mod session;
pub mod user;
pub mod workflow;
