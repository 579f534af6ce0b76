//! CSV adapters for the command-line interface.

pub mod csv;
