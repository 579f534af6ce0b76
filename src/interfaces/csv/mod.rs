pub mod action_reader;
pub mod request_writer;
