pub mod config;
pub mod job;
pub mod message;
pub mod report;
