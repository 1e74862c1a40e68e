pub mod analytics;
pub mod config;
pub mod models;
pub mod recorder;
pub mod report;
pub mod storage;
