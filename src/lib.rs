pub mod apis;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;
