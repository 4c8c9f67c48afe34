pub mod api;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod colors;
pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod types;
