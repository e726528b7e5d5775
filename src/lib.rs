pub mod aggregate;
pub mod api;
pub mod charts;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod views;
