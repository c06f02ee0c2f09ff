pub mod aggregation;
pub mod config;
pub mod consensus;
pub mod currency;
pub mod db;
pub mod error;
pub mod export;
pub mod frame;
pub mod observations;
pub mod outlier_filter;
pub mod pipeline;
pub mod types;
