pub mod app;
pub mod config;
pub mod consolidate;
pub mod domain;
pub mod drift;
pub mod error;
pub mod gdc;
pub mod identity;
pub mod manifest;
pub mod mapping;
pub mod matrix;
pub mod output;
pub mod quant;
pub mod store;
