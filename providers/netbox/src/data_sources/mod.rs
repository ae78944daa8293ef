//! Data source types

pub mod services;

pub use services::ServicesDataSource;
