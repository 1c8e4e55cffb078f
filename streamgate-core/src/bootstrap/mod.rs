//! Startup wiring for the streamgate server
//!
//! - Configuration loading
//! - Database pool initialization
//! - Store selection and service construction

pub mod config;
pub mod database;
pub mod services;

pub use config::load_config;
pub use database::init_database;
pub use services::{init_services, Services};
