// Library for tests to access modules

pub mod aggregator;
pub mod auth;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod scraper;
pub mod service;
pub mod sysinfo_repo;
pub mod version;
