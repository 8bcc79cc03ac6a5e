pub mod cache;
pub mod config;
pub mod countries;
pub mod logging;
pub mod pagination;
pub mod server;
