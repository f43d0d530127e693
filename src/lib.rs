pub mod api;
pub mod clients;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod processor;
pub mod routing;
pub mod utils;
pub mod worker;
