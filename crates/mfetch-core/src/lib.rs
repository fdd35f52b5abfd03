pub mod config;
pub mod error;
pub mod logging;

pub mod classify;
pub mod extractor;
pub mod fetcher;
pub mod http;
pub mod model;
pub mod platform;
pub mod quota;
pub mod scheduler;
pub mod url_model;
