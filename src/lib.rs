pub mod api;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod model;
pub mod session;
