//! SmartSpace core library
//!
//! Profile-scoped persistence, authentication and the device and routine
//! registries behind the SmartSpace dashboard.

pub mod app;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod notify;
pub mod registry;
pub mod server;
pub mod session;
pub mod storage;
pub mod utils;
pub mod workers;
