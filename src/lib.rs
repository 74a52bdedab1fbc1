pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod session;
pub mod srs;
pub mod state;
pub mod store;
pub mod study;
pub mod tracker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
