//! SQLite persistence: a single worker thread owns the connection and
//! executes closures sent over a channel, which also gives every caller the
//! same write ordering the sampling loop relies on.

pub mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
