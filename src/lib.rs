pub mod api;
pub mod app;
pub mod config;
pub mod csv;
pub mod detail;
pub mod domain;
pub mod error;
pub mod output;
pub mod postgrest;
pub mod providers;
pub mod selection;
pub mod server;
pub mod store;
pub mod table;
pub mod tui;
