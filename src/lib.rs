pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod forms;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod templates;

pub use app::{router, AppState};
