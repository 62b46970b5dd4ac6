pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
