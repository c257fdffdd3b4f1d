pub mod analysis;
pub mod api;
pub mod app;
pub mod config;
pub mod conversation;
pub mod dashboard;
pub mod filters;
pub mod handler;
pub mod models;
pub mod session;
pub mod tui;
pub mod ui;
