pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod db;
pub mod services;
pub mod utils;
