pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod cursor;
pub mod models;
pub mod objects;
pub mod palette;
pub mod redirect;
pub mod render;
pub mod service;
pub mod storage;
pub mod style;
