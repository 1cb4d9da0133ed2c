pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod policy;
pub mod sequencing;
pub mod services;
pub mod state;
pub mod upload;

pub use api::router;
