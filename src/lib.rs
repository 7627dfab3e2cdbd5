//! # Pet Map
//!
//! Client core for the lost-and-found pet map: configuration, durable token
//! storage, the marker gateway and the map screen state. Session handling and
//! account endpoints live in the `petmap-auth` crate.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;

pub use app::PetMapApp;
pub use config::AppConfig;
pub use error::AppError;
