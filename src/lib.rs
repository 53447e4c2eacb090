//! Terminal cable map with a world view and a country focus view

pub mod app;
pub mod boundary;
pub mod cables;
pub mod coastline;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod fetch;
pub mod footer;
pub mod geo;
pub mod help;
pub mod logging;
pub mod markers;
pub mod render;
pub mod session;
pub mod settings;
pub mod store;
pub mod surface;
pub mod terminal;
pub mod view_mode;

pub use error::{Error, Result};
pub use view_mode::ViewMode;
