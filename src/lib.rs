// Library crate: main.rs and the integration tests both use these modules.

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod gate;
pub mod host;
pub mod params;
pub mod settings;
pub mod step;
