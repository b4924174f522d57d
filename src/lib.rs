pub mod client;
pub mod config;
pub mod harvest;
pub mod model;
pub mod pacer;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export common types for convenience
pub use client::{HttpTransport, RegistryClient};
pub use config::{parse_from_date, HarvesterConfig, RegistryLayout};
pub use harvest::{EnvelopeStream, Harvester};
pub use model::*;
pub use traits::*;
