//! Harvest module - the crate listing and summary pipelines.
//!
//! This module provides the stages the [`Harvester`] composes:
//! - **Walker**: lazy listing pagination via [`ListingWalker`]
//! - **Enricher**: detail and owner merging via [`Enricher`]
//! - **Filter**: client-side `from_date` checkpoint via [`keep`]
//! - **Pipeline**: category dispatch and envelopes via [`Harvester`]

pub mod enricher;
pub mod filter;
pub mod pipeline;
pub mod walker;

// Re-export commonly used types
pub use enricher::Enricher;
pub use filter::keep;
pub use pipeline::{EnvelopeStream, Harvester, BACKEND_NAME};
pub use walker::ListingWalker;
