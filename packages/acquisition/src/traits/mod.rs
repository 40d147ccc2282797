//! Core trait abstractions.
//!
//! Every external collaborator sits behind a trait so the pipeline can be
//! exercised without a live connection: the search provider, the fetch
//! strategies, and the extraction model.

pub mod model;
pub mod searcher;
pub mod strategy;
