//! Thin async client for the Grafeas v1alpha1 API.
//!
//! Covers exactly the RPC boundary the translator feeds: creating and
//! fetching notes, occurrences, and operations. Each call is one
//! request/response pair; failures are propagated as [`error::TransportError`]
//! without retry.

pub mod client;
pub mod error;
pub mod models;

pub use client::GrafeasClient;
pub use error::TransportError;
