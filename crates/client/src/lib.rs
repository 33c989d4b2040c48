//! Client code for the Lombasku offline worker.
//!
//! This crate provides the HTTP implementation of the worker's `Network`
//! seam and URL canonicalization for requests entering the worker.

pub mod fetch;

pub use fetch::{HttpNetwork, NetworkConfig, UrlError, canonicalize};
