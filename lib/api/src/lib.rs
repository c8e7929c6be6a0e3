//! # scapes API
//!
//! REST surface over a [`scapes_storage::StorageManager`]: item cards, rank
//! and date lookups, ranked holdings, sequence completion and layout planning.

pub mod rest;

pub use rest::RestApi;
