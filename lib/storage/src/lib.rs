//! # scapes Storage
//!
//! Loads the catalogue and the similarity table from a data directory and
//! holds them as the shared in-memory snapshot.

pub mod loader;
pub mod matrix;
pub mod manager;

pub use loader::{load_catalogue, parse_catalogue};
pub use matrix::{load_similarity, write_npy};
pub use manager::{StorageConfig, StorageManager};
