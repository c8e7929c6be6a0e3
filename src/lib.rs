//! # scapes
//!
//! Metadata service for a fixed catalogue of collectible scapes.
//!
//! scapes does two things with the catalogue:
//! - **Rarity**: scores every trait value by how rarely it occurs and ranks
//!   items by the sum of their trait scores
//! - **Completion**: fills the `?` positions of a sequence like `1 ? ? 42h`
//!   with items whose edges line up with their neighbors
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! scapes --data-dir ./data --http-port 8080
//! ```
//!
//! The data directory holds `data.json` (the catalogue) and
//! `similarity.npy` (the `N x N x 3` edge table).
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use scapes::prelude::*;
//!
//! let storage = StorageManager::open(StorageConfig::new("./data")).unwrap();
//! let rarest = storage.catalogue().by_rank(0).unwrap().id;
//!
//! let tokens = parse_tokens(["1", "?", "?", "42h"]).unwrap();
//! let resolved = storage.complete(&tokens).unwrap();
//! let plan = Layout::Merge.plan(&resolved).unwrap();
//! ```
//!
//! ## Crate Structure
//!
//! - `scapes-core` - Catalogue model, rarity engine, similarity table, completion engine, layouts
//! - `scapes-storage` - Data directory loading (catalogue JSON, `.npy` similarity table)
//! - `scapes-api` - REST API

// Re-export core types
pub use scapes_core::{
    Attribute, AttributeValue, Catalogue, Item, ItemId, Highlight,
    TraitRarityTable, compute_rarity,
    SimilarityMatrix, Relation, Orientation,
    Token, ItemRef, parse_tokens,
    Completer, CompletionConfig, ExhaustionFallback, Placement, ResolvedSequence, complete,
    Layout, CompositionPlan, TilePlacement,
    Error, Result,
};

// Re-export storage
pub use scapes_storage::{StorageConfig, StorageManager};

// Re-export API
pub use scapes_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attribute, Catalogue, Item, ItemId,
        SimilarityMatrix, Relation,
        Token, parse_tokens,
        Completer, CompletionConfig, Placement,
        Layout,
        Error, Result,
        StorageConfig, StorageManager,
        RestApi,
    };
}
