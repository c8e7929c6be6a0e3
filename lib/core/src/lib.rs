//! # scapes Core
//!
//! Core library for the scapes metadata service.
//!
//! This crate provides the catalogue model and the two engines built on it:
//!
//! - [`Catalogue`] - The fixed set of [`Item`]s, ids `1..=N`
//! - [`rarity`] - Occurrence-based rarity scores and ranks
//! - [`SimilarityMatrix`] - Pairwise edge-compatibility table
//! - [`Completer`] - Fills wildcard positions of a [`Token`] sequence
//! - [`Layout`] - Composition planning for resolved sequences
//!
//! ## Example
//!
//! ```rust
//! use scapes_core::{Attribute, Catalogue, Item, SimilarityMatrix, Completer, parse_tokens};
//!
//! let items = vec![
//!     Item::new(1, vec![Attribute::new("Sky", "Blue"), Attribute::new("date", 100i64)]),
//!     Item::new(2, vec![Attribute::new("Sky", "Red"), Attribute::new("date", 200i64)]),
//!     Item::new(3, vec![Attribute::new("Sky", "Blue"), Attribute::new("date", 300i64)]),
//! ];
//! let mut catalogue = Catalogue::from_items(items).unwrap();
//! catalogue.compute_rarity().unwrap();
//! assert_eq!(catalogue.by_rank(0).unwrap().id, 2);
//!
//! let similarity = SimilarityMatrix::zeros(catalogue.len());
//! let tokens = parse_tokens(["1", "?", "3h"]).unwrap();
//! let resolved = Completer::new(&similarity).complete(&tokens, catalogue.len()).unwrap();
//! assert_eq!(resolved[1].id, 2);
//! ```

pub mod error;
pub mod item;
pub mod catalogue;
pub mod rarity;
pub mod similarity;
pub mod token;
pub mod completion;
pub mod layout;

pub use error::{Error, Result};
pub use item::{Attribute, AttributeValue, Highlight, Item, ItemId, DATE_TRAIT};
pub use catalogue::Catalogue;
pub use rarity::{compute_rarity, TraitRarityTable};
pub use similarity::{Orientation, Relation, SimilarityMatrix, RELATIONS};
pub use token::{parse_tokens, ItemRef, Token};
pub use completion::{
    complete, Candidate, Completer, CompletionConfig, ExhaustionFallback, Placement,
    ResolvedSequence,
};
pub use layout::{CompositionPlan, Layout, TilePlacement};
