//! Pairwise edge-compatibility table
//!
//! Dense `N x N x 3` array of `u8` scores, axis order `[A, B, relation]`.
//! `Relation::Mixed` compares A's end edge with B's start edge, so it is the
//! score of A placed directly left of B. The other two channels compare like
//! edges and are used when one side of the pair is mirrored.

use crate::item::ItemId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of relation channels per pair
pub const RELATIONS: usize = 3;

/// Which pair of edges a score compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    StartStart = 0,
    Mixed = 1,
    EndEnd = 2,
}

/// Orientation hypothesis for a candidate being placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Normal,
    Flipped,
}

/// Side of the candidate a neighbor sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Neighbor is left of the candidate: lookups are `[neighbor, candidate]`
    Previous,
    /// Neighbor is right of the candidate: lookups are `[candidate, neighbor]`
    Next,
}

/// Channel to read for a candidate in `orientation` next to a neighbor on
/// `side` whose own horizontal flip is `neighbor_flipped`.
pub fn channel(orientation: Orientation, side: Side, neighbor_flipped: bool) -> Relation {
    use Relation::*;
    // [side][orientation][neighbor_flipped]
    const TABLE: [[[Relation; 2]; 2]; 2] = [
        // previous: normal, flipped
        [[Mixed, StartStart], [EndEnd, Mixed]],
        // next: normal, flipped
        [[Mixed, EndEnd], [StartStart, Mixed]],
    ];
    let s = match side {
        Side::Previous => 0,
        Side::Next => 1,
    };
    let o = match orientation {
        Orientation::Normal => 0,
        Orientation::Flipped => 1,
    };
    TABLE[s][o][neighbor_flipped as usize]
}

/// Read-only similarity table for a catalogue of `size` items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityMatrix {
    size: usize,
    data: Vec<u8>,
}

impl SimilarityMatrix {
    /// Wrap a C-ordered `size x size x 3` buffer
    pub fn new(size: usize, data: Vec<u8>) -> Result<Self> {
        let expected = size * size * RELATIONS;
        if data.len() != expected {
            return Err(Error::InvalidDimension {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// All-zero table, mostly useful for building fixtures
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0; size * size * RELATIONS],
        }
    }

    /// Number of items on each axis
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn offset(&self, a: ItemId, b: ItemId, relation: Relation) -> usize {
        debug_assert!(a >= 1 && a as usize <= self.size);
        debug_assert!(b >= 1 && b as usize <= self.size);
        ((a as usize - 1) * self.size + (b as usize - 1)) * RELATIONS + relation as usize
    }

    /// Score of `a` against `b` on `relation`. Ids are 1-based.
    #[inline]
    pub fn score(&self, a: ItemId, b: ItemId, relation: Relation) -> u8 {
        self.data[self.offset(a, b, relation)]
    }

    pub fn set(&mut self, a: ItemId, b: ItemId, relation: Relation, score: u8) {
        let offset = self.offset(a, b, relation);
        self.data[offset] = score;
    }
}
