use crate::item::{Item, ItemId};
use crate::rarity::{self, TraitRarityTable};
use crate::{Error, Result};
use rand::Rng;

/// The fixed set of items, indexed by id.
///
/// Ids form the contiguous range `[1, N]`. The rarity engine is the only
/// writer: it goes through [`Catalogue::compute_rarity`], which needs
/// `&mut self`. Every other consumer holds a shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    items: Vec<Item>,
}

impl Catalogue {
    /// Build a catalogue, checking ids are unique and contiguous from 1
    pub fn from_items(mut items: Vec<Item>) -> Result<Self> {
        items.sort_by_key(|item| item.id);
        for (idx, item) in items.iter().enumerate() {
            let expected = idx as ItemId + 1;
            if item.id != expected {
                return Err(Error::InvalidCatalogue(if item.id < expected {
                    format!("duplicate item id {}", item.id)
                } else {
                    format!("item ids must be contiguous, missing id {}", expected)
                }));
            }
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        id >= 1 && (id as usize) <= self.items.len()
    }

    /// Get an item by id
    pub fn get(&self, id: ItemId) -> Result<&Item> {
        if !self.contains(id) {
            return Err(Error::ItemNotFound(id));
        }
        Ok(&self.items[id as usize - 1])
    }

    /// Items in id order
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.iter_mut()
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        if !self.contains(id) {
            return None;
        }
        self.items.get_mut(id as usize - 1)
    }

    /// Recompute rarity scores and ranks for every item
    pub fn compute_rarity(&mut self) -> Result<TraitRarityTable> {
        rarity::compute_rarity(self)
    }

    /// Item at a 0-based rank
    pub fn by_rank(&self, rank: usize) -> Result<&Item> {
        self.items
            .iter()
            .find(|item| item.rank == rank)
            .ok_or(Error::RankOutOfRange {
                rank,
                size: self.items.len(),
            })
    }

    /// Item whose date is closest to `timestamp`; the lowest id wins ties
    pub fn closest_to_date(&self, timestamp: i64) -> Option<&Item> {
        self.items
            .iter()
            .filter_map(|item| item.date.map(|date| (item, date.abs_diff(timestamp))))
            .min_by_key(|&(item, distance)| (distance, item.id))
            .map(|(item, _)| item)
    }

    /// Uniformly random id in `[1, N]`
    pub fn random_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ItemId> {
        if self.items.is_empty() {
            return None;
        }
        Some(rng.random_range(1..=self.items.len() as ItemId))
    }

    /// `(rank, id)` for each owned id, rarest first
    pub fn ranked_holdings(&self, ids: &[ItemId]) -> Result<Vec<(usize, ItemId)>> {
        let mut holdings = ids
            .iter()
            .map(|&id| self.get(id).map(|item| (item.rank, id)))
            .collect::<Result<Vec<_>>>()?;
        holdings.sort_unstable();
        Ok(holdings)
    }
}
