//! Occurrence-based rarity scoring and ranking
//!
//! Every label (`"<trait_type>: <value>"` or `"Attribute Count: <k>"`) scores
//! the reciprocal of its population frequency. An item's rarity score is the
//! sum of its label scores, and ranks order items by descending score.

use crate::catalogue::Catalogue;
use crate::item::{attribute_count_label, Attribute, Item, ItemId, ATTRIBUTE_COUNT_TRAIT, NONE_VALUE};
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Round to two decimal places, ties to even
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Rarity of a label seen `count` times among `total` items
#[inline]
pub fn rarity_score(count: usize, total: usize) -> f64 {
    round2(1.0 / (count as f64 / total as f64))
}

/// Label -> score table built by one rarity run
#[derive(Debug, Clone, Default)]
pub struct TraitRarityTable {
    scores: AHashMap<String, f64>,
    occurrences: AHashMap<String, usize>,
    trait_types: BTreeSet<String>,
    catalogue_size: usize,
}

impl TraitRarityTable {
    pub fn score(&self, label: &str) -> Option<f64> {
        self.scores.get(label).copied()
    }

    pub fn occurrences(&self, label: &str) -> Option<usize> {
        self.occurrences.get(label).copied()
    }

    /// Trait types every item carries after normalization
    pub fn trait_types(&self) -> &BTreeSet<String> {
        &self.trait_types
    }

    pub fn catalogue_size(&self) -> usize {
        self.catalogue_size
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Labels by descending occurrence count, ties by label
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut labels: Vec<(&str, usize)> = self
            .occurrences
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        labels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        labels
    }

    fn insert(&mut self, label: String, count: usize) {
        self.scores.insert(label.clone(), rarity_score(count, self.catalogue_size));
        self.occurrences.insert(label, count);
    }
}

/// Recompute every derived rarity field of the catalogue.
///
/// Missing trait types are filled with `"None"` first, which permanently
/// extends the item attribute lists. Running this twice yields the same
/// result since normalization only adds what is absent.
pub fn compute_rarity(catalogue: &mut Catalogue) -> Result<TraitRarityTable> {
    for item in catalogue.iter() {
        validate_item(item)?;
    }

    let total = catalogue.len();
    let trait_types = normalize(catalogue);

    let mut label_counts: AHashMap<String, usize> = AHashMap::new();
    let mut attribute_count_counts: AHashMap<usize, usize> = AHashMap::new();
    for item in catalogue.iter() {
        for attr in item.scored_attributes() {
            *label_counts.entry(attr.label()).or_insert(0) += 1;
        }
        *attribute_count_counts.entry(item.attribute_count).or_insert(0) += 1;
    }

    let mut table = TraitRarityTable {
        trait_types,
        catalogue_size: total,
        ..Default::default()
    };
    for (label, count) in label_counts {
        table.insert(label, count);
    }
    for (attribute_count, count) in attribute_count_counts {
        table.insert(attribute_count_label(attribute_count), count);
    }

    let mut scores: Vec<(ItemId, f64)> = Vec::with_capacity(total);
    for item in catalogue.items_mut() {
        score_item(item, &table)?;
        scores.push((item.id, item.rarity_score));
    }

    // Stable: equal scores keep id order.
    scores.sort_by_key(|&(_, score)| Reverse(OrderedFloat(score)));
    for (rank, (id, _)) in scores.into_iter().enumerate() {
        if let Some(item) = catalogue.item_mut(id) {
            item.rank = rank;
        }
    }

    info!(
        "Computed rarity for {} items ({} trait types, {} labels)",
        total,
        table.trait_types.len(),
        table.len()
    );
    Ok(table)
}

fn validate_item(item: &Item) -> Result<()> {
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut date = None;
    for attr in &item.attributes {
        if attr.trait_type.is_empty() {
            return Err(Error::MalformedAttributeData(format!(
                "item {} has an attribute without trait_type",
                item.id
            )));
        }
        if attr.trait_type == ATTRIBUTE_COUNT_TRAIT {
            return Err(Error::MalformedAttributeData(format!(
                "item {} uses reserved trait_type '{}'",
                item.id, ATTRIBUTE_COUNT_TRAIT
            )));
        }
        if !seen.insert(attr.trait_type.as_str()) {
            return Err(Error::MalformedAttributeData(format!(
                "item {} carries trait_type '{}' more than once",
                item.id, attr.trait_type
            )));
        }
        if attr.is_date() {
            date = Some(attr.value.as_timestamp().ok_or_else(|| {
                Error::MalformedAttributeData(format!(
                    "item {} has a non-numeric date '{}'",
                    item.id, attr.value
                ))
            })?);
        }
    }
    if date.is_none() {
        return Err(Error::MalformedAttributeData(format!(
            "item {} has no date attribute",
            item.id
        )));
    }
    Ok(())
}

/// Give every item a value for every trait type, returning the trait universe.
fn normalize(catalogue: &mut Catalogue) -> BTreeSet<String> {
    let trait_types: BTreeSet<String> = catalogue
        .iter()
        .flat_map(|item| item.scored_attributes().map(|a| a.trait_type.clone()))
        .collect();

    let mut synthesized = 0usize;
    for item in catalogue.items_mut() {
        let present: AHashSet<String> = item
            .scored_attributes()
            .map(|a| a.trait_type.clone())
            .collect();
        for trait_type in &trait_types {
            if !present.contains(trait_type) {
                item.attributes.push(Attribute::new(trait_type.clone(), NONE_VALUE));
                synthesized += 1;
            }
        }
    }
    debug!("Synthesized {} '{}' attributes", synthesized, NONE_VALUE);
    trait_types
}

fn score_item(item: &mut Item, table: &TraitRarityTable) -> Result<()> {
    // Own attributes, then synthesized `None` ones, then the count label.
    let mut scores: Vec<(String, f64)> = Vec::with_capacity(item.attributes.len() + 1);
    let mut date = None;
    for attr in &item.attributes {
        if attr.is_date() {
            date = attr.value.as_timestamp();
            continue;
        }
        let label = attr.label();
        let score = table.score(&label).ok_or_else(|| {
            Error::MalformedAttributeData(format!("no rarity score for label '{}'", label))
        })?;
        scores.push((label, score));
    }

    let count_label = attribute_count_label(item.attribute_count);
    let count_score = table.score(&count_label).ok_or_else(|| {
        Error::MalformedAttributeData(format!("no rarity score for label '{}'", count_label))
    })?;
    scores.push((count_label, count_score));

    let total = scores.iter().fold(0.0, |acc, (_, score)| acc + score);
    item.rarity_score = round2(total);
    item.attributes_rarity_scores = scores.into_iter().collect::<BTreeMap<_, _>>();
    item.date = date;
    Ok(())
}
