use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Catalogue ids are 1-based and contiguous.
pub type ItemId = u32;

/// Reserved trait type carrying the mint timestamp. Never scored.
pub const DATE_TRAIT: &str = "date";

/// Label prefix of the synthetic attribute-count score.
pub const ATTRIBUTE_COUNT_TRAIT: &str = "Attribute Count";

/// Value synthesized for trait types an item does not carry.
pub const NONE_VALUE: &str = "None";

/// Attribute value - the source data mixes strings and small integers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
}

impl AttributeValue {
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

/// One `(trait_type, value)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        self.trait_type == DATE_TRAIT
    }

    /// Lookup key into the trait rarity table: `"<trait_type>: <value>"`
    pub fn label(&self) -> String {
        format!("{}: {}", self.trait_type, self.value)
    }
}

/// Label of the synthetic attribute-count score for `count` attributes.
pub fn attribute_count_label(count: usize) -> String {
    format!("{}: {}", ATTRIBUTE_COUNT_TRAIT, count)
}

/// One catalogue entry.
///
/// `attributes` and `attribute_count` come from the source data. The remaining
/// fields are derived by the rarity engine and overwritten on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub attributes: Vec<Attribute>,
    /// Non-date attributes before normalization
    pub attribute_count: usize,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub rarity_score: f64,
    #[serde(default)]
    pub attributes_rarity_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub rank: usize,
    /// Source fields not interpreted here (image urls, names, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    #[inline]
    #[must_use]
    pub fn new(id: ItemId, attributes: Vec<Attribute>) -> Self {
        let attribute_count = attributes.iter().filter(|a| !a.is_date()).count();
        Self {
            id,
            attributes,
            attribute_count,
            date: None,
            rarity_score: 0.0,
            attributes_rarity_scores: BTreeMap::new(),
            rank: 0,
            metadata: serde_json::Map::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attributes that take part in scoring
    pub fn scored_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| !a.is_date())
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.trait_type == trait_type)
    }

    pub fn external_image(&self) -> Option<&str> {
        self.metadata.get("external_image").and_then(|v| v.as_str())
    }

    /// Scored labels ordered from rarest to most common.
    ///
    /// Equal scores keep attribute order, with the attribute-count label last.
    pub fn rarest_attributes(&self) -> Vec<(String, f64)> {
        let mut labels: Vec<String> = self.scored_attributes().map(Attribute::label).collect();
        labels.push(attribute_count_label(self.attribute_count));

        let mut scored: Vec<(String, f64)> = labels
            .into_iter()
            .filter_map(|label| {
                self.attributes_rarity_scores
                    .get(&label)
                    .map(|score| (label, *score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// The single most remarkable thing about this item
    pub fn highlight(&self) -> Option<Highlight> {
        let (label, _) = self.rarest_attributes().into_iter().next()?;
        if label == attribute_count_label(self.attribute_count) {
            return Some(if self.attribute_count < FEW_ATTRIBUTES {
                Highlight::FewAttributes
            } else {
                Highlight::ManyAttributes
            });
        }
        self.scored_attributes()
            .find(|a| a.label() == label)
            .map(|a| Highlight::Trait {
                trait_type: a.trait_type.clone(),
                value: a.value.to_string(),
            })
    }
}

const FEW_ATTRIBUTES: usize = 5;

/// Rarest feature of an item, as surfaced to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Highlight {
    FewAttributes,
    ManyAttributes,
    Trait { trait_type: String, value: String },
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Highlight::FewAttributes => write!(f, "Wow, so few attributes. Looks clean."),
            Highlight::ManyAttributes => write!(f, "Wow, so many attributes. Looks rare."),
            Highlight::Trait { value, .. } => write!(f, "Wow, nice {}.", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored_item() -> Item {
        let mut item = Item::new(
            7,
            vec![
                Attribute::new("Sky", "Aurora"),
                Attribute::new(DATE_TRAIT, 1_630_000_000i64),
                Attribute::new("Ground", "Sand"),
            ],
        );
        item.attributes_rarity_scores.insert("Sky: Aurora".to_string(), 3.0);
        item.attributes_rarity_scores.insert("Ground: Sand".to_string(), 12.5);
        item.attributes_rarity_scores.insert(attribute_count_label(2), 1.5);
        item
    }

    #[test]
    fn test_attribute_count_excludes_date() {
        let item = scored_item();
        assert_eq!(item.attribute_count, 2);
        assert_eq!(item.scored_attributes().count(), 2);
    }

    #[test]
    fn test_label_format() {
        assert_eq!(Attribute::new("Sky", "Aurora").label(), "Sky: Aurora");
        assert_eq!(Attribute::new("Birds", 3i64).label(), "Birds: 3");
        assert_eq!(attribute_count_label(4), "Attribute Count: 4");
    }

    #[test]
    fn test_rarest_attributes_order() {
        let item = scored_item();
        let labels: Vec<String> = item.rarest_attributes().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Ground: Sand", "Sky: Aurora", "Attribute Count: 2"]);
    }

    #[test]
    fn test_highlight_trait() {
        let item = scored_item();
        let highlight = item.highlight().unwrap();
        assert_eq!(
            highlight,
            Highlight::Trait {
                trait_type: "Ground".to_string(),
                value: "Sand".to_string()
            }
        );
        assert_eq!(highlight.to_string(), "Wow, nice Sand.");
    }

    #[test]
    fn test_highlight_attribute_count() {
        let mut item = scored_item();
        item.attributes_rarity_scores.insert(attribute_count_label(2), 99.0);
        assert_eq!(item.highlight(), Some(Highlight::FewAttributes));
    }

    #[test]
    fn test_timestamp_from_text() {
        assert_eq!(AttributeValue::from("1630000000").as_timestamp(), Some(1_630_000_000));
        assert_eq!(AttributeValue::from("soon").as_timestamp(), None);
    }
}
