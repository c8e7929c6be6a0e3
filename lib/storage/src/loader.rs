use scapes_core::item::{Attribute, ItemId};
use scapes_core::{Catalogue, Error, Item, Result, TraitRarityTable};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Fields derived by the rarity engine; ignored when present in source data
const DERIVED_FIELDS: [&str; 5] = [
    "attribute_count",
    "date",
    "rarity_score",
    "attributes_rarity_scores",
    "rank",
];

#[derive(Debug, Deserialize)]
struct ItemRecord {
    id: ItemId,
    attributes: Vec<Attribute>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ItemRecord {
    fn into_item(mut self) -> Item {
        for field in DERIVED_FIELDS {
            self.extra.remove(field);
        }
        Item::new(self.id, self.attributes).with_metadata(self.extra)
    }
}

/// Parse a JSON array of items without scoring them
pub fn parse_catalogue(json: &str) -> Result<Catalogue> {
    let records: Vec<ItemRecord> = serde_json::from_str(json).map_err(|e| {
        if e.is_data() {
            Error::MalformedAttributeData(e.to_string())
        } else {
            Error::Serialization(e.to_string())
        }
    })?;
    Catalogue::from_items(records.into_iter().map(ItemRecord::into_item).collect())
}

/// Load a catalogue file and run the rarity engine over it
pub fn load_catalogue<P: AsRef<Path>>(path: P) -> Result<(Catalogue, TraitRarityTable)> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let mut catalogue = parse_catalogue(&json)?;
    info!("Loaded {} items from {:?}", catalogue.len(), path);
    let table = catalogue.compute_rarity()?;
    Ok((catalogue, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": 2, "attributes": [{"trait_type": "Sky", "value": "Red"}, {"trait_type": "date", "value": 200}],
         "external_image": "https://example.invalid/2.png"},
        {"id": 1, "attributes": [{"trait_type": "Sky", "value": "Blue"}, {"trait_type": "Birds", "value": 3},
                                 {"trait_type": "date", "value": 100}], "rank": 17}
    ]"#;

    #[test]
    fn test_parse_catalogue() {
        let catalogue = parse_catalogue(SAMPLE).unwrap();
        assert_eq!(catalogue.len(), 2);
        let one = catalogue.get(1).unwrap();
        assert_eq!(one.attribute_count, 2);
        assert!(one.metadata.is_empty());
        let two = catalogue.get(2).unwrap();
        assert_eq!(two.external_image(), Some("https://example.invalid/2.png"));
    }

    #[test]
    fn test_bad_attribute_shape() {
        let json = r#"[{"id": 1, "attributes": [{"value": "Red"}]}]"#;
        assert!(matches!(
            parse_catalogue(json),
            Err(Error::MalformedAttributeData(_))
        ));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_catalogue("[{"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_load_catalogue_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let (catalogue, table) = load_catalogue(&path).unwrap();
        assert_eq!(table.catalogue_size(), 2);
        let two = catalogue.get(2).unwrap();
        assert_eq!(two.attribute("Birds").unwrap().value.to_string(), "None");
        assert_eq!(two.date, Some(200));
        assert_eq!(catalogue.by_rank(0).unwrap().id, 1);
    }
}
