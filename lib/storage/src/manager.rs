use crate::loader::load_catalogue;
use crate::matrix::load_similarity;
use parking_lot::{RwLock, RwLockReadGuard};
use scapes_core::item::ItemId;
use scapes_core::{
    Catalogue, Completer, CompletionConfig, Error, ResolvedSequence, Result, SimilarityMatrix,
    Token, TraitRarityTable,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Where the data directory keeps its assets
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub catalogue_file: PathBuf,
    pub similarity_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            catalogue_file: PathBuf::from("data.json"),
            similarity_file: PathBuf::from("similarity.npy"),
        }
    }
}

impl StorageConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn catalogue_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalogue_file)
    }

    pub fn similarity_path(&self) -> PathBuf {
        self.data_dir.join(&self.similarity_file)
    }
}

/// Owns the in-memory snapshot shared by request handlers.
///
/// The catalogue sits behind a lock whose write side is only taken by
/// [`StorageManager::recompute_rarity`]. The similarity table never changes
/// after load.
pub struct StorageManager {
    config: StorageConfig,
    catalogue: Arc<RwLock<Catalogue>>,
    traits: Arc<RwLock<TraitRarityTable>>,
    similarity: Arc<SimilarityMatrix>,
    completion: CompletionConfig,
}

impl StorageManager {
    /// Load catalogue and similarity table from the configured data directory
    pub fn open(config: StorageConfig) -> Result<Self> {
        let (catalogue, traits) = load_catalogue(config.catalogue_path())?;
        let similarity = load_similarity(config.similarity_path())?;
        Self::assemble(config, catalogue, traits, similarity)
    }

    /// Build from already loaded parts; rarity is (re)computed here
    pub fn from_parts(
        config: StorageConfig,
        mut catalogue: Catalogue,
        similarity: SimilarityMatrix,
    ) -> Result<Self> {
        let traits = catalogue.compute_rarity()?;
        Self::assemble(config, catalogue, traits, similarity)
    }

    fn assemble(
        config: StorageConfig,
        catalogue: Catalogue,
        traits: TraitRarityTable,
        similarity: SimilarityMatrix,
    ) -> Result<Self> {
        if similarity.size() != catalogue.len() {
            return Err(Error::InvalidDimension {
                expected: catalogue.len(),
                actual: similarity.size(),
            });
        }
        info!(
            "Storage ready: {} items, data directory {:?}",
            catalogue.len(),
            config.data_dir
        );
        Ok(Self {
            config,
            catalogue: Arc::new(RwLock::new(catalogue)),
            traits: Arc::new(RwLock::new(traits)),
            similarity: Arc::new(similarity),
            completion: CompletionConfig::default(),
        })
    }

    pub fn with_completion_config(mut self, completion: CompletionConfig) -> Result<Self> {
        completion.validate()?;
        self.completion = completion;
        Ok(self)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Shared read access to the catalogue
    pub fn catalogue(&self) -> RwLockReadGuard<'_, Catalogue> {
        self.catalogue.read()
    }

    pub fn trait_table(&self) -> RwLockReadGuard<'_, TraitRarityTable> {
        self.traits.read()
    }

    pub fn similarity(&self) -> Arc<SimilarityMatrix> {
        self.similarity.clone()
    }

    pub fn len(&self) -> usize {
        self.similarity.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rerun the rarity engine over the shared catalogue
    pub fn recompute_rarity(&self) -> Result<()> {
        let mut catalogue = self.catalogue.write();
        let table = catalogue.compute_rarity()?;
        *self.traits.write() = table;
        Ok(())
    }

    /// Resolve a completion request against the loaded similarity table
    pub fn complete(&self, tokens: &[Token]) -> Result<ResolvedSequence> {
        let completer = Completer::with_config(&self.similarity, self.completion.clone())?;
        completer.complete(tokens, self.len())
    }

    /// Image of `id` for the external renderer
    pub fn image_path(&self, id: ItemId) -> PathBuf {
        self.config
            .data_dir
            .join("images")
            .join(format!("{}.png", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scapes_core::{parse_tokens, Attribute, Item, DATE_TRAIT};

    fn catalogue(n: u32) -> Catalogue {
        let items = (1..=n)
            .map(|id| {
                Item::new(
                    id,
                    vec![
                        Attribute::new("Sky", if id % 3 == 0 { "Red" } else { "Blue" }),
                        Attribute::new(DATE_TRAIT, i64::from(id) * 60),
                    ],
                )
            })
            .collect();
        Catalogue::from_items(items).unwrap()
    }

    #[test]
    fn test_from_parts_computes_rarity() {
        let storage = StorageManager::from_parts(
            StorageConfig::default(),
            catalogue(6),
            SimilarityMatrix::zeros(6),
        )
        .unwrap();
        assert_eq!(storage.catalogue().by_rank(0).unwrap().id, 3);
        assert!(storage.trait_table().score("Sky: Red").is_some());
    }

    #[test]
    fn test_size_mismatch() {
        let result = StorageManager::from_parts(
            StorageConfig::default(),
            catalogue(6),
            SimilarityMatrix::zeros(5),
        );
        assert!(matches!(result, Err(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_recompute_is_stable() {
        let storage = StorageManager::from_parts(
            StorageConfig::default(),
            catalogue(6),
            SimilarityMatrix::zeros(6),
        )
        .unwrap();
        let before = storage.catalogue().clone();
        storage.recompute_rarity().unwrap();
        assert_eq!(*storage.catalogue(), before);
    }

    #[test]
    fn test_complete() {
        let storage = StorageManager::from_parts(
            StorageConfig::default(),
            catalogue(4),
            SimilarityMatrix::zeros(4),
        )
        .unwrap();
        let tokens = parse_tokens(["1", "?", "?", "4"]).unwrap();
        let resolved = storage.complete(&tokens).unwrap();
        let mut ids: Vec<ItemId> = resolved.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_image_path() {
        let storage = StorageManager::from_parts(
            StorageConfig::new("/srv/scapes"),
            catalogue(1),
            SimilarityMatrix::zeros(1),
        )
        .unwrap();
        assert_eq!(
            storage.image_path(1),
            PathBuf::from("/srv/scapes/images/1.png")
        );
    }
}
