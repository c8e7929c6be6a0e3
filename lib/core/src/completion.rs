//! Sequence completion
//!
//! Fills the wildcards of a request with items whose edges fit their
//! neighbors. Each wildcard scores every catalogue item once per orientation
//! hypothesis, then draws from the scores with a coin-flip scan in ascending
//! score order. Ids never repeat within one result.

use crate::item::ItemId;
use crate::similarity::{channel, Orientation, Side, SimilarityMatrix};
use crate::token::{ItemRef, Token};
use crate::{Error, Result};
use ahash::AHashSet;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// What to do when every scan pass rejected every candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionFallback {
    /// Take the lowest-scoring unused candidate, i.e. the first one the scan visits
    #[default]
    LowestScore,
    /// Fail the request with `ExhaustedCandidates`
    Fail,
}

/// Tuning of the selection policy
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Normal-orientation scores above this make the flipped orientation eligible
    pub flip_threshold: u32,
    /// Chance that the scan accepts an unused candidate it visits
    pub accept_probability: f64,
    /// Full scans attempted before `fallback` applies
    pub max_scan_passes: usize,
    pub fallback: ExhaustionFallback,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            flip_threshold: 50,
            accept_probability: 0.5,
            max_scan_passes: 8,
            fallback: ExhaustionFallback::LowestScore,
        }
    }
}

impl CompletionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.accept_probability > 0.0 && self.accept_probability <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "accept_probability must be in (0, 1], got {}",
                self.accept_probability
            )));
        }
        if self.max_scan_passes == 0 && self.fallback == ExhaustionFallback::Fail {
            return Err(Error::InvalidConfig(
                "max_scan_passes must be positive when the fallback is Fail".to_string(),
            ));
        }
        Ok(())
    }
}

/// One resolved position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Placement {
    pub id: ItemId,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Placement {
    pub fn new(id: ItemId, flip_horizontal: bool) -> Self {
        Self {
            id,
            flip_horizontal,
            flip_vertical: false,
        }
    }
}

impl From<ItemRef> for Placement {
    fn from(r: ItemRef) -> Self {
        Self {
            id: r.id,
            flip_horizontal: r.flip_horizontal,
            flip_vertical: r.flip_vertical,
        }
    }
}

/// One entry per request token, ids pairwise distinct
pub type ResolvedSequence = Vec<Placement>;

/// A candidate accepted by the scan, with its accumulated score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: ItemId,
    pub score: u32,
}

/// Resolves requests against one similarity table
#[derive(Debug, Clone)]
pub struct Completer<'a> {
    similarity: &'a SimilarityMatrix,
    config: CompletionConfig,
}

impl<'a> Completer<'a> {
    pub fn new(similarity: &'a SimilarityMatrix) -> Self {
        Self {
            similarity,
            config: CompletionConfig::default(),
        }
    }

    pub fn with_config(similarity: &'a SimilarityMatrix, config: CompletionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { similarity, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Resolve `tokens` using the thread-local generator
    pub fn complete(&self, tokens: &[Token], catalogue_size: usize) -> Result<ResolvedSequence> {
        self.complete_with_rng(tokens, catalogue_size, &mut rand::rng())
    }

    pub fn complete_with_rng<R: Rng + ?Sized>(
        &self,
        tokens: &[Token],
        catalogue_size: usize,
        rng: &mut R,
    ) -> Result<ResolvedSequence> {
        if self.similarity.size() != catalogue_size {
            return Err(Error::InvalidDimension {
                expected: catalogue_size,
                actual: self.similarity.size(),
            });
        }

        let mut used = reserve_explicit(tokens, catalogue_size)?;
        let mut resolved = Vec::with_capacity(tokens.len());
        let mut prev: Option<Placement> = None;

        for (position, token) in tokens.iter().enumerate() {
            let placement = match token {
                Token::Explicit(r) => Placement::from(*r),
                Token::Wildcard => {
                    // Past the last token sits an implicit boundary: no constraint.
                    let next = tokens.get(position + 1);
                    let placement = self.fill(position, prev, next, &used, rng)?;
                    debug!(
                        "Position {}: picked {} (flipped: {})",
                        position, placement.id, placement.flip_horizontal
                    );
                    placement
                }
            };
            used.insert(placement.id);
            resolved.push(placement);
            prev = Some(placement);
        }

        Ok(resolved)
    }

    fn fill<R: Rng + ?Sized>(
        &self,
        position: usize,
        prev: Option<Placement>,
        next: Option<&Token>,
        used: &AHashSet<ItemId>,
        rng: &mut R,
    ) -> Result<Placement> {
        let size = self.similarity.size();
        if prev.is_none() && next.is_none() {
            if size == 0 {
                return Err(Error::ExhaustedCandidates { position });
            }
            return Ok(Placement::new(rng.random_range(1..=size as ItemId), false));
        }

        let next = next.and_then(Token::item_ref);
        let normal_scores = self.orientation_scores(Orientation::Normal, prev, next);
        let normal = self.pick(&normal_scores, used, position, rng)?;

        if normal.score > self.config.flip_threshold {
            let flipped_scores = self.orientation_scores(Orientation::Flipped, prev, next);
            let flipped = self.pick(&flipped_scores, used, position, rng)?;
            if flipped.score > normal.score {
                return Ok(Placement::new(flipped.id, true));
            }
        }
        Ok(Placement::new(normal.id, false))
    }

    /// Accumulated neighbor scores of every catalogue item placed in
    /// `orientation` between `prev` and `next`. Index `i` holds id `i + 1`.
    pub fn orientation_scores(
        &self,
        orientation: Orientation,
        prev: Option<Placement>,
        next: Option<&ItemRef>,
    ) -> Vec<u32> {
        let m = self.similarity;
        let mut scores = vec![0u32; m.size()];

        if let Some(prev) = prev {
            let relation = channel(orientation, Side::Previous, prev.flip_horizontal);
            for (idx, score) in scores.iter_mut().enumerate() {
                *score += u32::from(m.score(prev.id, idx as ItemId + 1, relation));
            }
        }
        if let Some(next) = next {
            let relation = channel(orientation, Side::Next, next.flip_horizontal);
            for (idx, score) in scores.iter_mut().enumerate() {
                *score += u32::from(m.score(idx as ItemId + 1, next.id, relation));
            }
        }
        scores
    }

    /// One coin-flip scan over `scores` in ascending order, skipping
    /// `excluded`. `None` when every visited candidate was rejected.
    pub fn select_candidate<R: Rng + ?Sized>(
        &self,
        scores: &[u32],
        excluded: &AHashSet<ItemId>,
        rng: &mut R,
    ) -> Option<Candidate> {
        self.scan(&ascending(scores), scores, excluded, rng)
    }

    fn scan<R: Rng + ?Sized>(
        &self,
        order: &[usize],
        scores: &[u32],
        excluded: &AHashSet<ItemId>,
        rng: &mut R,
    ) -> Option<Candidate> {
        order
            .iter()
            .map(|&idx| Candidate {
                id: idx as ItemId + 1,
                score: scores[idx],
            })
            .filter(|c| !excluded.contains(&c.id))
            .find(|_| rng.random_bool(self.config.accept_probability))
    }

    /// Bounded retries of [`Self::select_candidate`], then the configured fallback
    fn pick<R: Rng + ?Sized>(
        &self,
        scores: &[u32],
        used: &AHashSet<ItemId>,
        position: usize,
        rng: &mut R,
    ) -> Result<Candidate> {
        let order = ascending(scores);
        let mut unused = order
            .iter()
            .map(|&idx| Candidate {
                id: idx as ItemId + 1,
                score: scores[idx],
            })
            .filter(|c| !used.contains(&c.id));
        let lowest = unused.next().ok_or(Error::ExhaustedCandidates { position })?;

        for _ in 0..self.config.max_scan_passes {
            if let Some(candidate) = self.scan(&order, scores, used, rng) {
                return Ok(candidate);
            }
        }

        match self.config.fallback {
            ExhaustionFallback::LowestScore => {
                warn!(
                    "Position {}: no candidate accepted after {} passes, using lowest score {}",
                    position, self.config.max_scan_passes, lowest.id
                );
                Ok(lowest)
            }
            ExhaustionFallback::Fail => Err(Error::ExhaustedCandidates { position }),
        }
    }
}

/// Resolve `tokens` with the default policy
pub fn complete(
    tokens: &[Token],
    similarity: &SimilarityMatrix,
    catalogue_size: usize,
) -> Result<ResolvedSequence> {
    Completer::new(similarity).complete(tokens, catalogue_size)
}

/// Indices of `scores` sorted ascending; equal scores keep id order
fn ascending(scores: &[u32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&idx| scores[idx]);
    order
}

/// Validate explicit references and collect their ids
fn reserve_explicit(tokens: &[Token], catalogue_size: usize) -> Result<AHashSet<ItemId>> {
    let mut used = AHashSet::with_capacity(tokens.len());
    for token in tokens {
        if let Token::Explicit(r) = token {
            if r.id == 0 || r.id as usize > catalogue_size {
                return Err(Error::InvalidToken(format!(
                    "id {} is outside 1..={}",
                    r.id, catalogue_size
                )));
            }
            if !used.insert(r.id) {
                return Err(Error::DuplicateReference(r.id));
            }
        }
    }
    Ok(used)
}
