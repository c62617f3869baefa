//! Popularity-ranked candidate pool for starting actors.
use std::collections::HashSet;
use std::ops::Range;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{BandConfig, PoolConfig};
use crate::item::ItemId;
use crate::provider::{PoolProvider, PopularActor, ProviderError};

/// Contiguous popularity-rank slice used for difficulty-scaled sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Most popular ranks, every rank below `top_end * N`.
    Top,
    /// Least popular ranks, `[bottom_start * N, N)`.
    Bottom,
}

impl Band {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// Rank range covered by this band in a pool of `len` ids.
    #[must_use]
    pub fn ranks(self, len: usize, bands: &BandConfig) -> Range<usize> {
        match self {
            Self::Top => 0..scaled_rank(len, bands.top_end, f64::ceil),
            Self::Bottom => scaled_rank(len, bands.bottom_start, f64::floor)..len,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn scaled_rank(len: usize, fraction: f32, round: fn(f64) -> f64) -> usize {
    let scaled = round(f64::from(fraction) * len as f64);
    (scaled.max(0.0) as usize).min(len)
}

/// Ordered actor ids, index 0 most popular. Frozen once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePool {
    ids: Vec<ItemId>,
}

impl CandidatePool {
    /// Build a pool from ranked ids, keeping the first occurrence of duplicates.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let mut seen = HashSet::new();
        let ids = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self { ids }
    }

    #[must_use]
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn band(&self, band: Band, bands: &BandConfig) -> &[ItemId] {
        &self.ids[band.ranks(self.ids.len(), bands)]
    }

    /// Rank of an id, if present.
    #[must_use]
    pub fn rank_of(&self, id: ItemId) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }

    /// Page through the popular-people listing until more than
    /// `config.min_count` eligible actors are collected.
    ///
    /// Paging also stops on an empty page or after `config.max_pages`.
    ///
    /// # Errors
    ///
    /// Propagates the first page that fails to load.
    pub async fn populate<P: PoolProvider + ?Sized>(
        provider: &P,
        config: &PoolConfig,
    ) -> Result<Self, ProviderError> {
        let target = config.min_count as usize;
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut page = 1;

        while ids.len() <= target && page <= config.max_pages {
            let entries = provider.fetch_popular_actor_page(page).await?;
            if entries.is_empty() {
                debug!("popular listing exhausted at page {page}");
                break;
            }
            let before = ids.len();
            ids.extend(
                entries
                    .iter()
                    .filter(|entry| is_pool_candidate(entry, config))
                    .map(|entry| entry.id)
                    .filter(|id| seen.insert(*id)),
            );
            debug!(
                "popular page {page}: kept {} of {} entries",
                ids.len() - before,
                entries.len()
            );
            page += 1;
        }

        info!(
            "candidate pool populated with {} actors from {} pages",
            ids.len(),
            page - 1
        );
        Ok(Self { ids })
    }
}

/// Acting professionals, no adult content, known for work in the pool language.
#[must_use]
pub fn is_pool_candidate(entry: &PopularActor, config: &PoolConfig) -> bool {
    entry.department == config.department
        && !entry.adult
        && entry
            .known_for_languages
            .iter()
            .any(|language| *language == config.language)
}
