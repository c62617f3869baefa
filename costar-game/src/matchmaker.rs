//! Starting-pair selection under difficulty bands and exclusion rules.
//!
//! Difficulty maps each starting slot onto a popularity band:
//!
//! | difficulty | first actor | second actor |
//! |------------|-------------|--------------|
//! | easy       | top         | top          |
//! | medium     | top         | bottom       |
//! | hard       | bottom      | bottom       |
//!
//! Medium is deliberately lopsided so the combined difficulty sits between the
//! other two.
use log::debug;
use once_cell::sync::OnceCell;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::error::GameError;
use crate::item::{Actor, ItemId};
use crate::pool::{Band, CandidatePool};
use crate::provider::MetadataProvider;
use crate::resolver::ContentResolver;
use crate::settings::{Difficulty, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// Band sampled for this slot at the given difficulty.
    #[must_use]
    pub const fn band(self, difficulty: Difficulty) -> Band {
        match (self, difficulty) {
            (Self::First, Difficulty::Easy | Difficulty::Medium) | (Self::Second, Difficulty::Easy) => {
                Band::Top
            }
            (Self::First, Difficulty::Hard) | (Self::Second, Difficulty::Medium | Difficulty::Hard) => {
                Band::Bottom
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchmakingError {
    #[error("{} band is empty in a pool of {pool_len}", band.key())]
    BandEmpty { band: Band, pool_len: usize },
    #[error("no acceptable {slot:?} actor after {attempts} draws")]
    RetriesExhausted { slot: Slot, attempts: u32 },
}

/// Ids chosen for a new game, before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingIds {
    pub first: ItemId,
    pub second: ItemId,
    /// The first id is the anchor, forced by settings.
    pub first_is_anchor: bool,
}

/// Draw the two starting actor ids.
///
/// Each slot samples uniformly from its band and redraws until the candidate
/// passes the slot's exclusions, giving up after
/// `config.max_sample_attempts` draws.
///
/// # Errors
///
/// Returns [`MatchmakingError::BandEmpty`] when a needed band has no ids and
/// [`MatchmakingError::RetriesExhausted`] when every draw was rejected.
pub fn select_starting_ids<R: Rng + ?Sized>(
    settings: &Settings,
    pool: &CandidatePool,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<StartingIds, MatchmakingError> {
    let anchor = config.anchor_actor_id;
    let excluded = (!settings.allow_excluded_actor).then_some(config.excluded_actor_id);

    let (first, first_is_anchor) = if settings.start_with_anchor {
        (anchor, true)
    } else {
        let drawn = draw(Slot::First, settings.difficulty, pool, config, rng, |id| {
            id != anchor && Some(id) != excluded
        })?;
        (drawn, false)
    };

    let second = draw(Slot::Second, settings.difficulty, pool, config, rng, |id| {
        id != first && id != anchor && Some(id) != excluded
    })?;

    debug!(
        "matchmaking ({}): first {first}{} second {second}",
        settings.difficulty.key(),
        if first_is_anchor { " [anchor]" } else { "" }
    );
    Ok(StartingIds {
        first,
        second,
        first_is_anchor,
    })
}

fn draw<R: Rng + ?Sized>(
    slot: Slot,
    difficulty: Difficulty,
    pool: &CandidatePool,
    config: &EngineConfig,
    rng: &mut R,
    accept: impl Fn(ItemId) -> bool,
) -> Result<ItemId, MatchmakingError> {
    let band = slot.band(difficulty);
    let candidates = pool.band(band, &config.bands);
    if candidates.is_empty() {
        return Err(MatchmakingError::BandEmpty {
            band,
            pool_len: pool.len(),
        });
    }
    for _ in 0..config.max_sample_attempts {
        let id = candidates[rng.gen_range(0..candidates.len())];
        if accept(id) {
            return Ok(id);
        }
    }
    Err(MatchmakingError::RetriesExhausted {
        slot,
        attempts: config.max_sample_attempts,
    })
}

/// Resolves starting pairs and keeps the anchor actor cached across games.
#[derive(Debug, Default)]
pub struct Matchmaker {
    anchor: OnceCell<Actor>,
}

impl Matchmaker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached anchor record, once the anchor has been resolved.
    #[must_use]
    pub fn cached_anchor(&self) -> Option<&Actor> {
        self.anchor.get()
    }

    /// Draw and resolve both starting actors.
    ///
    /// Both lookups run concurrently and the pair is returned only if both
    /// succeed. A cached anchor is reused without a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptyPool`] if drawing fails and
    /// [`GameError::StartingActorUnavailable`] if either lookup comes back empty.
    pub async fn select_starting_pair<M, R>(
        &self,
        settings: &Settings,
        pool: &CandidatePool,
        resolver: &ContentResolver<M>,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<(Actor, Actor), GameError>
    where
        M: MetadataProvider,
        R: Rng + ?Sized,
    {
        let ids = select_starting_ids(settings, pool, config, rng)?;
        let cached = if ids.first_is_anchor {
            self.anchor.get().cloned()
        } else {
            None
        };
        let reuse_anchor = cached.is_some();

        let first_lookup = async {
            match cached {
                Some(anchor) => Some(anchor),
                None => resolver.resolve_actor(ids.first).await,
            }
        };
        let (first, second) = futures::join!(first_lookup, resolver.resolve_actor(ids.second));

        let first = first.ok_or(GameError::StartingActorUnavailable { id: ids.first })?;
        let second = second.ok_or(GameError::StartingActorUnavailable { id: ids.second })?;

        if ids.first_is_anchor && !reuse_anchor {
            let _ = self.anchor.set(first.clone());
        }
        Ok((first, second))
    }
}
