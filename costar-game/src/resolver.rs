//! Turns raw provider payloads into hydrated chain items.
use log::{debug, warn};

use crate::config::EligibilityConfig;
use crate::item::{Actor, Item, ItemId, ItemKind, Movie};
use crate::provider::{ActorDetail, Credit, CreditMedia, MetadataProvider, MovieDetail};

/// Hydrates actors and movies through a [`MetadataProvider`].
///
/// Resolution never fails loudly: a provider error is logged and reported as
/// `None`, which callers treat the same as an item with no options.
#[derive(Debug, Clone)]
pub struct ContentResolver<M> {
    provider: M,
    eligibility: EligibilityConfig,
}

impl<M: MetadataProvider> ContentResolver<M> {
    pub const fn new(provider: M, eligibility: EligibilityConfig) -> Self {
        Self {
            provider,
            eligibility,
        }
    }

    pub const fn provider(&self) -> &M {
        &self.provider
    }

    /// Actor with eligible movies, newest first.
    pub async fn resolve_actor(&self, id: ItemId) -> Option<Actor> {
        match self.provider.fetch_actor_detail(id).await {
            Ok(detail) => {
                let actor = actor_from_detail(id, detail, &self.eligibility);
                debug!(
                    "resolved actor {id} ({}) with {} movie options",
                    actor.name,
                    actor.movie_options.as_ref().map_or(0, Vec::len)
                );
                Some(actor)
            }
            Err(err) => {
                warn!("actor {id} lookup failed: {err}");
                None
            }
        }
    }

    /// Movie with its cast in billing order.
    pub async fn resolve_movie(&self, id: ItemId) -> Option<Movie> {
        match self.provider.fetch_movie_detail(id).await {
            Ok(detail) => {
                let movie = movie_from_detail(id, detail);
                debug!(
                    "resolved movie {id} ({}) with {} cast options",
                    movie.name,
                    movie.cast_options.as_ref().map_or(0, Vec::len)
                );
                Some(movie)
            }
            Err(err) => {
                warn!("movie {id} lookup failed: {err}");
                None
            }
        }
    }

    pub async fn resolve(&self, kind: ItemKind, id: ItemId) -> Option<Item> {
        match kind {
            ItemKind::Actor => self.resolve_actor(id).await.map(Item::Actor),
            ItemKind::Movie => self.resolve_movie(id).await.map(Item::Movie),
        }
    }
}

/// Build a hydrated actor from a filmography payload.
///
/// Only released feature films outside the excluded genres become options,
/// sorted by release year descending (stable for equal years).
#[must_use]
pub fn actor_from_detail(id: ItemId, detail: ActorDetail, rules: &EligibilityConfig) -> Actor {
    let mut movies: Vec<Movie> = detail
        .credits
        .into_iter()
        .filter(|credit| is_eligible_credit(credit, rules))
        .map(|credit| {
            let year = credit.release_date.as_deref().and_then(release_year);
            Movie {
                id: credit.movie_id,
                name: credit.title,
                image_path: credit.poster_path,
                character: credit.character,
                year,
                cast_options: None,
            }
        })
        .collect();
    movies.sort_by(|a, b| b.year.cmp(&a.year));

    Actor {
        id,
        name: detail.name,
        image_path: detail.image_path,
        character: None,
        movie_options: Some(movies),
    }
}

/// Build a hydrated movie from a cast payload, keeping provider order.
#[must_use]
pub fn movie_from_detail(id: ItemId, detail: MovieDetail) -> Movie {
    let cast = detail
        .cast
        .into_iter()
        .map(|member| Actor {
            id: member.actor_id,
            name: member.name,
            image_path: member.profile_path,
            character: member.character,
            movie_options: None,
        })
        .collect();

    Movie {
        id,
        name: detail.title,
        image_path: detail.poster_path,
        character: None,
        year: detail.release_date.as_deref().and_then(release_year),
        cast_options: Some(cast),
    }
}

/// Feature-length, released, and not in an excluded genre.
#[must_use]
pub fn is_eligible_credit(credit: &Credit, rules: &EligibilityConfig) -> bool {
    credit.media == CreditMedia::Movie
        && !credit.is_video
        && credit
            .release_date
            .as_deref()
            .is_some_and(|date| !date.trim().is_empty())
        && !credit
            .genre_ids
            .iter()
            .any(|genre| rules.excluded_genre_ids.contains(genre))
}

/// Year component of a `YYYY-MM-DD` date.
#[must_use]
pub fn release_year(date: &str) -> Option<i32> {
    date.trim().split('-').next()?.parse().ok()
}
