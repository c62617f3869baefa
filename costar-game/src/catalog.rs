//! In-memory provider backed by a fixed film graph.
//!
//! Used for offline play, QA sweeps and tests. Actor filmographies are derived
//! from movie casts so the graph is always symmetric; extra raw credits can be
//! attached to exercise the eligibility filter.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::item::{EntityKey, ItemId};
use crate::provider::{
    ActorDetail, CastCredit, Credit, CreditMedia, MetadataProvider, MovieDetail, PoolProvider,
    PopularActor, ProviderError,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.example.test/t/p/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ActorEntry {
    name: String,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    extra_credits: Vec<Credit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MovieEntry {
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u32>,
    #[serde(default)]
    cast: Vec<CastCredit>,
}

/// Sizing for [`MemoryCatalog::synthetic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSpec {
    pub actors: usize,
    pub movies: usize,
    /// Billed cast per movie, including the two ring links.
    pub cast_size: usize,
    /// Actor ids that must exist in the graph (anchor, excluded actor).
    pub reserved_actor_ids: Vec<ItemId>,
    /// Every n-th popular entry is a non-acting person; zero disables.
    pub crew_every: usize,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            actors: 640,
            movies: 900,
            cast_size: 6,
            reserved_actor_ids: vec![4724, 2231],
            crew_every: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    actors: BTreeMap<ItemId, ActorEntry>,
    #[serde(default)]
    movies: BTreeMap<ItemId, MovieEntry>,
    #[serde(default)]
    popular: Vec<PopularActor>,
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_image_base_url")]
    image_base_url: String,
    #[serde(default)]
    failing_actors: BTreeSet<ItemId>,
    #[serde(default)]
    failing_movies: BTreeSet<ItemId>,
    #[serde(default)]
    failing_pages: BTreeSet<u32>,
    #[serde(skip)]
    lookups: Arc<Mutex<Vec<EntityKey>>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actors: BTreeMap::new(),
            movies: BTreeMap::new(),
            popular: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            failing_actors: BTreeSet::new(),
            failing_movies: BTreeSet::new(),
            failing_pages: BTreeSet::new(),
            lookups: Arc::default(),
        }
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn with_actor(mut self, id: ItemId, name: &str) -> Self {
        self.actors.insert(
            id,
            ActorEntry {
                name: name.to_string(),
                image_path: Some(format!("/actor-{id}.jpg")),
                extra_credits: Vec::new(),
            },
        );
        self
    }

    /// Add a movie; `cast` is `(actor id, character)` in billing order.
    #[must_use]
    pub fn with_movie(
        mut self,
        id: ItemId,
        title: &str,
        release_date: &str,
        cast: &[(ItemId, &str)],
    ) -> Self {
        let cast = cast
            .iter()
            .map(|(actor_id, character)| CastCredit {
                actor_id: *actor_id,
                name: self
                    .actors
                    .get(actor_id)
                    .map_or_else(|| format!("Actor {actor_id}"), |entry| entry.name.clone()),
                profile_path: None,
                character: Some((*character).to_string()),
            })
            .collect();
        self.movies.insert(
            id,
            MovieEntry {
                title: title.to_string(),
                poster_path: Some(format!("/movie-{id}.jpg")),
                release_date: Some(release_date.to_string()),
                genre_ids: Vec::new(),
                cast,
            },
        );
        self
    }

    /// Attach a raw filmography credit that has no matching movie entry.
    #[must_use]
    pub fn with_extra_credit(mut self, actor_id: ItemId, credit: Credit) -> Self {
        if let Some(entry) = self.actors.get_mut(&actor_id) {
            entry.extra_credits.push(credit);
        }
        self
    }

    #[must_use]
    pub fn with_popular(mut self, popular: Vec<PopularActor>) -> Self {
        self.popular = popular;
        self
    }

    /// Popular listing made of English-language actors in the given rank order.
    #[must_use]
    pub fn with_ranked_actors(self, ids: &[ItemId]) -> Self {
        let popular = ids.iter().map(|&id| acting_entry(id)).collect();
        self.with_popular(popular)
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn failing_actor(mut self, id: ItemId) -> Self {
        self.failing_actors.insert(id);
        self
    }

    #[must_use]
    pub fn failing_movie(mut self, id: ItemId) -> Self {
        self.failing_movies.insert(id);
        self
    }

    #[must_use]
    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    #[must_use]
    pub fn actor_ids(&self) -> Vec<ItemId> {
        self.actors.keys().copied().collect()
    }

    #[must_use]
    pub fn actor_name(&self, id: ItemId) -> Option<&str> {
        self.actors.get(&id).map(|entry| entry.name.as_str())
    }

    /// Every lookup served so far, in order. Clones share one log.
    #[must_use]
    pub fn lookups(&self) -> Vec<EntityKey> {
        self.lookups
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    /// Number of detail lookups served for one entity.
    #[must_use]
    pub fn lookup_count(&self, key: EntityKey) -> usize {
        self.lookups().iter().filter(|seen| **seen == key).count()
    }

    fn record(&self, key: EntityKey) {
        if let Ok(mut seen) = self.lookups.lock() {
            seen.push(key);
        }
    }

    /// Deterministic random film graph.
    ///
    /// Movie `j` always bills actors `j % n` and `(j + 1) % n`, so the graph
    /// is connected whenever there are at least as many movies as actors.
    #[must_use]
    pub fn synthetic(seed: u64, spec: &SyntheticSpec) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let actor_count = spec.actors.max(2);
        let mut actor_ids: Vec<ItemId> = spec.reserved_actor_ids.clone();
        let mut next_id: ItemId = 10_000;
        while actor_ids.len() < actor_count {
            if !actor_ids.contains(&next_id) {
                actor_ids.push(next_id);
            }
            next_id += 1;
        }
        actor_ids.truncate(actor_count);
        actor_ids.shuffle(&mut rng);

        let mut catalog = Self::new();
        for (index, &id) in actor_ids.iter().enumerate() {
            catalog = catalog.with_actor(id, &format!("Performer {index:03}"));
        }

        for j in 0..spec.movies {
            let movie_id = 10_000 + j as ItemId;
            let mut cast_ids = vec![
                actor_ids[j % actor_count],
                actor_ids[(j + 1) % actor_count],
            ];
            while cast_ids.len() < spec.cast_size.clamp(2, actor_count) {
                let candidate = actor_ids[rng.gen_range(0..actor_count)];
                if !cast_ids.contains(&candidate) {
                    cast_ids.push(candidate);
                }
            }
            let cast: Vec<(ItemId, String)> = cast_ids
                .iter()
                .enumerate()
                .map(|(slot, &id)| (id, format!("Role {slot} of Feature {j}")))
                .collect();
            let cast_refs: Vec<(ItemId, &str)> =
                cast.iter().map(|(id, role)| (*id, role.as_str())).collect();
            let year = rng.gen_range(1950..2025);
            catalog = catalog.with_movie(
                movie_id,
                &format!("Feature {j:04}"),
                &format!("{year}-06-01"),
                &cast_refs,
            );
        }

        for (index, &id) in actor_ids.iter().enumerate().step_by(5) {
            let mut documentary = synthetic_credit(900_000 + index as ItemId, "Documentary");
            documentary.genre_ids.push(99);
            catalog = catalog.with_extra_credit(id, documentary);
        }

        let mut popular = Vec::with_capacity(actor_count + actor_count / spec.crew_every.max(1));
        let mut crew_id: ItemId = 800_000;
        for (rank, &id) in actor_ids.iter().enumerate() {
            if spec.crew_every > 0 && rank % spec.crew_every == spec.crew_every - 1 {
                popular.push(PopularActor {
                    id: crew_id,
                    department: String::from("Directing"),
                    adult: false,
                    known_for_languages: vec![String::from("en")],
                });
                crew_id += 1;
            }
            popular.push(acting_entry(id));
        }
        catalog.with_popular(popular)
    }
}

fn acting_entry(id: ItemId) -> PopularActor {
    PopularActor {
        id,
        department: String::from("Acting"),
        adult: false,
        known_for_languages: vec![String::from("en")],
    }
}

fn synthetic_credit(movie_id: ItemId, title: &str) -> Credit {
    Credit {
        movie_id,
        title: title.to_string(),
        poster_path: None,
        character: Some(String::from("Self")),
        release_date: Some(String::from("2015-01-01")),
        is_video: false,
        genre_ids: Vec::new(),
        media: CreditMedia::Movie,
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_image_base_url() -> String {
    DEFAULT_IMAGE_BASE_URL.to_string()
}

#[async_trait]
impl MetadataProvider for MemoryCatalog {
    async fn fetch_actor_detail(&self, id: ItemId) -> Result<ActorDetail, ProviderError> {
        self.record(EntityKey::actor(id));
        if self.failing_actors.contains(&id) {
            return Err(ProviderError::Network(format!("actor {id} unavailable")));
        }
        let entry = self
            .actors
            .get(&id)
            .ok_or(ProviderError::NotFound { kind: "actor", id })?;

        let mut credits: Vec<Credit> = self
            .movies
            .iter()
            .filter_map(|(movie_id, movie)| {
                let member = movie.cast.iter().find(|member| member.actor_id == id)?;
                Some(Credit {
                    movie_id: *movie_id,
                    title: movie.title.clone(),
                    poster_path: movie.poster_path.clone(),
                    character: member.character.clone(),
                    release_date: movie.release_date.clone(),
                    is_video: false,
                    genre_ids: movie.genre_ids.clone(),
                    media: CreditMedia::Movie,
                })
            })
            .collect();
        credits.extend(entry.extra_credits.iter().cloned());

        Ok(ActorDetail {
            name: entry.name.clone(),
            image_path: entry.image_path.clone(),
            credits,
        })
    }

    async fn fetch_movie_detail(&self, id: ItemId) -> Result<MovieDetail, ProviderError> {
        self.record(EntityKey::movie(id));
        if self.failing_movies.contains(&id) {
            return Err(ProviderError::Network(format!("movie {id} unavailable")));
        }
        let entry = self
            .movies
            .get(&id)
            .ok_or(ProviderError::NotFound { kind: "movie", id })?;
        Ok(MovieDetail {
            title: entry.title.clone(),
            poster_path: entry.poster_path.clone(),
            release_date: entry.release_date.clone(),
            cast: entry.cast.clone(),
        })
    }
}

#[async_trait]
impl PoolProvider for MemoryCatalog {
    async fn fetch_popular_actor_page(
        &self,
        page: u32,
    ) -> Result<Vec<PopularActor>, ProviderError> {
        if self.failing_pages.contains(&page) {
            return Err(ProviderError::Status {
                status: 503,
                resource: format!("popular page {page}"),
            });
        }
        let start = (page.saturating_sub(1) as usize).saturating_mul(self.page_size);
        Ok(self
            .popular
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect())
    }

    async fn fetch_image_base_url(&self) -> Result<String, ProviderError> {
        Ok(self.image_base_url.clone())
    }
}
