//! Ports to the external metadata and popular-actor services.
//!
//! The engine never talks to the network itself. Platform code implements
//! [`MetadataProvider`] and [`PoolProvider`] (a live HTTP client, an in-memory
//! catalog, a recorded fixture) and hands them to [`crate::GameEngine`].
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemId;

/// Failures raised by provider implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("provider returned status {status} for {resource}")]
    Status { status: u16, resource: String },
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: ItemId },
}

/// Whether a filmography credit is a film or a television appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreditMedia {
    #[default]
    Movie,
    Tv,
}

/// One entry of an actor's filmography as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub movie_id: ItemId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    /// `YYYY-MM-DD`, possibly empty or missing for unreleased titles.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Direct-to-video and other non-feature releases.
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub media: CreditMedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorDetail {
    pub name: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub credits: Vec<Credit>,
}

/// One billed cast member of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastCredit {
    pub actor_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub cast: Vec<CastCredit>,
}

/// Entry of the popular-people listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularActor {
    pub id: ItemId,
    /// Department the person is best known for, e.g. `Acting`.
    pub department: String,
    #[serde(default)]
    pub adult: bool,
    /// Original languages of the titles the person is known for.
    #[serde(default)]
    pub known_for_languages: Vec<String>,
}

/// Actor and movie detail lookups.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch an actor with their full filmography.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the payload cannot be decoded.
    async fn fetch_actor_detail(&self, id: ItemId) -> Result<ActorDetail, ProviderError>;

    /// Fetch a movie with its billed cast.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the payload cannot be decoded.
    async fn fetch_movie_detail(&self, id: ItemId) -> Result<MovieDetail, ProviderError>;
}

/// Popular-actor listing and display configuration.
#[async_trait]
pub trait PoolProvider: Send + Sync {
    /// Fetch one page (1-based) of the popular-people listing, most popular first.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched or decoded.
    async fn fetch_popular_actor_page(&self, page: u32)
    -> Result<Vec<PopularActor>, ProviderError>;

    /// Base URL that image paths are appended to.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration lookup fails.
    async fn fetch_image_base_url(&self) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: MetadataProvider + ?Sized> MetadataProvider for Arc<T> {
    async fn fetch_actor_detail(&self, id: ItemId) -> Result<ActorDetail, ProviderError> {
        (**self).fetch_actor_detail(id).await
    }

    async fn fetch_movie_detail(&self, id: ItemId) -> Result<MovieDetail, ProviderError> {
        (**self).fetch_movie_detail(id).await
    }
}

#[async_trait]
impl<T: PoolProvider + ?Sized> PoolProvider for Arc<T> {
    async fn fetch_popular_actor_page(
        &self,
        page: u32,
    ) -> Result<Vec<PopularActor>, ProviderError> {
        (**self).fetch_popular_actor_page(page).await
    }

    async fn fetch_image_base_url(&self) -> Result<String, ProviderError> {
        (**self).fetch_image_base_url().await
    }
}
