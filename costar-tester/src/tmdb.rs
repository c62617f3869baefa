//! Live metadata provider over the TMDB v3 REST API.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use costar_game::{
    ActorDetail, CastCredit, Credit, CreditMedia, ItemId, MetadataProvider, MovieDetail,
    PoolProvider, PopularActor, ProviderError,
};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const USER_AGENT: &str = concat!("costar-tester/", env!("CARGO_PKG_VERSION"));
const MIN_REQUEST_INTERVAL_MS: u64 = 25;

/// Spaces requests out by a minimum interval.
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl TmdbClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, TMDB_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            rate_limiter: RateLimiter::new(MIN_REQUEST_INTERVAL_MS),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        self.rate_limiter.wait().await;
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                resource: path.to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_actor_detail(&self, id: ItemId) -> Result<ActorDetail, ProviderError> {
        let person: PersonResponse = self
            .get_json(
                &format!("/person/{id}"),
                &[("append_to_response", "combined_credits".to_string())],
            )
            .await?;
        Ok(person.into())
    }

    async fn fetch_movie_detail(&self, id: ItemId) -> Result<MovieDetail, ProviderError> {
        let movie: MovieResponse = self
            .get_json(
                &format!("/movie/{id}"),
                &[("append_to_response", "credits".to_string())],
            )
            .await?;
        Ok(movie.into())
    }
}

#[async_trait]
impl PoolProvider for TmdbClient {
    async fn fetch_popular_actor_page(
        &self,
        page: u32,
    ) -> Result<Vec<PopularActor>, ProviderError> {
        let listing: PopularResponse = self
            .get_json("/person/popular", &[("page", page.to_string())])
            .await?;
        Ok(listing.results.into_iter().map(Into::into).collect())
    }

    async fn fetch_image_base_url(&self) -> Result<String, ProviderError> {
        let config: ConfigurationResponse = self.get_json("/configuration", &[]).await?;
        Ok(config.images.secure_base_url)
    }
}

#[derive(Debug, Deserialize)]
struct PersonResponse {
    name: String,
    #[serde(default)]
    profile_path: Option<String>,
    #[serde(default)]
    combined_credits: CreditList<PersonCredit>,
}

#[derive(Debug, Deserialize)]
struct CreditList<T> {
    #[serde(default = "Vec::new")]
    cast: Vec<T>,
}

impl<T> Default for CreditList<T> {
    fn default() -> Self {
        Self { cast: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct PersonCredit {
    id: ItemId,
    /// Movies carry `title`, series carry `name`.
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    video: bool,
    #[serde(default)]
    genre_ids: Vec<u32>,
    #[serde(default)]
    media_type: Option<String>,
}

impl From<PersonResponse> for ActorDetail {
    fn from(person: PersonResponse) -> Self {
        let credits = person
            .combined_credits
            .cast
            .into_iter()
            .map(|credit| Credit {
                movie_id: credit.id,
                title: credit.title.or(credit.name).unwrap_or_default(),
                poster_path: credit.poster_path,
                character: credit.character,
                release_date: credit.release_date,
                is_video: credit.video,
                genre_ids: credit.genre_ids,
                media: match credit.media_type.as_deref() {
                    Some("tv") => CreditMedia::Tv,
                    _ => CreditMedia::Movie,
                },
            })
            .collect();
        Self {
            name: person.name,
            image_path: person.profile_path,
            credits,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    credits: CreditList<MovieCastMember>,
}

#[derive(Debug, Deserialize)]
struct MovieCastMember {
    id: ItemId,
    name: String,
    #[serde(default)]
    profile_path: Option<String>,
    #[serde(default)]
    character: Option<String>,
}

impl From<MovieResponse> for MovieDetail {
    fn from(movie: MovieResponse) -> Self {
        Self {
            title: movie.title,
            poster_path: movie.poster_path,
            release_date: movie.release_date,
            cast: movie
                .credits
                .cast
                .into_iter()
                .map(|member| CastCredit {
                    actor_id: member.id,
                    name: member.name,
                    profile_path: member.profile_path,
                    character: member.character,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PopularResponse {
    #[serde(default)]
    results: Vec<PopularPerson>,
}

#[derive(Debug, Deserialize)]
struct PopularPerson {
    id: ItemId,
    #[serde(default)]
    known_for_department: Option<String>,
    #[serde(default)]
    adult: bool,
    #[serde(default)]
    known_for: Vec<KnownFor>,
}

#[derive(Debug, Deserialize)]
struct KnownFor {
    #[serde(default)]
    original_language: Option<String>,
}

impl From<PopularPerson> for PopularActor {
    fn from(person: PopularPerson) -> Self {
        let mut known_for_languages: Vec<String> = person
            .known_for
            .into_iter()
            .filter_map(|title| title.original_language)
            .collect();
        known_for_languages.dedup();
        Self {
            id: person.id,
            department: person.known_for_department.unwrap_or_default(),
            adult: person.adult,
            known_for_languages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigurationResponse {
    images: ImageConfiguration,
}

#[derive(Debug, Deserialize)]
struct ImageConfiguration {
    secure_base_url: String,
}
