//! Costar Game Engine
//!
//! Platform-agnostic core of the "link two actors through shared movies"
//! puzzle. Metadata arrives through async provider ports; the crate never
//! picks a runtime and does no I/O of its own.

pub mod catalog;
pub mod chain;
pub mod character;
pub mod config;
pub mod display;
pub mod error;
pub mod item;
pub mod matchmaker;
pub mod pool;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod settings;

use log::{info, warn};
use once_cell::sync::OnceCell;
use rand::Rng;

// Re-export commonly used types
pub use catalog::{MemoryCatalog, SyntheticSpec};
pub use chain::{Chain, ChainId, ExtendOutcome, ExtendTicket};
pub use character::{LinkCaption, link_caption, normalize_character};
pub use config::{BandConfig, EligibilityConfig, EngineConfig, EngineConfigError, PoolConfig};
pub use display::{heading, image_url, item_title, success_banner};
pub use error::{GameError, SelectionIssue};
pub use item::{Actor, EntityKey, Item, ItemId, ItemKind, Movie, is_actor, is_movie, same_entity};
pub use matchmaker::{Matchmaker, MatchmakingError, Slot, StartingIds, select_starting_ids};
pub use pool::{Band, CandidatePool};
pub use provider::{
    ActorDetail, CastCredit, Credit, CreditMedia, MetadataProvider, MovieDetail, PoolProvider,
    PopularActor, ProviderError,
};
pub use resolver::ContentResolver;
pub use session::{ExtendStep, OptionView, Removal, Session};
pub use settings::{Difficulty, Settings};

/// Main game engine: owns the provider ports and the per-process caches.
///
/// The candidate pool, the anchor actor and the image base URL are fetched at
/// most once and reused by every game this engine starts.
pub struct GameEngine<M, P>
where
    M: MetadataProvider,
    P: PoolProvider,
{
    resolver: ContentResolver<M>,
    pool_provider: P,
    config: EngineConfig,
    matchmaker: Matchmaker,
    pool: OnceCell<CandidatePool>,
    image_base_url: OnceCell<String>,
}

impl<M, P> GameEngine<M, P>
where
    M: MetadataProvider,
    P: PoolProvider,
{
    /// Create a new engine over the given providers
    pub fn new(metadata: M, pool_provider: P, config: EngineConfig) -> Self {
        Self {
            resolver: ContentResolver::new(metadata, config.eligibility.clone()),
            pool_provider,
            config,
            matchmaker: Matchmaker::new(),
            pool: OnceCell::new(),
            image_base_url: OnceCell::new(),
        }
    }

    /// Like [`GameEngine::new`], but rejects a configuration that fails
    /// [`EngineConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] with the first violated invariant.
    pub fn try_new(
        metadata: M,
        pool_provider: P,
        config: EngineConfig,
    ) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self::new(metadata, pool_provider, config))
    }

    /// Seed the candidate pool instead of paging the provider for it.
    #[must_use]
    pub fn with_pool(self, pool: CandidatePool) -> Self {
        let _ = self.pool.set(pool);
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn resolver(&self) -> &ContentResolver<M> {
        &self.resolver
    }

    pub const fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    /// The process-wide candidate pool, populated on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ProviderFailure`] if a listing page fails to load.
    pub async fn candidate_pool(&self) -> Result<&CandidatePool, GameError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = CandidatePool::populate(&self.pool_provider, &self.config.pool).await?;
        Ok(self.pool.get_or_init(|| pool))
    }

    /// Image base URL from the provider's configuration, fetched once.
    ///
    /// A failed lookup is logged and yields an empty base; it is retried on
    /// the next call.
    pub async fn image_base_url(&self) -> &str {
        if let Some(base) = self.image_base_url.get() {
            return base;
        }
        match self.pool_provider.fetch_image_base_url().await {
            Ok(base) => self.image_base_url.get_or_init(|| base).as_str(),
            Err(err) => {
                warn!("image configuration lookup failed: {err}");
                ""
            }
        }
    }

    /// Display URL for an item's image, if it has one.
    pub async fn image_url_for(&self, item: &Item) -> Option<String> {
        let path = item.image_path()?;
        let base = self.image_base_url().await;
        Some(image_url(base, self.config.image_width, path))
    }

    /// Start a new game: draw and resolve the starting pair for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be loaded, a band cannot supply an
    /// acceptable actor, or either starting actor fails to resolve.
    pub async fn new_game<R: Rng + ?Sized>(
        &self,
        settings: Settings,
        rng: &mut R,
    ) -> Result<Session, GameError> {
        let pool = self.candidate_pool().await?;
        let (first, second) = self
            .matchmaker
            .select_starting_pair(&settings, pool, &self.resolver, &self.config, rng)
            .await?;
        info!(
            "new {} game: {} ({}) vs {} ({})",
            settings.difficulty.key(),
            first.name,
            first.id,
            second.name,
            second.id
        );
        Ok(Session::new(
            settings,
            first,
            second,
            self.config.excluded_actor_id,
        ))
    }

    /// Choose option `choice` offered at `at_index` of `chain`, or cut the
    /// chain back with `None`, and hydrate the chosen item.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSelection`] if the choice is not on offer.
    /// Hydration failures are not errors: the item is appended with no options.
    pub async fn extend(
        &self,
        session: &mut Session,
        chain: ChainId,
        at_index: usize,
        choice: Option<usize>,
    ) -> Result<ExtendOutcome, GameError> {
        match session.prepare_extend(chain, at_index, choice)? {
            ExtendStep::Done(outcome) => Ok(outcome),
            ExtendStep::Hydrate(ticket) => {
                let resolved = self.hydrate(&ticket).await;
                Ok(session.complete_extend(ticket, resolved))
            }
        }
    }

    /// Fetch full detail for the option a ticket carries.
    pub async fn hydrate(&self, ticket: &ExtendTicket) -> Option<Item> {
        self.resolver
            .resolve(ticket.choice.kind(), ticket.choice.id())
            .await
    }

    /// Remove a link and everything after it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSelection`] for the starting actor or an
    /// index past the end of the chain.
    pub fn remove(
        &self,
        session: &mut Session,
        chain: ChainId,
        at_index: usize,
    ) -> Result<Removal, GameError> {
        session.remove(chain, at_index)
    }
}
