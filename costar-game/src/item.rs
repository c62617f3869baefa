//! Actor and movie nodes that make up a chain.
use serde::{Deserialize, Serialize};

/// Numeric identifier assigned by the metadata provider.
///
/// Actor and movie ids live in separate namespaces, so an id alone never
/// identifies an entity; pair it with an [`ItemKind`].
pub type ItemId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Actor,
    Movie,
}

impl ItemKind {
    /// Kind of the options offered by an item of this kind.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Actor => Self::Movie,
            Self::Movie => Self::Actor,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Movie => "movie",
        }
    }
}

/// Identity of an item: `(id, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub id: ItemId,
    pub kind: ItemKind,
}

impl EntityKey {
    #[must_use]
    pub const fn actor(id: ItemId) -> Self {
        Self {
            id,
            kind: ItemKind::Actor,
        }
    }

    #[must_use]
    pub const fn movie(id: ItemId) -> Self {
        Self {
            id,
            kind: ItemKind::Movie,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Character played in the movie this actor was reached from.
    #[serde(default)]
    pub character: Option<String>,
    /// Filmography offered as next links; `None` until hydrated.
    #[serde(default)]
    pub movie_options: Option<Vec<Movie>>,
}

impl Actor {
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image_path: None,
            character: None,
            movie_options: None,
        }
    }

    #[must_use]
    pub fn with_movies(mut self, movies: Vec<Movie>) -> Self {
        self.movie_options = Some(movies);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Character the previous actor in the chain played in this movie.
    #[serde(default)]
    pub character: Option<String>,
    /// Release year; absent when the provider has no usable release date.
    #[serde(default)]
    pub year: Option<i32>,
    /// Cast offered as next links, in provider billing order; `None` until hydrated.
    #[serde(default)]
    pub cast_options: Option<Vec<Actor>>,
}

impl Movie {
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id,
            name: name.into(),
            image_path: None,
            character: None,
            year,
            cast_options: None,
        }
    }

    #[must_use]
    pub fn with_cast(mut self, cast: Vec<Actor>) -> Self {
        self.cast_options = Some(cast);
        self
    }
}

/// A node in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Actor(Actor),
    Movie(Movie),
}

impl Item {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Actor(_) => ItemKind::Actor,
            Self::Movie(_) => ItemKind::Movie,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ItemId {
        match self {
            Self::Actor(actor) => actor.id,
            Self::Movie(movie) => movie.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Actor(actor) => &actor.name,
            Self::Movie(movie) => &movie.name,
        }
    }

    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        match self {
            Self::Actor(actor) => actor.image_path.as_deref(),
            Self::Movie(movie) => movie.image_path.as_deref(),
        }
    }

    #[must_use]
    pub fn character(&self) -> Option<&str> {
        match self {
            Self::Actor(actor) => actor.character.as_deref(),
            Self::Movie(movie) => movie.character.as_deref(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> EntityKey {
        EntityKey {
            id: self.id(),
            kind: self.kind(),
        }
    }

    #[must_use]
    pub const fn is_actor(&self) -> bool {
        matches!(self, Self::Actor(_))
    }

    #[must_use]
    pub const fn is_movie(&self) -> bool {
        matches!(self, Self::Movie(_))
    }

    /// Two items denote the same entity when both id and kind match.
    #[must_use]
    pub const fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id() && matches!(
            (self.kind(), other.kind()),
            (ItemKind::Actor, ItemKind::Actor) | (ItemKind::Movie, ItemKind::Movie)
        )
    }

    /// Whether the option list has been fetched.
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        match self {
            Self::Actor(actor) => actor.movie_options.is_some(),
            Self::Movie(movie) => movie.cast_options.is_some(),
        }
    }

    /// Number of options offered; zero when not hydrated.
    #[must_use]
    pub fn option_count(&self) -> usize {
        match self {
            Self::Actor(actor) => actor.movie_options.as_ref().map_or(0, Vec::len),
            Self::Movie(movie) => movie.cast_options.as_ref().map_or(0, Vec::len),
        }
    }

    /// Clone of the option at `index`, wrapped as an item of the opposite kind.
    #[must_use]
    pub fn option_at(&self, index: usize) -> Option<Self> {
        match self {
            Self::Actor(actor) => actor
                .movie_options
                .as_ref()
                .and_then(|movies| movies.get(index))
                .cloned()
                .map(Self::Movie),
            Self::Movie(movie) => movie
                .cast_options
                .as_ref()
                .and_then(|cast| cast.get(index))
                .cloned()
                .map(Self::Actor),
        }
    }

    /// Identities of the offered options, in order.
    #[must_use]
    pub fn option_keys(&self) -> Vec<EntityKey> {
        match self {
            Self::Actor(actor) => actor
                .movie_options
                .iter()
                .flatten()
                .map(|movie| EntityKey::movie(movie.id))
                .collect(),
            Self::Movie(movie) => movie
                .cast_options
                .iter()
                .flatten()
                .map(|actor| EntityKey::actor(actor.id))
                .collect(),
        }
    }

    /// Replace the character label carried from the previous link.
    #[must_use]
    pub fn with_character(mut self, character: Option<String>) -> Self {
        match &mut self {
            Self::Actor(actor) => actor.character = character,
            Self::Movie(movie) => movie.character = character,
        }
        self
    }

    /// Mark the item as hydrated with an empty option list.
    #[must_use]
    pub fn into_dead_end(mut self) -> Self {
        match &mut self {
            Self::Actor(actor) => actor.movie_options = Some(Vec::new()),
            Self::Movie(movie) => movie.cast_options = Some(Vec::new()),
        }
        self
    }
}

impl From<Actor> for Item {
    fn from(actor: Actor) -> Self {
        Self::Actor(actor)
    }
}

impl From<Movie> for Item {
    fn from(movie: Movie) -> Self {
        Self::Movie(movie)
    }
}

#[must_use]
pub const fn is_actor(item: &Item) -> bool {
    item.is_actor()
}

#[must_use]
pub const fn is_movie(item: &Item) -> bool {
    item.is_movie()
}

#[must_use]
pub const fn same_entity(a: &Item, b: &Item) -> bool {
    a.same_entity(b)
}
