//! Alternating actor/movie chains and the bookkeeping for in-flight extends.
use log::warn;
use serde::{Deserialize, Serialize};

use crate::character::LinkCaption;
use crate::item::{Actor, Item};

/// Which of the two chains an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainId {
    A,
    B,
}

impl ChainId {
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Ordered items starting at an actor and strictly alternating kind.
///
/// `version` increases on every mutation so that a hydration started against
/// an older shape of the chain can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    items: Vec<Item>,
    version: u64,
}

impl Chain {
    #[must_use]
    pub fn new(start: Actor) -> Self {
        Self {
            items: vec![Item::Actor(start)],
            version: 0,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Item> {
        self.items.last()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Replace the chain with a single starting actor.
    pub fn reset(&mut self, start: Actor) {
        self.items.clear();
        self.items.push(Item::Actor(start));
        self.bump();
    }

    /// Keep the first `len` items. The starting actor always survives.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len.max(1));
        self.bump();
    }

    /// Append an item of the opposite kind to the current last item.
    ///
    /// Returns `false` and leaves the chain untouched if the item would break
    /// alternation.
    pub fn push(&mut self, item: Item) -> bool {
        let alternates = self
            .items
            .last()
            .is_none_or(|last| last.kind() != item.kind());
        if !alternates {
            warn!(
                "refusing to append {} {} after another {}",
                item.kind().key(),
                item.id(),
                item.kind().key()
            );
            return false;
        }
        self.items.push(item);
        self.bump();
        true
    }

    /// Actor first, then strictly alternating.
    #[must_use]
    pub fn is_alternating(&self) -> bool {
        self.items.first().is_some_and(Item::is_actor)
            && self
                .items
                .windows(2)
                .all(|pair| pair[0].kind() != pair[1].kind())
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// A pending extend waiting for the chosen option to be hydrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendTicket {
    pub chain: ChainId,
    /// Index of the item the option was chosen from.
    pub index: usize,
    /// Chain version captured when the ticket was issued.
    pub version: u64,
    /// The option as offered, before hydration.
    pub choice: Item,
    pub caption: Option<LinkCaption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtendOutcome {
    /// The hydrated option now sits at `index`.
    Appended {
        chain: ChainId,
        index: usize,
        caption: Option<LinkCaption>,
    },
    /// No option chosen; the chain was cut back to `len` items.
    Truncated { chain: ChainId, len: usize },
    /// The option matched the other chain's endpoint. Nothing was appended.
    Won {
        chain: ChainId,
        caption: Option<LinkCaption>,
    },
    /// The chain changed while the option was hydrating.
    Discarded { chain: ChainId },
}

impl ExtendOutcome {
    #[must_use]
    pub const fn chain(&self) -> ChainId {
        match self {
            Self::Appended { chain, .. }
            | Self::Truncated { chain, .. }
            | Self::Won { chain, .. }
            | Self::Discarded { chain } => *chain,
        }
    }

    #[must_use]
    pub const fn is_win(&self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Movie;

    fn bacon() -> Actor {
        Actor::new(4724, "Kevin Bacon")
    }

    #[test]
    fn push_enforces_alternation() {
        let mut chain = Chain::new(bacon());
        assert!(!chain.push(Actor::new(31, "Tom Hanks").into()));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.version(), 0);

        assert!(chain.push(Movie::new(568, "Apollo 13", Some(1995)).into()));
        assert!(chain.push(Actor::new(31, "Tom Hanks").into()));
        assert!(chain.is_alternating());
        assert_eq!(chain.version(), 2);
    }

    #[test]
    fn truncate_keeps_starting_actor() {
        let mut chain = Chain::new(bacon());
        chain.push(Movie::new(568, "Apollo 13", Some(1995)).into());
        chain.truncate(0);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.last().map(Item::id), Some(4724));
        assert_eq!(chain.version(), 2);
    }

    #[test]
    fn reset_replaces_everything() {
        let mut chain = Chain::new(bacon());
        chain.push(Movie::new(568, "Apollo 13", Some(1995)).into());
        chain.reset(Actor::new(31, "Tom Hanks"));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.items()[0].name(), "Tom Hanks");
    }

    #[test]
    fn chain_ids_pair_up() {
        assert_eq!(ChainId::A.other(), ChainId::B);
        assert_eq!(ChainId::B.other(), ChainId::A);
    }
}
