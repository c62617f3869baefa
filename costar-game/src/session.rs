//! Game session: two chains, the win flag and the operations that mutate them.
//!
//! Extending a chain is split in two so the engine stays free of any runtime:
//! [`Session::prepare_extend`] validates the choice and either finishes
//! immediately or hands back an [`ExtendTicket`]; once the option has been
//! hydrated, [`Session::complete_extend`] commits it. Any mutation of the
//! chain in between invalidates the ticket.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainId, ExtendOutcome, ExtendTicket};
use crate::character::link_caption;
use crate::error::{GameError, SelectionIssue};
use crate::item::{Actor, EntityKey, Item, ItemId};
use crate::settings::Settings;

/// Result of validating an extend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendStep {
    /// Nothing left to fetch.
    Done(ExtendOutcome),
    /// The chosen option must be hydrated before it can be appended.
    Hydrate(ExtendTicket),
}

/// One choosable option, as the presentation layer shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub index: usize,
    pub key: EntityKey,
    pub name: String,
    pub year: Option<i32>,
    pub character: Option<String>,
    /// False for the excluded actor when settings forbid it.
    pub enabled: bool,
}

/// Reported by [`Session::remove`] so the caller can move focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub chain: ChainId,
    /// Index of the removed item; the chain now has this many items.
    pub index: usize,
    /// Item that should receive focus, the new last item.
    pub focus_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    chain_a: Chain,
    chain_b: Chain,
    success: bool,
    settings: Settings,
    excluded_actor_id: ItemId,
}

impl Session {
    #[must_use]
    pub fn new(
        settings: Settings,
        start_a: Actor,
        start_b: Actor,
        excluded_actor_id: ItemId,
    ) -> Self {
        Self {
            chain_a: Chain::new(start_a),
            chain_b: Chain::new(start_b),
            success: false,
            settings,
            excluded_actor_id,
        }
    }

    #[must_use]
    pub const fn chain(&self, id: ChainId) -> &Chain {
        match id {
            ChainId::A => &self.chain_a,
            ChainId::B => &self.chain_b,
        }
    }

    const fn chain_mut(&mut self, id: ChainId) -> &mut Chain {
        match id {
            ChainId::A => &mut self.chain_a,
            ChainId::B => &mut self.chain_b,
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Starting actors of chains A and B.
    #[must_use]
    pub fn starting_names(&self) -> (&str, &str) {
        fn name(chain: &Chain) -> &str {
            chain.get(0).map_or("", Item::name)
        }
        (name(&self.chain_a), name(&self.chain_b))
    }

    /// Links between the two starting actors.
    ///
    /// `None` while both chains hold only their starting actor.
    #[must_use]
    pub fn link_count(&self) -> Option<usize> {
        let (a, b) = (self.chain_a.len(), self.chain_b.len());
        if a <= 1 && b <= 1 {
            return None;
        }
        Some((a + b - 1) / 2)
    }

    pub fn on_winning_move(&mut self) {
        self.success = true;
    }

    /// Put a new starting actor at the head of a chain.
    pub fn reset(&mut self, chain: ChainId, start: Actor) {
        self.chain_mut(chain).reset(start);
        self.success = false;
    }

    /// Options offered by the item at `at_index`, in display order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSelection`] if there is no item at that index.
    pub fn options(&self, chain: ChainId, at_index: usize) -> Result<Vec<OptionView>, GameError> {
        let item = self
            .chain(chain)
            .get(at_index)
            .ok_or(GameError::InvalidSelection {
                chain,
                index: at_index,
                reason: SelectionIssue::IndexOutOfRange,
            })?;
        Ok((0..item.option_count())
            .filter_map(|index| item.option_at(index).map(|option| (index, option)))
            .map(|(index, option)| OptionView {
                index,
                key: option.key(),
                name: option.name().to_string(),
                year: match &option {
                    Item::Movie(movie) => movie.year,
                    Item::Actor(_) => None,
                },
                character: option.character().map(str::to_string),
                enabled: self.is_enabled(&option),
            })
            .collect())
    }

    fn is_enabled(&self, option: &Item) -> bool {
        self.settings.allow_excluded_actor
            || !(option.is_actor() && option.id() == self.excluded_actor_id)
    }

    /// Validate a choice made at `at_index` and apply whatever needs no fetch.
    ///
    /// `None` cuts the chain back to `at_index + 1`. A choice matching the
    /// other chain's endpoint wins without appending. Any other choice cuts
    /// the chain back and returns a ticket for hydration.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSelection`] and leaves the session untouched
    /// if the index or option is not valid.
    pub fn prepare_extend(
        &mut self,
        chain: ChainId,
        at_index: usize,
        choice: Option<usize>,
    ) -> Result<ExtendStep, GameError> {
        let invalid = |reason| GameError::InvalidSelection {
            chain,
            index: at_index,
            reason,
        };
        let from = self
            .chain(chain)
            .get(at_index)
            .ok_or_else(|| invalid(SelectionIssue::IndexOutOfRange))?;

        let Some(option_index) = choice else {
            let target = self.chain_mut(chain);
            target.truncate(at_index + 1);
            let len = target.len();
            self.success = false;
            return Ok(ExtendStep::Done(ExtendOutcome::Truncated { chain, len }));
        };

        let option = from
            .option_at(option_index)
            .ok_or_else(|| invalid(SelectionIssue::OptionOutOfRange))?;
        if !self.is_enabled(&option) {
            return Err(invalid(SelectionIssue::OptionDisabled));
        }
        let caption = link_caption(from, &option, at_index);

        if self.matches_other_end(chain, &option) {
            debug!(
                "winning move on chain {chain:?}: {} {} meets the other chain",
                option.kind().key(),
                option.id()
            );
            self.on_winning_move();
            return Ok(ExtendStep::Done(ExtendOutcome::Won { chain, caption }));
        }

        let target = self.chain_mut(chain);
        target.truncate(at_index + 1);
        let version = target.version();
        self.success = false;
        Ok(ExtendStep::Hydrate(ExtendTicket {
            chain,
            index: at_index,
            version,
            choice: option,
            caption,
        }))
    }

    /// Commit a hydrated option.
    ///
    /// `resolved` is `None` when hydration failed; the option is then
    /// appended as a dead end with no options of its own.
    pub fn complete_extend(
        &mut self,
        ticket: ExtendTicket,
        resolved: Option<Item>,
    ) -> ExtendOutcome {
        let ExtendTicket {
            chain,
            index,
            version,
            choice,
            caption,
        } = ticket;

        if self.chain(chain).version() != version {
            debug!(
                "discarding stale hydration of {} {} for chain {chain:?}",
                choice.kind().key(),
                choice.id()
            );
            return ExtendOutcome::Discarded { chain };
        }
        if self.matches_other_end(chain, &choice) {
            self.on_winning_move();
            return ExtendOutcome::Won { chain, caption };
        }

        let item = match resolved {
            Some(item) if item.same_entity(&choice) => {
                item.with_character(choice.character().map(str::to_string))
            }
            _ => choice.into_dead_end(),
        };
        let target = self.chain_mut(chain);
        target.truncate(index + 1);
        if !target.push(item) {
            return ExtendOutcome::Discarded { chain };
        }
        self.success = false;
        ExtendOutcome::Appended {
            chain,
            index: index + 1,
            caption,
        }
    }

    /// Remove the item at `at_index` and everything after it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSelection`] for the starting actor or an
    /// index past the end.
    pub fn remove(&mut self, chain: ChainId, at_index: usize) -> Result<Removal, GameError> {
        let reason = if at_index == 0 {
            Some(SelectionIssue::StartingItem)
        } else if at_index >= self.chain(chain).len() {
            Some(SelectionIssue::IndexOutOfRange)
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(GameError::InvalidSelection {
                chain,
                index: at_index,
                reason,
            });
        }

        self.chain_mut(chain).truncate(at_index);
        self.success = false;
        Ok(Removal {
            chain,
            index: at_index,
            focus_index: at_index - 1,
        })
    }

    fn matches_other_end(&self, chain: ChainId, option: &Item) -> bool {
        self.chain(chain.other())
            .last()
            .is_some_and(|last| last.same_entity(option))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Movie;
    use crate::settings::Difficulty;

    const EXCLUDED: ItemId = 2231;

    fn footloose() -> Movie {
        let mut movie = Movie::new(1788, "Footloose", Some(1984));
        movie.character = Some("Ren McCormack".into());
        movie
    }

    fn diner() -> Movie {
        let mut movie = Movie::new(13105, "Diner", Some(1982));
        movie.character = Some("Timothy Fenwick Jr.".into());
        movie
    }

    fn session(settings: Settings) -> Session {
        let bacon = Actor::new(4724, "Kevin Bacon").with_movies(vec![footloose(), diner()]);
        let lithgow = Actor::new(12074, "John Lithgow").with_movies(vec![footloose()]);
        Session::new(settings, bacon, lithgow, EXCLUDED)
    }

    fn hydrated_footloose() -> Item {
        let mut cast = vec![
            Actor::new(4724, "Kevin Bacon"),
            Actor::new(12074, "John Lithgow"),
            Actor::new(EXCLUDED, "Excluded Actor"),
        ];
        cast[1].character = Some("Rev. Shaw Moore".into());
        Movie::new(1788, "Footloose", Some(1984)).with_cast(cast).into()
    }

    fn extend_with(
        session: &mut Session,
        chain: ChainId,
        at: usize,
        choice: usize,
        resolved: Option<Item>,
    ) -> ExtendOutcome {
        match session.prepare_extend(chain, at, Some(choice)).unwrap() {
            ExtendStep::Done(outcome) => outcome,
            ExtendStep::Hydrate(ticket) => session.complete_extend(ticket, resolved),
        }
    }

    #[test]
    fn starting_names_come_from_chain_heads() {
        let mut session = session(Settings::default());
        let names = session.starting_names();
        assert_eq!(names, ("Kevin Bacon", "John Lithgow"));

        extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));
        let (a, b) = session.starting_names();
        assert_eq!(crate::display::heading(a, b), "Link Kevin Bacon to John Lithgow");
    }

    #[test]
    fn link_count_follows_chain_lengths() {
        let mut session = session(Settings::default());
        assert_eq!(session.link_count(), None);

        extend_with(&mut session, ChainId::A, 0, 1, Some(diner().into()));
        session.chain_mut(ChainId::A).push(Actor::new(1, "Someone").into());
        assert_eq!(session.chain(ChainId::A).len(), 3);
        assert_eq!(session.link_count(), Some(1));

        let other = Movie::new(5, "Other", Some(2000)).with_cast(Vec::new());
        session.chain_mut(ChainId::B).push(other.into());
        session.chain_mut(ChainId::B).push(Actor::new(1, "Someone").into());
        assert_eq!(session.link_count(), Some(2));
    }

    #[test]
    fn extend_appends_hydrated_option_with_character() {
        let mut session = session(Settings::default());
        let outcome = extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));

        let ExtendOutcome::Appended { index, caption, .. } = outcome else {
            panic!("expected append, got {outcome:?}");
        };
        assert_eq!(index, 1);
        assert_eq!(caption.unwrap().label, "played Ren McCormack in...");

        let chain = session.chain(ChainId::A);
        assert_eq!(chain.len(), 2);
        let appended = chain.last().unwrap();
        assert_eq!(appended.option_count(), 3);
        assert_eq!(appended.character(), Some("Ren McCormack"));
        assert!(chain.is_alternating());
    }

    #[test]
    fn failed_hydration_appends_dead_end() {
        let mut session = session(Settings::default());
        extend_with(&mut session, ChainId::A, 0, 1, None);
        let last = session.chain(ChainId::A).last().unwrap();
        assert_eq!(last.name(), "Diner");
        assert!(last.is_hydrated());
        assert_eq!(last.option_count(), 0);
    }

    #[test]
    fn editing_a_past_link_discards_later_items() {
        let mut session = session(Settings::default());
        extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));
        extend_with(&mut session, ChainId::A, 1, 0, None);
        assert_eq!(session.chain(ChainId::A).len(), 3);

        extend_with(&mut session, ChainId::A, 0, 1, Some(diner().with_cast(Vec::new()).into()));
        let chain = session.chain(ChainId::A);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.last().unwrap().name(), "Diner");
    }

    #[test]
    fn empty_choice_truncates() {
        let mut session = session(Settings::default());
        extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));
        let step = session.prepare_extend(ChainId::A, 0, None).unwrap();
        assert_eq!(
            step,
            ExtendStep::Done(ExtendOutcome::Truncated {
                chain: ChainId::A,
                len: 1
            })
        );
        assert_eq!(session.chain(ChainId::A).len(), 1);
    }

    #[test]
    fn remove_undoes_extend() {
        let mut session = session(Settings::default());
        let before = session.chain(ChainId::A).items().to_vec();
        extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));

        let removal = session.remove(ChainId::A, 1).unwrap();
        assert_eq!(
            removal,
            Removal {
                chain: ChainId::A,
                index: 1,
                focus_index: 0
            }
        );
        assert_eq!(session.chain(ChainId::A).items(), before.as_slice());
    }

    #[test]
    fn starting_actor_cannot_be_removed() {
        let mut session = session(Settings::default());
        let err = session.remove(ChainId::B, 0).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidSelection {
                reason: SelectionIssue::StartingItem,
                ..
            }
        ));
        assert!(session.remove(ChainId::B, 4).is_err());
        assert_eq!(session.chain(ChainId::B).len(), 1);
    }

    #[test]
    fn winning_move_sets_success_without_appending() {
        let mut session = session(Settings::default());
        // Chain B: Lithgow -> Footloose.
        extend_with(&mut session, ChainId::B, 0, 0, Some(hydrated_footloose()));
        // Chain A: Bacon chooses Footloose, which is B's endpoint.
        let outcome = extend_with(&mut session, ChainId::A, 0, 0, None);

        assert!(outcome.is_win());
        assert!(session.success());
        assert_eq!(session.chain(ChainId::A).len(), 1);
        assert_eq!(session.link_count(), Some(1));

        session.remove(ChainId::B, 1).unwrap();
        assert!(!session.success());
    }

    #[test]
    fn invalid_choices_leave_session_untouched() {
        let mut session = session(Settings::default());
        let snapshot = session.clone();

        let out_of_range = session.prepare_extend(ChainId::A, 0, Some(9)).unwrap_err();
        assert!(matches!(
            out_of_range,
            GameError::InvalidSelection {
                reason: SelectionIssue::OptionOutOfRange,
                ..
            }
        ));
        let no_item = session.prepare_extend(ChainId::A, 3, Some(0)).unwrap_err();
        assert!(matches!(
            no_item,
            GameError::InvalidSelection {
                reason: SelectionIssue::IndexOutOfRange,
                ..
            }
        ));
        assert_eq!(session, snapshot);
    }

    #[test]
    fn excluded_actor_is_listed_but_disabled() {
        let settings = Settings::new(Difficulty::Easy).with_excluded_actor(false);
        let mut session = session(settings);
        extend_with(&mut session, ChainId::A, 0, 0, Some(hydrated_footloose()));

        let options = session.options(ChainId::A, 1).unwrap();
        assert_eq!(options.len(), 3);
        assert!(options[1].enabled);
        assert_eq!(options[1].character.as_deref(), Some("Rev. Shaw Moore"));
        assert!(!options[2].enabled);

        let err = session.prepare_extend(ChainId::A, 1, Some(2)).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidSelection {
                reason: SelectionIssue::OptionDisabled,
                ..
            }
        ));
        assert_eq!(session.chain(ChainId::A).len(), 2);
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut session = session(Settings::default());
        let Ok(ExtendStep::Hydrate(stale)) = session.prepare_extend(ChainId::A, 0, Some(0)) else {
            panic!("expected a hydration ticket");
        };
        let Ok(ExtendStep::Hydrate(fresh)) = session.prepare_extend(ChainId::A, 0, Some(1)) else {
            panic!("expected a hydration ticket");
        };

        let fresh_outcome = session.complete_extend(fresh, None);
        assert!(matches!(fresh_outcome, ExtendOutcome::Appended { .. }));
        let stale_outcome = session.complete_extend(stale, Some(hydrated_footloose()));
        assert_eq!(stale_outcome, ExtendOutcome::Discarded { chain: ChainId::A });

        let chain = session.chain(ChainId::A);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.last().unwrap().name(), "Diner");
    }
}
