use costar_game::{
    Actor, Band, CandidatePool, ChainId, Difficulty, EngineConfig, EntityKey, ExtendOutcome,
    ExtendStep, GameEngine, GameError, ItemId, MatchmakingError, MemoryCatalog, Settings,
    SyntheticSpec, success_banner,
};
use futures::executor::block_on;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

type Engine = GameEngine<MemoryCatalog, MemoryCatalog>;

const ANCHOR: ItemId = 4724;
const LITHGOW: ItemId = 12074;

fn engine(catalog: &MemoryCatalog) -> Engine {
    GameEngine::new(catalog.clone(), catalog.clone(), EngineConfig::default())
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let catalog = MemoryCatalog::new();
    let config = EngineConfig {
        max_sample_attempts: 0,
        ..EngineConfig::default()
    };
    let Err(err) = GameEngine::try_new(catalog.clone(), catalog.clone(), config) else {
        panic!("zero sample attempts should be rejected");
    };
    assert!(matches!(err, GameError::Config(_)), "{err}");

    assert!(GameEngine::try_new(catalog.clone(), catalog, EngineConfig::default()).is_ok());
}

fn synthetic(seed: u64) -> MemoryCatalog {
    MemoryCatalog::synthetic(
        seed,
        &SyntheticSpec {
            actors: 120,
            movies: 200,
            ..SyntheticSpec::default()
        },
    )
}

/// Bacon and Lithgow share Footloose; Lithgow is the only bottom-band actor.
fn footloose_catalog() -> (MemoryCatalog, CandidatePool) {
    let catalog = MemoryCatalog::new()
        .with_actor(ANCHOR, "Kevin Bacon")
        .with_actor(LITHGOW, "John Lithgow")
        .with_actor(1, "Top One")
        .with_actor(2, "Top Two")
        .with_actor(3, "Middle")
        .with_movie(
            1788,
            "Footloose",
            "1984-02-17",
            &[(ANCHOR, "Ren McCormack"), (LITHGOW, "Rev. Shaw Moore")],
        );
    (catalog, CandidatePool::from_ids([1, 2, 3, LITHGOW]))
}

#[test]
fn medium_anchor_game_draws_second_actor_from_bottom_band() {
    let mut catalog = MemoryCatalog::new().with_actor(ANCHOR, "Kevin Bacon");
    for id in 1..=1000 {
        catalog = catalog.with_actor(id, &format!("Actor {id}"));
    }
    let pool = CandidatePool::from_ids(1..=1000);
    let engine = engine(&catalog).with_pool(pool.clone());
    let mut rng = ChaCha20Rng::seed_from_u64(0x00C0_FFEE);

    for _ in 0..50 {
        let session = block_on(engine.new_game(Settings::new(Difficulty::Medium), &mut rng)).unwrap();
        let first = session.chain(ChainId::A).items()[0].id();
        let second = session.chain(ChainId::B).items()[0].id();
        assert_eq!(first, ANCHOR);
        let rank = pool.rank_of(second).unwrap();
        assert!((750..=999).contains(&rank), "rank {rank} outside bottom band");
        assert!(!session.success());
        assert_eq!(session.link_count(), None);
    }

    // The anchor is fetched once and served from cache afterwards.
    assert_eq!(catalog.lookup_count(EntityKey::actor(ANCHOR)), 1);
}

#[test]
fn hard_games_never_include_excluded_actor() {
    let catalog = synthetic(3);
    let engine = engine(&catalog);
    let config = engine.config().clone();
    let settings = Settings::new(Difficulty::Hard)
        .with_anchor(false)
        .with_excluded_actor(false);
    let mut rng = ChaCha20Rng::seed_from_u64(17);

    let pool = block_on(engine.candidate_pool()).unwrap().clone();
    let bottom = pool.band(Band::Bottom, &config.bands).to_vec();
    for _ in 0..100 {
        let session = block_on(engine.new_game(settings, &mut rng)).unwrap();
        let (a, b) = (
            session.chain(ChainId::A).items()[0].id(),
            session.chain(ChainId::B).items()[0].id(),
        );
        assert_ne!(a, b);
        for id in [a, b] {
            assert!(bottom.contains(&id));
            assert_ne!(id, config.excluded_actor_id);
            assert_ne!(id, config.anchor_actor_id);
        }
    }
}

#[test]
fn pool_is_populated_once_from_listing() {
    let catalog = synthetic(5);
    let engine = engine(&catalog);

    let first = block_on(engine.candidate_pool()).unwrap();
    let second = block_on(engine.candidate_pool()).unwrap();
    assert!(std::ptr::eq(first, second));
    // 120 actors and a handful of crew entries: the whole listing is read.
    assert_eq!(first.len(), 120);
    assert!(first.ids().iter().all(|id| *id < 800_000));
}

#[test]
fn meeting_chains_win_and_report_link_count() {
    let (catalog, pool) = footloose_catalog();
    let engine = engine(&catalog).with_pool(pool);
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let mut session = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap();
    assert_eq!(session.starting_names(), ("Kevin Bacon", "John Lithgow"));

    let outcome = block_on(engine.extend(&mut session, ChainId::B, 0, Some(0))).unwrap();
    let ExtendOutcome::Appended { caption, .. } = outcome else {
        panic!("expected append, got {outcome:?}");
    };
    assert_eq!(caption.unwrap().label, "played Rev. Shaw Moore in...");

    let outcome = block_on(engine.extend(&mut session, ChainId::A, 0, Some(0))).unwrap();
    assert!(outcome.is_win());
    assert!(session.success());
    assert_eq!(session.chain(ChainId::A).len(), 1);
    assert_eq!(session.link_count(), Some(1));
    assert_eq!(success_banner(1), "You did it in 1 link!");
}

#[test]
fn stale_hydration_does_not_resurrect_truncated_links() {
    let (catalog, pool) = footloose_catalog();
    let engine = engine(&catalog).with_pool(pool);
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let mut session = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap();

    let Ok(ExtendStep::Hydrate(ticket)) = session.prepare_extend(ChainId::A, 0, Some(0)) else {
        panic!("expected a hydration ticket");
    };
    let resolved = block_on(engine.hydrate(&ticket));
    // The player cuts the chain back before the fetch lands.
    session.prepare_extend(ChainId::A, 0, None).unwrap();

    let outcome = session.complete_extend(ticket, resolved);
    assert_eq!(outcome, ExtendOutcome::Discarded { chain: ChainId::A });
    assert_eq!(session.chain(ChainId::A).len(), 1);
}

#[test]
fn unavailable_movie_becomes_dead_end() {
    let (catalog, pool) = footloose_catalog();
    let catalog = catalog.failing_movie(1788);
    let engine = engine(&catalog).with_pool(pool);
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let mut session = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap();

    block_on(engine.extend(&mut session, ChainId::A, 0, Some(0))).unwrap();
    let last = session.chain(ChainId::A).last().unwrap();
    assert_eq!(last.name(), "Footloose");
    assert_eq!(last.option_count(), 0);
    assert!(session.options(ChainId::A, 1).unwrap().is_empty());
}

#[test]
fn empty_listing_cannot_seed_a_game() {
    let catalog = MemoryCatalog::new().with_actor(ANCHOR, "Kevin Bacon");
    let engine = engine(&catalog);
    let mut rng = ChaCha20Rng::seed_from_u64(4);

    let err = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap_err();
    assert!(matches!(
        err,
        GameError::EmptyPool(MatchmakingError::BandEmpty { pool_len: 0, .. })
    ));
}

#[test]
fn failed_starting_lookup_fails_new_game() {
    let (catalog, pool) = footloose_catalog();
    let engine = engine(&catalog.failing_actor(LITHGOW)).with_pool(pool);
    let mut rng = ChaCha20Rng::seed_from_u64(5);

    let err = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap_err();
    assert_eq!(err, GameError::StartingActorUnavailable { id: LITHGOW });
}

#[test]
fn image_urls_use_provider_base() {
    let (catalog, pool) = footloose_catalog();
    let engine = engine(&catalog).with_pool(pool);
    let bacon = Actor {
        image_path: Some("/bacon.jpg".into()),
        ..Actor::new(ANCHOR, "Kevin Bacon")
    };
    let url = block_on(engine.image_url_for(&bacon.into()));
    assert_eq!(
        url.as_deref(),
        Some("https://image.example.test/t/p/w154/bacon.jpg")
    );
    assert!(block_on(engine.image_url_for(&Actor::new(1, "No Photo").into())).is_none());
}

#[test]
fn random_play_keeps_chains_alternating() {
    for seed in [11_u64, 12, 13] {
        let catalog = synthetic(seed);
        let engine = engine(&catalog);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut session = block_on(engine.new_game(Settings::default(), &mut rng)).unwrap();

        for _ in 0..80 {
            let chain = if rng.gen_bool(0.5) { ChainId::A } else { ChainId::B };
            let len = session.chain(chain).len();

            if len > 1 && rng.gen_ratio(1, 4) {
                let at = rng.gen_range(1..len);
                let removal = engine.remove(&mut session, chain, at).unwrap();
                assert_eq!(removal.focus_index, at - 1);
                assert_eq!(session.chain(chain).len(), at);
            } else {
                let at = rng.gen_range(0..len);
                let options = session.options(chain, at).unwrap();
                if options.is_empty() {
                    continue;
                }
                let choice = options[rng.gen_range(0..options.len())].index;
                let before = session.chain(chain).items().to_vec();
                let outcome =
                    block_on(engine.extend(&mut session, chain, at, Some(choice))).unwrap();

                if at + 1 == len && matches!(outcome, ExtendOutcome::Appended { .. }) {
                    engine.remove(&mut session, chain, at + 1).unwrap();
                    assert_eq!(session.chain(chain).items(), before.as_slice());
                    block_on(engine.extend(&mut session, chain, at, Some(choice))).unwrap();
                }
            }

            for id in ChainId::BOTH {
                assert!(session.chain(id).is_alternating(), "seed {seed}: {id:?} broke alternation");
            }
        }
    }
}
