//! Named QA scenarios and the runner that sweeps them across seeds.
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail, ensure};
use colored::Colorize;
use costar_game::{
    CandidatePool, ChainId, Difficulty, EngineConfig, EntityKey, ExtendOutcome, GameEngine, Item,
    ItemId, MetadataProvider, PoolProvider, Session, Settings, Slot, heading, item_title,
    select_starting_ids, success_banner,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::reports::ScenarioResult;
use crate::solver::{self, shortest_connection};
use crate::util::iteration_seed;

const MATCHMAKING_DRAWS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Smoke,
    Matchmaking,
    Playability,
}

impl Scenario {
    pub const ALL: [Self; 3] = [Self::Smoke, Self::Matchmaking, Self::Playability];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Matchmaking => "matchmaking",
            Self::Playability => "playability",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Smoke => "Start a game, extend and remove links on both chains",
            Self::Matchmaking => "Sample starting pairs for every difficulty and check bands",
            Self::Playability => "Solve a game by search and replay it to a winning move",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scenario| scenario.key() == key)
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    Scenario::ALL
        .into_iter()
        .map(|scenario| (scenario.key(), scenario.description()))
        .collect()
}

/// What one successful iteration observed.
#[derive(Debug, Clone, Copy, Default)]
struct IterationReport {
    links: Option<usize>,
}

pub struct ScenarioRunner<'a, M, P>
where
    M: MetadataProvider,
    P: PoolProvider,
{
    engine: &'a GameEngine<M, P>,
    settings: Settings,
    max_expansions: usize,
    verbose: bool,
}

impl<'a, M, P> ScenarioRunner<'a, M, P>
where
    M: MetadataProvider,
    P: PoolProvider,
{
    pub const fn new(
        engine: &'a GameEngine<M, P>,
        settings: Settings,
        max_expansions: usize,
        verbose: bool,
    ) -> Self {
        Self {
            engine,
            settings,
            max_expansions,
            verbose,
        }
    }

    pub async fn run_scenario(
        &self,
        scenario: Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(seeds.len());
        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (difficulty: {} seed: {})",
                    scenario.key().bright_white(),
                    self.settings.difficulty.key(),
                    seed
                );
            }
            results.push(self.run_single(scenario, seed, iterations).await);
        }
        results
    }

    async fn run_single(&self, scenario: Scenario, seed: u64, iterations: usize) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);
        let mut links = Vec::new();

        for i in 0..iterations {
            let start = Instant::now();
            let run_seed = iteration_seed(seed, i);
            match self.run_iteration(scenario, run_seed).await {
                Ok(report) => {
                    successes += 1;
                    links.extend(report.links);
                }
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {run_seed}): {err:#}", i + 1));
                }
            }
            durations.push(start.elapsed());
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        let mut notes = Vec::new();
        if !links.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let mean = links.iter().sum::<usize>() as f64 / links.len() as f64;
            let longest = links.iter().max().copied().unwrap_or_default();
            notes.push(format!("Links: average {mean:.2}, longest {longest}"));
        }

        ScenarioResult {
            scenario_name: scenario.key().to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            notes,
        }
    }

    async fn run_iteration(&self, scenario: Scenario, seed: u64) -> Result<IterationReport> {
        match scenario {
            Scenario::Smoke => self.smoke(seed).await,
            Scenario::Matchmaking => self.matchmaking(seed).await,
            Scenario::Playability => self.playability(seed).await,
        }
    }

    async fn new_game(&self, seed: u64) -> Result<Session> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        self.engine
            .new_game(self.settings, &mut rng)
            .await
            .context("starting a new game")
    }

    async fn smoke(&self, seed: u64) -> Result<IterationReport> {
        let mut session = self.new_game(seed).await?;
        ensure!(!session.success(), "fresh session already marked solved");
        ensure!(
            session.link_count().is_none(),
            "fresh session reports a link count"
        );

        for chain in ChainId::BOTH {
            ensure!(
                session.remove(chain, 0).is_err(),
                "starting actor of chain {chain:?} was removable"
            );
            let Some(choice) = first_enabled(&session, chain, 0)? else {
                continue;
            };

            let before = session.chain(chain).items().to_vec();
            let outcome = self
                .engine
                .extend(&mut session, chain, 0, Some(choice))
                .await?;
            if outcome.is_win() {
                ensure!(session.success(), "winning move did not mark success");
                ensure!(
                    session.chain(chain).items() == before.as_slice(),
                    "winning move changed chain {chain:?}"
                );
                continue;
            }
            ensure!(
                matches!(outcome, ExtendOutcome::Appended { index: 1, .. }),
                "unexpected outcome {outcome:?}"
            );

            let removal = self.engine.remove(&mut session, chain, 1)?;
            ensure!(removal.focus_index == 0, "focus should return to the start");
            ensure!(
                session.chain(chain).items() == before.as_slice(),
                "remove did not undo extend on chain {chain:?}"
            );

            self.engine
                .extend(&mut session, chain, 0, Some(choice))
                .await?;
            if let Some(next) = first_enabled(&session, chain, 1)? {
                self.engine
                    .extend(&mut session, chain, 1, Some(next))
                    .await?;
            }
        }

        for chain in ChainId::BOTH {
            ensure!(
                session.chain(chain).is_alternating(),
                "chain {chain:?} broke alternation"
            );
        }
        Ok(IterationReport {
            links: session.link_count(),
        })
    }

    async fn matchmaking(&self, seed: u64) -> Result<IterationReport> {
        let pool = self
            .engine
            .candidate_pool()
            .await
            .context("populating the candidate pool")?;
        let config = self.engine.config();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        for difficulty in Difficulty::ALL {
            for start_with_anchor in [true, false] {
                for allow_excluded in [true, false] {
                    let settings = Settings::new(difficulty)
                        .with_anchor(start_with_anchor)
                        .with_excluded_actor(allow_excluded);
                    for _ in 0..MATCHMAKING_DRAWS / 4 {
                        check_draw(&settings, pool, config, &mut rng)?;
                    }
                }
            }
        }
        Ok(IterationReport::default())
    }

    async fn playability(&self, seed: u64) -> Result<IterationReport> {
        let mut session = self.new_game(seed).await?;
        let first = start_id(&session, ChainId::A)?;
        let second = start_id(&session, ChainId::B)?;
        let blocked = (!self.settings.allow_excluded_actor)
            .then_some(self.engine.config().excluded_actor_id);

        let Some(path) = shortest_connection(
            self.engine.resolver(),
            first,
            second,
            blocked,
            self.max_expansions,
        )
        .await
        else {
            bail!(
                "no connection from {first} to {second} within {} expansions",
                self.max_expansions
            );
        };

        for (at, target) in path.iter().skip(1).enumerate() {
            let choice = option_index(&session, ChainId::A, at, *target)?;
            let outcome = self
                .engine
                .extend(&mut session, ChainId::A, at, Some(choice))
                .await?;
            if outcome.is_win() {
                break;
            }
            ensure!(
                matches!(outcome, ExtendOutcome::Appended { .. }),
                "replay step {at} gave {outcome:?}"
            );
        }

        ensure!(session.success(), "replayed path did not win");
        let expected = solver::link_count(&path);
        ensure!(
            session.link_count() == Some(expected),
            "link count {:?} does not match path length {expected}",
            session.link_count()
        );
        let played: Vec<&Item> = session
            .chain(ChainId::A)
            .items()
            .iter()
            .filter(|item| item.is_movie())
            .collect();
        let played_ids: Vec<ItemId> = played.iter().map(|item| item.id()).collect();
        ensure!(
            played_ids == solver::movies(&path),
            "chain A movies {played_ids:?} differ from the solved route"
        );

        if self.verbose {
            let (a, b) = session.starting_names();
            let route: Vec<String> = played.iter().map(|item| item_title(item)).collect();
            println!(
                "   {} via {}: {}",
                heading(a, b),
                route.join(" -> "),
                success_banner(expected).as_str().green()
            );
        }
        Ok(IterationReport {
            links: Some(expected),
        })
    }
}

fn first_enabled(session: &Session, chain: ChainId, at: usize) -> Result<Option<usize>> {
    Ok(session
        .options(chain, at)?
        .into_iter()
        .find(|option| option.enabled)
        .map(|option| option.index))
}

fn option_index(session: &Session, chain: ChainId, at: usize, target: EntityKey) -> Result<usize> {
    session
        .options(chain, at)?
        .into_iter()
        .find(|option| option.key == target)
        .map(|option| option.index)
        .with_context(|| format!("{} {} not offered at index {at}", target.kind.key(), target.id))
}

fn start_id(session: &Session, chain: ChainId) -> Result<ItemId> {
    session
        .chain(chain)
        .get(0)
        .map(Item::id)
        .with_context(|| format!("chain {chain:?} has no starting actor"))
}

fn check_draw(
    settings: &Settings,
    pool: &CandidatePool,
    config: &EngineConfig,
    rng: &mut ChaCha20Rng,
) -> Result<()> {
    let ids = select_starting_ids(settings, pool, config, rng)?;
    let label = settings.difficulty.key();

    ensure!(ids.first != ids.second, "{label}: both slots drew {}", ids.first);
    ensure!(
        ids.second != config.anchor_actor_id,
        "{label}: second slot drew the anchor"
    );
    if settings.start_with_anchor {
        ensure!(
            ids.first_is_anchor && ids.first == config.anchor_actor_id,
            "{label}: anchor not forced into the first slot"
        );
    } else {
        ensure!(
            pool.band(Slot::First.band(settings.difficulty), &config.bands)
                .contains(&ids.first),
            "{label}: first id {} outside its band",
            ids.first
        );
    }
    ensure!(
        pool.band(Slot::Second.band(settings.difficulty), &config.bands)
            .contains(&ids.second),
        "{label}: second id {} outside its band",
        ids.second
    );
    if !settings.allow_excluded_actor {
        ensure!(
            ids.first != config.excluded_actor_id && ids.second != config.excluded_actor_id,
            "{label}: excluded actor drawn"
        );
    }
    Ok(())
}
