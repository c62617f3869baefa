mod reports;
mod scenario;
mod solver;
mod tmdb;
mod util;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use costar_game::{
    Difficulty, EngineConfig, GameEngine, MemoryCatalog, MetadataProvider, PoolProvider, Settings,
    SyntheticSpec,
};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reports::ScenarioResult;
use scenario::{Scenario, ScenarioRunner, list_scenarios};
use tmdb::TmdbClient;
use util::{parse_seeds, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Deterministic in-memory film graph (fast, offline)
    Synthetic,
    /// Live TMDB API (requires an API key)
    Tmdb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Medium => Self::Medium,
            DifficultyArg::Hard => Self::Hard,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "costar-tester", version)]
#[command(about = "Automated QA sweeps for the Costar actor-linking game engine")]
struct Args {
    /// Metadata source the engine runs against
    #[arg(long, value_enum, default_value_t = ProviderKind::Synthetic)]
    provider: ProviderKind,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Game difficulty used by smoke and playability
    #[arg(long, value_enum, default_value_t = DifficultyArg::Medium)]
    difficulty: DifficultyArg,

    /// Draw both starting actors instead of opening with the anchor actor
    #[arg(long)]
    no_anchor: bool,

    /// Keep the excluded actor out of games
    #[arg(long)]
    exclude_actor: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine configuration JSON (defaults to the bundled config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// TMDB API key (tmdb provider only)
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seed for the synthetic film graph
    #[arg(long, default_value_t = 42)]
    catalog_seed: u64,

    /// Actors in the synthetic film graph
    #[arg(long, default_value_t = 640)]
    catalog_actors: usize,

    /// Movies in the synthetic film graph
    #[arg(long, default_value_t = 900)]
    catalog_movies: usize,

    /// Node budget for the playability search
    #[arg(long, default_value_t = 4000)]
    max_expansions: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    info!(
        "running {} scenario(s) over {} seed(s) against {:?}",
        scenarios.len(),
        seeds.len(),
        args.provider
    );

    let results = match args.provider {
        ProviderKind::Synthetic => {
            let spec = SyntheticSpec {
                actors: args.catalog_actors,
                movies: args.catalog_movies,
                reserved_actor_ids: vec![config.anchor_actor_id, config.excluded_actor_id],
                ..SyntheticSpec::default()
            };
            let catalog = MemoryCatalog::synthetic(args.catalog_seed, &spec);
            let engine = GameEngine::try_new(catalog.clone(), catalog, config)?;
            run_scenarios(&args, &engine, &scenarios, &seeds).await
        }
        ProviderKind::Tmdb => {
            let api_key = args
                .api_key
                .clone()
                .context("the tmdb provider needs --api-key or TMDB_API_KEY")?;
            let client = Arc::new(TmdbClient::new(api_key)?);
            let engine = GameEngine::try_new(Arc::clone(&client), client, config)?;
            run_scenarios(&args, &engine, &scenarios, &seeds).await
        }
    };

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎬 Costar Automated Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default_config());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EngineConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    for name in split_csv(scenarios_arg) {
        if name == "all" {
            scenarios.extend(Scenario::ALL);
        } else if let Some(scenario) = Scenario::from_key(&name) {
            scenarios.push(scenario);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
        }
    }
    scenarios.dedup();
    scenarios
}

fn build_settings(args: &Args) -> Settings {
    Settings::new(args.difficulty.into())
        .with_anchor(!args.no_anchor)
        .with_excluded_actor(!args.exclude_actor)
}

async fn run_scenarios<M, P>(
    args: &Args,
    engine: &GameEngine<M, P>,
    scenarios: &[Scenario],
    seeds: &[u64],
) -> Vec<ScenarioResult>
where
    M: MetadataProvider,
    P: PoolProvider,
{
    println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let runner = ScenarioRunner::new(
        engine,
        build_settings(args),
        args.max_expansions,
        args.verbose,
    );
    let mut results = Vec::new();
    for &scenario in scenarios {
        results.extend(runner.run_scenario(scenario, seeds, args.iterations).await);
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                reports::generate_json_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Finished {} in {:?}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["costar-tester"])
    }

    #[test]
    fn defaults_match_documented_cli() {
        let args = base_args();
        assert_eq!(args.provider, ProviderKind::Synthetic);
        assert_eq!(args.scenarios, "smoke");
        assert_eq!(args.iterations, 10);
        let settings = build_settings(&args);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn flags_shape_settings() {
        let args = Args::parse_from([
            "costar-tester",
            "--difficulty",
            "hard",
            "--no-anchor",
            "--exclude-actor",
        ]);
        let settings = build_settings(&args);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!(!settings.start_with_anchor);
        assert!(!settings.allow_excluded_actor);
    }

    #[test]
    fn scenario_expansion_handles_all_and_unknown() {
        assert_eq!(expand_scenarios("all"), Scenario::ALL.to_vec());
        assert_eq!(
            expand_scenarios("playability, nope"),
            vec![Scenario::Playability]
        );
    }

    #[test]
    fn config_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "costar-config-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::write(&path, r#"{"anchor_actor_id": 31, "max_sample_attempts": 20}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.anchor_actor_id, 31);
        assert_eq!(config.max_sample_attempts, 20);
        assert_eq!(config.excluded_actor_id, 2231);

        std::fs::write(&path, r#"{"max_sample_attempts": 0}"#).unwrap();
        assert!(load_config(Some(&path)).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn json_report_writes_to_file() {
        let path = std::env::temp_dir().join(format!(
            "costar-report-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let mut args = base_args();
        args.report = "json".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[], Instant::now()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
        let _ = std::fs::remove_file(&path);
    }
}
