//! SplitSettle Simulator
//!
//! Runs named scenarios against an in-process engine and trust token.

use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod controller;
mod metrics;
mod scenario;

use splitsettle_engine::{EngineConfig, MetricsSnapshot};
use splitsettle_token::TokenConfig;

use controller::SimulationController;
use metrics::SimulationMetrics;
use scenario::Scenario;

/// SplitSettle Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "SplitSettle scenario runner")]
struct Args {
    /// Scenario to run (weekend-trip, large-group, overtaken-commit)
    #[arg(short, long, default_value = "weekend-trip")]
    scenario: String,

    /// Group size for large-group
    #[arg(short, long, default_value = "24")]
    members: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Token units minted per deposited unit (overrides TOKEN_MINT_RATE)
    #[arg(long)]
    rate: Option<u128>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    run_id: Uuid,
    finished_at: chrono::DateTime<Utc>,
    scenario: &'a str,
    seed: u64,
    simulation: &'a SimulationMetrics,
    engine: MetricsSnapshot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .or_else(|_| std::env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    info!("Starting SplitSettle Simulator");
    info!("Scenario: {}", args.scenario);
    info!("Seed: {}", seed);

    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = Scenario::load(&args.scenario, args.members, &mut rng)?;

    let mut token_config = TokenConfig::from_env();
    if let Some(rate) = args.rate {
        token_config.mint_rate = rate;
    }

    let mut controller =
        SimulationController::new(EngineConfig::from_env(), token_config, scenario.members)?;
    controller.initialize(scenario.total_expense())?;
    controller.run_scenario(&scenario)?;

    let metrics = controller.get_metrics();
    let engine_metrics = controller.engine().metrics();

    info!("Simulation complete");
    info!("Expenses: {}", metrics.expenses);
    info!("Simplifications: {}", metrics.simplifications);
    info!("Entries removed: {}", metrics.entries_removed);
    info!("Total settlements: {}", metrics.total_settlements);
    info!("Successful: {}", metrics.successful_settlements);
    info!("Failed: {}", metrics.failed_settlements);
    info!("Average settlement latency: {}us", metrics.average_latency_us());
    info!("p99 settlement latency: {}us", metrics.p99_latency_us());
    info!("Rejected calls: {}", engine_metrics.calls_rejected);

    if args.json {
        let report = Report {
            run_id: Uuid::now_v7(),
            finished_at: Utc::now(),
            scenario: &scenario.name,
            seed,
            simulation: metrics,
            engine: engine_metrics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !metrics.all_passed() {
        anyhow::bail!(
            "{} assertion(s) failed: {}",
            metrics.assertion_failures.len(),
            metrics.assertion_failures.join("; ")
        );
    }

    Ok(())
}
