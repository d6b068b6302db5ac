//! Risk-weighted patrol route planner.
//!
//! `patrol plan` builds a route from HQ through the riskiest zones in range,
//! asking for a decision when coverage and the distance budget conflict.
//! `patrol reachability` checks which zones the road network can reach.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use patrol_cli::config::Config;
use patrol_cli::pipeline::{plan_patrol, PlanRequest};
use patrol_cli::prompt::PromptResolver;
use patrol_cli::report::describe;
use patrol_cli::zones::load_zones;
use patrol_core::{filter_candidates, BaseLocation, Decision, PlannerRules};
use patrol_directions::OrsClient;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a patrol route from HQ
    Plan(PlanArgs),
    /// Check road reachability of zones around HQ
    Reachability(ReachabilityArgs),
}

#[derive(Args, Debug)]
struct Location {
    /// Zone file (JSON array); defaults to the bundled sample
    #[arg(long)]
    zones: Option<PathBuf>,

    /// HQ latitude (default: PATROL_HQ_LAT)
    #[arg(long, allow_hyphen_values = true)]
    hq_lat: Option<f64>,

    /// HQ longitude (default: PATROL_HQ_LNG)
    #[arg(long, allow_hyphen_values = true)]
    hq_lng: Option<f64>,

    /// Scan radius around HQ in km
    #[arg(long, default_value_t = PlannerRules::default().default_radius_km)]
    radius: f64,
}

impl Location {
    fn hq(&self, config: &Config) -> BaseLocation {
        BaseLocation::new(
            self.hq_lat.unwrap_or(config.hq.lat),
            self.hq_lng.unwrap_or(config.hq.lng),
        )
    }
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    location: Location,

    /// Distance budget in km
    #[arg(long, default_value_t = PlannerRules::default().default_km_limit)]
    km_limit: f64,

    /// Answer budget overruns without prompting (safety-first or distance-limited)
    #[arg(long)]
    decision: Option<Decision>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Skip road routing
    #[arg(long)]
    no_road: bool,
}

#[derive(Args, Debug)]
struct ReachabilityArgs {
    #[command(flatten)]
    location: Location,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    patrol_cli::init_tracing(config.log_json)?;

    match cli.command {
        Command::Plan(args) => run_plan(args, &config).await,
        Command::Reachability(args) => run_reachability(args, &config).await,
    }
}

async fn run_plan(args: PlanArgs, config: &Config) -> Result<()> {
    let zones = load_zones(args.location.zones.as_deref())?;
    let request = PlanRequest {
        hq: args.location.hq(config),
        km_limit: args.km_limit,
        radius_km: args.location.radius,
        road: !args.no_road,
    };
    tracing::info!(
        zones = zones.len(),
        km_limit = request.km_limit,
        radius_km = request.radius_km,
        "Planning patrol"
    );

    let report = match args.decision {
        Some(decision) => plan_patrol(&zones, &request, config, &decision).await?,
        None => plan_patrol(&zones, &request, config, &PromptResolver).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

async fn run_reachability(args: ReachabilityArgs, config: &Config) -> Result<()> {
    let zones = load_zones(args.location.zones.as_deref())?;
    let hq = args.location.hq(config);
    let client = OrsClient::new(config.ors_config())?;

    let candidates = filter_candidates(zones.as_slice(), &hq, args.location.radius);
    println!(
        "Checking {} zones within {:.1} km of HQ ({:.4}, {:.4})",
        candidates.len(),
        args.location.radius,
        hq.lat,
        hq.lng
    );
    let mut unreachable = 0;
    for zone in &candidates {
        let reachable = client.is_road_reachable(&hq, zone).await;
        if !reachable {
            unreachable += 1;
        }
        println!(
            "  {:<13} {}",
            if reachable { "reachable" } else { "UNREACHABLE" },
            describe(zone)
        );
    }
    println!("{} of {} zones reachable by road", candidates.len() - unreachable, candidates.len());
    Ok(())
}
