//! # Leadflow CLI
//!
//! Drives an in-memory workspace and prints its snapshot as JSON.
//!
//! Usage:
//!   leadflow demo                      # Seed a sample pipeline and print the snapshot
//!   leadflow demo --dispatch           # Same, then run one dispatcher tick
//!   leadflow geocode "Av. Paulista, São Paulo"
//!   leadflow config show               # Effective configuration as TOML
//!   leadflow config init               # Write defaults to ~/.leadflow/config.toml

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leadflow_channels::{NominatimLookup, TransportRouter};
use leadflow_core::{
    AudienceFilter, CadenceStep, Channel, GeoLookup, JobKind, JobSpec, LeadDraft, LeadflowConfig,
    RepTargets, SalesRep, Stage,
};
use leadflow_engine::{Dispatcher, Workspace};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "leadflow",
    version,
    about = "📈 Leadflow: sales pipeline, lead scoring and outreach scheduling"
)]
struct Cli {
    /// Config file (defaults to ~/.leadflow/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a sample workspace and print its snapshot
    Demo {
        /// Run one dispatcher tick before printing
        #[arg(long)]
        dispatch: bool,
    },
    /// Resolve an address to coordinates
    Geocode {
        /// Free-form address
        query: String,
    },
    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(LeadflowConfig::default_path)
}

fn load_config(cli: &Cli) -> Result<LeadflowConfig> {
    let path = config_path(cli);
    if cli.config.is_none() && !path.exists() {
        return Ok(LeadflowConfig::default());
    }
    LeadflowConfig::load_from(&path).with_context(|| format!("loading {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "leadflow=debug,leadflow_core=debug,leadflow_pipeline=debug,leadflow_scheduler=debug,leadflow_channels=debug,leadflow_engine=debug"
    } else {
        "leadflow=info,leadflow_engine=info,leadflow_scheduler=info,leadflow_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Demo { dispatch } => {
            let ws = seed(config.clone())?;
            let ws = Arc::new(Mutex::new(ws));
            if *dispatch || config.scheduler.dispatcher_enabled {
                let router = Arc::new(TransportRouter::from_config(&config.channels));
                let report = Dispatcher::new(ws.clone(), router).tick().await;
                tracing::info!(
                    "📣 Dispatch: {} sent, {} failed",
                    report.sent.len(),
                    report.failed.len()
                );
            }
            let snapshot = ws.lock().await.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Geocode { query } => {
            let lookup = NominatimLookup::new(config.geo.clone());
            match lookup.lookup(query).await? {
                Some(c) => println!("📍 {query}: {:.6}, {:.6}", c.lat, c.lon),
                None => println!("❓ No match for '{query}'"),
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show => print!("{}", config.to_toml()?),
            ConfigAction::Init { force } => {
                let path = config_path(&cli);
                if path.exists() && !force {
                    println!("⚠️  {} already exists (use --force to overwrite)", path.display());
                    return Ok(());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, LeadflowConfig::default().to_toml()?)?;
                println!("✅ Config written to {}", path.display());
            }
        },
    }
    Ok(())
}

/// Build a small pipeline touching every command group.
fn seed(config: LeadflowConfig) -> Result<Workspace> {
    let mut ws = Workspace::new(config);

    let rep = ws.upsert_rep(SalesRep {
        id: String::new(),
        name: "Bia Santos".into(),
        targets: RepTargets {
            sales_target: 250_000.0,
            lead_target: 12,
            conversion_target_pct: 20.0,
        },
        active: true,
    })?;

    let acme = ws.create_lead(
        LeadDraft::new("Ana Lima", "Acme Foods")
            .stage(Stage::Negotiation)
            .value(150_000.0)
            .inactive_for(5)
            .products(["granola", "oat-bars"])
            .rep(&rep.id),
    )?;
    let beta = ws.create_lead(
        LeadDraft::new("Bruno Reis", "Beta Market")
            .stage(Stage::Sample)
            .value(30_000.0)
            .inactive_for(45)
            .rep(&rep.id),
    )?;
    let gamma = ws.create_lead(LeadDraft::new("Carla Dias", "Gamma Bistro").inactive_for(32))?;

    ws.log_interaction(&acme.id, Channel::Meeting, "Pricing review", "Agreed on volume tiers")?;
    ws.create_task(
        "Send revised proposal",
        "Include the volume discount",
        Some(acme.id.as_str()),
        Some(ws.now() + chrono::Duration::days(2)),
    )?;

    let cadence = ws.create_cadence(
        "Reactivation",
        vec![
            CadenceStep::new(Channel::Email, 0, "reactivation-email"),
            CadenceStep::new(Channel::Whatsapp, 3, "reactivation-whatsapp"),
            CadenceStep::new(Channel::Instagram, 10, "reactivation-instagram"),
        ],
        true,
    )?;
    let campaign = ws.create_campaign(
        "Dormant accounts",
        &cadence.id,
        AudienceFilter {
            min_days_inactive: Some(30),
            ..Default::default()
        },
    )?;
    ws.start_campaign(&campaign.id)?;

    let follow_up = ws.schedule_job(JobSpec {
        lead_ref: beta.id.clone(),
        channel: Channel::Call,
        kind: JobKind::DirectContact,
        scheduled_at: ws.now() + chrono::Duration::days(1),
        template_ref: None,
        campaign_ref: None,
    })?;
    ws.run_job_now(&follow_up.id)?;
    ws.quick_action(&gamma.id, Channel::Linkedin, JobKind::DirectContact)?;

    ws.move_lead_stage(&gamma.id, Stage::Lost)?;
    ws.confirm_loss("Chose a cheaper supplier")?;

    Ok(ws)
}
