use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod actors;
mod bus;
mod state;

use actors::Actor;
use actors::game::{GAME_ACTOR_ID, GameActor};
use bus::BusSender;
use garland::sim::{Tuning, WorldLayout};
use garland::{DecorationType, GarlandMessage};
use state::SystemState;

#[derive(Parser, Debug, Clone)]
#[command(name = "garland", about = "Winter village string-lights game host")]
struct Config {
    /// Config file path (default: ~/.config/garland/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decoration type selected at startup (overrides [tuning].decor_type)
    #[arg(long, value_enum)]
    decor_type: Option<DecorationType>,

    /// Fixed RNG seed for the pickup field (overrides [tuning].seed)
    #[arg(long)]
    seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("garland=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("debug logging enabled");

    let cli = Config::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(state::config::default_config_path);

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    // Single unified bus
    let (bus_tx, _) = broadcast::channel::<GarlandMessage>(1024);

    // Build shared state root (loads or creates the config file)
    let (system_state, game_writer) = SystemState::new(config_path);
    let state = Arc::new(system_state);
    tracing::info!("config: {}", state.system.path().display());

    // Command-line overrides apply to this run only.
    let snap = state.system.snapshot();
    let mut tuning_section = snap.tuning.clone();
    if let Some(decor_type) = cli.decor_type {
        tuning_section.decor_type = Some(decor_type);
    }
    if let Some(seed) = cli.seed {
        tuning_section.seed = Some(seed);
    }
    let tuning = Tuning::from_section(&tuning_section);
    let world = WorldLayout::from_section(&snap.world);
    tracing::info!(
        "world: {} structures, {} anchor zones",
        world.footprints.len(),
        world.zones().len()
    );

    // Game actor: always on, owns the simulation. Must be polling before
    // other actors start so no early commands are missed.
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let sender = BusSender::new(GAME_ACTOR_ID.into(), bus_tx.clone(), Arc::clone(&shutdown));
        let receiver = sender.subscribe();
        let (actor, ready_rx) = GameActor::new(tuning, world, game_writer);
        actor.start(Arc::clone(&state), sender, receiver);
        ready_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("game actor failed to start"))?;
        state.register_actor(GAME_ACTOR_ID.into(), Box::new(actor), shutdown);
    }

    // Start all actors from config (session, mock players, webserver)
    for ra in actors::resolve_actors(&snap) {
        tracing::info!("starting actor '{}' ({})", ra.id, ra.name);
        actors::start_actor(ra.id, ra.actor, &state, &bus_tx);
    }

    // Drain bus (keeps broadcast channel healthy when no other subscriber)
    let mut drain_rx = bus_tx.subscribe();
    let drain_handle = tokio::spawn(async move {
        loop {
            match drain_rx.recv().await {
                Ok(msg) => {
                    if !msg.event.is_frame() {
                        tracing::trace!("bus: {} {:?}", msg.source, msg.event);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("drain subscriber lagged, dropped {n} events");
                }
            }
        }
    });

    rt.block_on(async { tokio::signal::ctrl_c().await })?;

    // Shutdown: stop all actors (including webserver) via registry
    tracing::info!("shutting down...");
    for id in state.actor_ids() {
        state.stop_actor(&id);
    }
    // Drop bus_tx closes the broadcast channel as secondary signal
    drop(bus_tx);
    drain_handle.abort();

    Ok(())
}
