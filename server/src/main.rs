use chaser_server::config::ServerConfig;
use chaser_server::game::{GameState, Outcome};
use chaser_server::orchestrator::Orchestrator;
use chaser_shared::map::{MapDefinition, MapRules};
use chaser_shared::{DEFAULT_COOL_PORT, DEFAULT_HOT_PORT, DEFAULT_TIMEOUT_MS};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;

const BUNDLED_MAP: &str = include_str!("../maps/sample.map");

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind both listeners to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port the cool player connects to
    #[clap(long, default_value_t = DEFAULT_COOL_PORT)]
    cool_port: u16,
    /// Port the hot player connects to
    #[clap(long, default_value_t = DEFAULT_HOT_PORT)]
    hot_port: u16,
    /// Idle timeout for every receive, in milliseconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// How long to wait for both players to connect, in milliseconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    peer_timeout_ms: u64,
    /// Map file to play; the bundled sample map is used when omitted
    #[clap(short, long)]
    map: Option<PathBuf>,
    /// Skip the tournament size and item count checks
    #[clap(long)]
    relaxed_map: bool,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            cool_port: self.cool_port,
            hot_port: self.hot_port,
            idle_timeout: Duration::from_millis(self.timeout_ms),
            peer_timeout: Duration::from_millis(self.peer_timeout_ms),
        }
    }

    fn load_map(&self) -> Result<MapDefinition, Box<dyn std::error::Error>> {
        let rules = if self.relaxed_map {
            MapRules::default()
        } else {
            MapRules::standard()
        };

        let text = match &self.map {
            Some(path) => {
                info!("Loading map from {}", path.display());
                std::fs::read_to_string(path)?
            }
            None => {
                info!("Loading bundled sample map");
                BUNDLED_MAP.to_string()
            }
        };
        Ok(MapDefinition::parse(&text, &rules)?)
    }
}

/// Loads the map, opens both listeners and plays a single game.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // The map must be valid before any socket is opened
    let map = args.load_map()?;
    let config = args.config();

    let mut channels = config.channels();
    for channel in &mut channels {
        channel.start().await?;
    }

    let mut game =
        Orchestrator::new(GameState::new(map), channels).with_peer_timeout(config.peer_timeout);

    let result = tokio::select! {
        result = game.run() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, shutting down...");
            None
        }
    };

    let (state, mut channels) = game.into_parts();
    for channel in &mut channels {
        channel.stop().await;
    }

    match result {
        Some(Ok(Outcome::Winner(side))) => {
            info!("{} ({}) wins", state.player(side).name, side);
        }
        Some(Ok(Outcome::Draw)) => info!("Game ended in a draw"),
        Some(Err(e)) => {
            error!("Game aborted: {}", e);
            return Err(e.into());
        }
        None => {}
    }

    Ok(())
}
