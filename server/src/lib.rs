//! # CHaser Game Server Library
//!
//! This library provides the authoritative server for CHaser, a two-player,
//! turn-based maze-chase game played over plain TCP. Two client programs, one
//! per team ("cool" and "hot"), connect on separate ports and take turns
//! moving, placing blocks and scanning a grid until one of them is trapped,
//! makes an illegal move, or the turn limit runs out.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! The server owns the only copy of the board. Clients never see it directly;
//! each turn they receive an 8-cell view of their surroundings and answer with
//! a single two-letter command. Every rule decision happens here.
//!
//! ### Protocol Orchestration
//! Drives the connection handshake and strict turn alternation:
//! - Waiting for both players to connect
//! - Collecting team names and ready signals
//! - Exchanging turn requests, observations and commands
//! - Detecting the end of the game and reporting the result
//!
//! ### Transport
//! One TCP listener per side, each holding at most one live connection.
//! Messages are CRLF-terminated ASCII lines and every receive is bounded by
//! an idle timeout.
//!
//! ## Architecture Design
//!
//! ### Single Owner
//! There is no shared mutable state. The [`orchestrator::Orchestrator`] owns
//! the [`game::GameState`] and both links, and hands the state to the rule
//! engine one command at a time. Turns are strictly sequential, so there is
//! nothing to lock.
//!
//! ### Link Seam
//! The orchestrator is generic over [`transport::PlayerLink`], which the TCP
//! [`transport::TransportChannel`] implements. Protocol logic can be exercised
//! with scripted links and no sockets.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Host, ports and timeouts for one run, with the tournament defaults.
//!
//! ### Game Module (`game`)
//! The game state: board, both players, side to move, round counter and the
//! final result. Also renders per-side observations.
//!
//! ### Rules Module (`rules`)
//! Walk, put, look and search, enclosure detection and the turn-limit
//! tiebreak. Pure with respect to I/O.
//!
//! ### Orchestrator Module (`orchestrator`)
//! Handshake and turn loop on top of two player links, plus game start and
//! end logging.
//!
//! ### Transport Module (`transport`)
//! TCP listener/connection management and CRLF line framing.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use chaser_server::config::ServerConfig;
//! use chaser_server::game::GameState;
//! use chaser_server::orchestrator::Orchestrator;
//! use chaser_shared::map::{MapDefinition, MapRules};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = std::fs::read_to_string("maps/sample.map")?;
//!     let map = MapDefinition::parse(&text, &MapRules::standard())?;
//!
//!     let config = ServerConfig::default();
//!     let mut channels = config.channels();
//!     for channel in &mut channels {
//!         channel.start().await?;
//!     }
//!
//!     let mut game = Orchestrator::new(GameState::new(map), channels)
//!         .with_peer_timeout(config.peer_timeout);
//!     let outcome = game.run().await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod orchestrator;
pub mod rules;
pub mod transport;
