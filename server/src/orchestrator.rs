//! Protocol orchestration for one game.
//!
//! The [`Orchestrator`] owns the [`GameState`] and both player links. It runs
//! the handshake (peer wait, team names, ready exchange) and then the strict
//! alternating turn exchange:
//!
//! ```text
//! client: gr        server: <observation>
//! client: <command> server: <observation after the action>
//! client: #
//! ```
//!
//! Any transport failure or malformed protocol token ends the game with an
//! error; the caller is responsible for tearing the links down. Mutations
//! made by a completed action are never rolled back.

use crate::game::{GameState, Outcome};
use crate::rules;
use crate::transport::{PlayerLink, TransportError};
use chaser_shared::{
    truncate_name, Command, CommandError, Side, DEFAULT_TIMEOUT_MS, READY_TOKEN,
    TURN_END_TOKEN, TURN_REQUEST_TOKEN,
};
use log::{debug, info, warn};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("{side} sent {got:?} where {expected:?} was expected")]
    UnexpectedToken {
        side: Side,
        expected: &'static str,
        got: String,
    },
    #[error("{side} sent malformed command {token:?}")]
    MalformedCommand { side: Side, token: String },
    #[error("{side} sent invalid ready signal {got:?}")]
    InvalidReadySignal { side: Side, got: String },
}

/// Fatal, game-ending failures.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
}

/// Drives one game between two links, indexed by [`Side::index`].
pub struct Orchestrator<L: PlayerLink> {
    state: GameState,
    links: [L; 2],
    peer_timeout: Duration,
}

impl<L: PlayerLink> Orchestrator<L> {
    pub fn new(state: GameState, links: [L; 2]) -> Self {
        Self {
            state,
            links,
            peer_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// How long to wait for both players to connect.
    pub fn with_peer_timeout(mut self, peer_timeout: Duration) -> Self {
        self.peer_timeout = peer_timeout;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_parts(self) -> (GameState, [L; 2]) {
        (self.state, self.links)
    }

    /// Plays a complete game and returns how it ended.
    pub async fn run(&mut self) -> Result<Outcome, GameError> {
        self.wait_for_peers().await?;
        self.exchange_names().await?;
        self.exchange_ready().await?;
        self.log_game_start();

        loop {
            if let Some(outcome) = self.state.outcome {
                self.log_game_end();
                return Ok(outcome);
            }
            self.play_turn().await?;
        }
    }

    /// Blocks until both links have a peer, or the peer timeout elapses.
    pub async fn wait_for_peers(&mut self) -> Result<(), GameError> {
        info!("Waiting for both players to connect...");
        let [cool, hot] = &mut self.links;
        let both = async { tokio::try_join!(cool.accept_peer(), hot.accept_peer()) };

        match tokio::time::timeout(self.peer_timeout, both).await {
            Ok(result) => {
                result?;
                info!("Both players connected");
                Ok(())
            }
            Err(_) => Err(TransportError::PeersTimeout(self.peer_timeout).into()),
        }
    }

    /// Receives one team name from each side, concurrently.
    pub async fn exchange_names(&mut self) -> Result<(), GameError> {
        let [cool, hot] = &mut self.links;
        let (cool_name, hot_name) = tokio::try_join!(cool.receive_line(), hot.receive_line())?;

        self.state.player_mut(Side::Cool).name = truncate_name(&cool_name);
        self.state.player_mut(Side::Hot).name = truncate_name(&hot_name);
        Ok(())
    }

    /// Receives `@` from each side concurrently, then acknowledges both.
    pub async fn exchange_ready(&mut self) -> Result<(), GameError> {
        let [cool, hot] = &mut self.links;
        let (cool_ready, hot_ready) = tokio::try_join!(cool.receive_line(), hot.receive_line())?;

        for (side, got) in [(Side::Cool, cool_ready), (Side::Hot, hot_ready)] {
            if got != READY_TOKEN {
                return Err(ProtocolViolation::InvalidReadySignal { side, got }.into());
            }
        }

        for link in &mut self.links {
            link.send_line(READY_TOKEN).await?;
        }
        Ok(())
    }

    /// Runs one full turn for the side to move.
    pub async fn play_turn(&mut self) -> Result<(), GameError> {
        let side = self.state.side_to_move;
        let link = &mut self.links[side.index()];

        expect_token(link, side, TURN_REQUEST_TOKEN).await?;
        link.send_line(&self.state.observe(side).to_string()).await?;

        let token = link.receive_line().await?;
        let result = match token.parse::<Command>() {
            Ok(command) => {
                info!(
                    "Turn {}: {} ({}) - {}",
                    self.state.round,
                    side,
                    self.state.player(side).name,
                    command
                );
                rules::execute(&mut self.state, command)
            }
            Err(CommandError::WrongLength(_)) => {
                return Err(ProtocolViolation::MalformedCommand { side, token }.into());
            }
            Err(e) => {
                warn!("{} sent unusable command {:?}: {}", side, token, e);
                rules::reject_command(&mut self.state)
            }
        };
        debug!("{} action result: {:?}", side, result);

        link.send_line(&self.state.observe(side).to_string()).await?;
        expect_token(link, side, TURN_END_TOKEN).await?;

        self.state.switch_side();
        rules::check_turn_limit(&mut self.state);
        Ok(())
    }

    fn log_game_start(&self) {
        info!("=== Game start ===");
        info!("Map: {}", self.state.map_name);
        info!("Turn limit: {}", self.state.turn_limit);
        for player in &self.state.players {
            info!("{}: {} at {}", player.side, player.name, player.position);
        }
    }

    fn log_game_end(&self) {
        info!("=== Game end ===");
        match self.state.outcome {
            Some(Outcome::Winner(side)) => {
                info!("Winner: {} ({})", self.state.player(side).name, side)
            }
            Some(Outcome::Draw) => info!("Result: draw"),
            None => {}
        }
        if let Some(result) = self.state.result {
            info!("Decided by: {}", result);
        }
        info!(
            "Final item counts - cool: {}, hot: {}",
            self.state.player(Side::Cool).item_count,
            self.state.player(Side::Hot).item_count
        );
    }
}

async fn expect_token<L: PlayerLink>(
    link: &mut L,
    side: Side,
    expected: &'static str,
) -> Result<(), GameError> {
    let got = link.receive_line().await?;
    if got == expected {
        Ok(())
    } else {
        Err(ProtocolViolation::UnexpectedToken {
            side,
            expected,
            got,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaser_shared::board::Board;
    use chaser_shared::map::MapDefinition;
    use chaser_shared::{Cell, GameResult, Position};
    use std::collections::VecDeque;

    /// A link that replays canned input and records everything sent.
    struct ScriptedLink {
        side: Side,
        incoming: VecDeque<String>,
        sent: Vec<String>,
    }

    impl ScriptedLink {
        fn new(side: Side, lines: &[&str]) -> Self {
            Self {
                side,
                incoming: lines.iter().map(|l| l.to_string()).collect(),
                sent: Vec::new(),
            }
        }
    }

    impl PlayerLink for ScriptedLink {
        async fn accept_peer(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_line(&mut self, message: &str) -> Result<(), TransportError> {
            self.sent.push(message.to_string());
            Ok(())
        }

        async fn receive_line(&mut self) -> Result<String, TransportError> {
            self.incoming
                .pop_front()
                .ok_or(TransportError::ConnectionClosed(self.side))
        }
    }

    /// A link whose peer never shows up.
    struct AbsentLink;

    impl PlayerLink for AbsentLink {
        async fn accept_peer(&mut self) -> Result<(), TransportError> {
            std::future::pending().await
        }

        async fn send_line(&mut self, _message: &str) -> Result<(), TransportError> {
            Err(TransportError::NotConnected(Side::Cool))
        }

        async fn receive_line(&mut self) -> Result<String, TransportError> {
            Err(TransportError::NotConnected(Side::Cool))
        }
    }

    fn test_state(turn_limit: u32) -> GameState {
        let mut board = Board::new(5, 5);
        board.set(Position::new(2, 1), Cell::Item);
        board.set(Position::new(2, 3), Cell::Item);
        GameState::new(MapDefinition {
            name: "orchestra".to_string(),
            turn_limit,
            board,
            cool_start: Position::new(1, 1),
            hot_start: Position::new(3, 3),
        })
    }

    fn orchestrator(
        turn_limit: u32,
        cool: &[&str],
        hot: &[&str],
    ) -> Orchestrator<ScriptedLink> {
        Orchestrator::new(
            test_state(turn_limit),
            [
                ScriptedLink::new(Side::Cool, cool),
                ScriptedLink::new(Side::Hot, hot),
            ],
        )
    }

    #[tokio::test]
    async fn test_full_game_to_turn_limit() {
        let mut game = orchestrator(
            2,
            &["CoolTeamName", "@", "gr", "wr", "#"],
            &["hot", "@", "gr", "ll", "#"],
        );

        let outcome = game.run().await.unwrap();

        assert_eq!(outcome, Outcome::Winner(Side::Cool));
        let (state, [cool, hot]) = game.into_parts();
        assert_eq!(state.player(Side::Cool).name, "CoolTeam");
        assert_eq!(state.player(Side::Hot).name, "hot");
        assert_eq!(state.player(Side::Cool).item_count, 1);
        assert_eq!(state.round, 2);
        assert_eq!(state.result, Some(GameResult::WinByItemCount));

        // Cool picks up the item to its right and leaves a block behind.
        assert_eq!(cool.sent, vec!["@", "100003000", "100020000"]);
        assert_eq!(hot.sent, vec!["@", "100030000", "100030000"]);
    }

    #[tokio::test]
    async fn test_single_round_limit_ends_after_cool_turn() {
        let mut game = orchestrator(
            1,
            &["a", "@", "gr", "lu", "#"],
            &["b", "@", "gr", "ld", "#"],
        );

        let outcome = game.run().await.unwrap();

        assert_eq!(outcome, Outcome::Draw);
        let (state, [cool, hot]) = game.into_parts();
        assert_eq!(state.round, 1);
        assert_eq!(state.side_to_move, Side::Hot);
        assert_eq!(state.result, Some(GameResult::Draw));
        assert_eq!(cool.sent.len(), 3);
        assert_eq!(hot.sent, vec!["@"]);
    }

    #[tokio::test]
    async fn test_turn_order_alternates() {
        let mut game = orchestrator(
            5,
            &["a", "@", "gr", "lu", "#", "gr", "su", "#"],
            &["b", "@", "gr", "ld", "#"],
        );
        game.exchange_names().await.unwrap();
        game.exchange_ready().await.unwrap();

        game.play_turn().await.unwrap();
        assert_eq!(game.state().side_to_move, Side::Hot);
        assert_eq!(game.state().round, 1);

        game.play_turn().await.unwrap();
        assert_eq!(game.state().side_to_move, Side::Cool);
        assert_eq!(game.state().round, 2);

        game.play_turn().await.unwrap();
        assert_eq!(game.state().side_to_move, Side::Hot);
        assert!(!game.state().is_over());
    }

    #[tokio::test]
    async fn test_look_leaves_state_unchanged() {
        let mut game = orchestrator(10, &["a", "@", "gr", "lu", "#"], &["b", "@"]);
        game.exchange_names().await.unwrap();
        game.exchange_ready().await.unwrap();
        let before = game.state().clone();

        game.play_turn().await.unwrap();

        assert_eq!(game.state().board, before.board);
        assert_eq!(game.state().players, before.players);
        assert!(!game.state().is_over());
        let (_, [cool, _]) = game.into_parts();
        assert_eq!(cool.sent[1], cool.sent[2]);
    }

    #[tokio::test]
    async fn test_walk_off_board_loses() {
        let mut game = orchestrator(
            10,
            &["a", "@", "gr", "wu", "#", "gr", "wu", "#"],
            &["b", "@", "gr", "ll", "#"],
        );

        let outcome = game.run().await.unwrap();

        assert_eq!(outcome, Outcome::Winner(Side::Hot));
        let (state, [cool, _]) = game.into_parts();
        assert_eq!(state.result, Some(GameResult::LoseByWallHit));
        // Post-action observation of the losing move reports the game as over.
        assert!(cool.sent.last().unwrap().starts_with('0'));
    }

    #[tokio::test]
    async fn test_unknown_command_letter_loses_without_error() {
        let mut game = orchestrator(10, &["a", "@", "gr", "xu", "#"], &["b", "@"]);

        let outcome = game.run().await.unwrap();

        assert_eq!(outcome, Outcome::Winner(Side::Hot));
        assert_eq!(
            game.state().result,
            Some(GameResult::LoseByInvalidCommand)
        );
    }

    #[tokio::test]
    async fn test_wrong_length_command_is_fatal() {
        let mut game = orchestrator(10, &["a", "@", "gr", "walk", "#"], &["b", "@"]);

        let err = game.run().await.unwrap_err();

        assert!(matches!(
            err,
            GameError::Protocol(ProtocolViolation::MalformedCommand { side: Side::Cool, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_ready_signal_is_fatal() {
        let mut game = orchestrator(10, &["a", "@"], &["b", "ready"]);

        let err = game.run().await.unwrap_err();

        match err {
            GameError::Protocol(ProtocolViolation::InvalidReadySignal { side, got }) => {
                assert_eq!(side, Side::Hot);
                assert_eq!(got, "ready");
            }
            other => panic!("Unexpected error: {}", other),
        }
        let (_, [cool, hot]) = game.into_parts();
        assert!(cool.sent.is_empty());
        assert!(hot.sent.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_turn_request_is_fatal() {
        let mut game = orchestrator(10, &["a", "@", "go"], &["b", "@"]);

        let err = game.run().await.unwrap_err();

        assert!(matches!(
            err,
            GameError::Protocol(ProtocolViolation::UnexpectedToken {
                expected: "gr",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_wrong_turn_end_keeps_action_applied() {
        let mut game = orchestrator(10, &["a", "@", "gr", "pd", "end"], &["b", "@"]);

        let err = game.run().await.unwrap_err();

        assert!(matches!(
            err,
            GameError::Protocol(ProtocolViolation::UnexpectedToken {
                expected: "#",
                ..
            })
        ));
        assert_eq!(
            game.state().board.get(Position::new(1, 2)),
            Some(Cell::Block)
        );
        assert_eq!(game.state().side_to_move, Side::Cool);
    }

    #[tokio::test]
    async fn test_disconnect_mid_game_is_fatal() {
        let mut game = orchestrator(10, &["a", "@", "gr"], &["b", "@"]);

        let err = game.run().await.unwrap_err();

        assert!(matches!(
            err,
            GameError::Transport(TransportError::ConnectionClosed(Side::Cool))
        ));
    }

    #[tokio::test]
    async fn test_peer_wait_times_out() {
        let state = test_state(10);
        let mut game = Orchestrator::new(state, [AbsentLink, AbsentLink])
            .with_peer_timeout(Duration::from_millis(20));

        let err = game.run().await.unwrap_err();

        assert!(matches!(
            err,
            GameError::Transport(TransportError::PeersTimeout(_))
        ));
    }
}
