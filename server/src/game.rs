use chaser_shared::board::Board;
use chaser_shared::map::MapDefinition;
use chaser_shared::{Cell, GameResult, Observation, Position, Side, Verdict};
use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub side: Side,
    pub name: String,
    pub position: Position,
    pub item_count: u32,
}

impl Player {
    pub fn new(side: Side, position: Position) -> Self {
        Self {
            side,
            name: String::new(),
            position,
            item_count: 0,
        }
    }
}

/// Final standing of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

/// Authoritative state of one game, owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct GameState {
    pub map_name: String,
    pub board: Board,
    /// Indexed by [`Side::index`].
    pub players: [Player; 2],
    pub side_to_move: Side,
    /// Current round, starting at 1. A round is a cool turn then a hot turn.
    pub round: u32,
    pub turn_limit: u32,
    pub outcome: Option<Outcome>,
    /// The result that decided `outcome`.
    pub result: Option<GameResult>,
}

impl GameState {
    pub fn new(map: MapDefinition) -> Self {
        Self {
            map_name: map.name,
            board: map.board,
            players: [
                Player::new(Side::Cool, map.cool_start),
                Player::new(Side::Hot, map.hot_start),
            ],
            side_to_move: Side::Cool,
            round: 1,
            turn_limit: map.turn_limit,
            outcome: None,
            result: None,
        }
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut Player {
        &mut self.players[side.index()]
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn winner(&self) -> Option<Side> {
        match self.outcome {
            Some(Outcome::Winner(side)) => Some(side),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.outcome == Some(Outcome::Draw)
    }

    /// Ends the game with `result` attributed to `side`.
    ///
    /// The first recorded result is final; later calls are ignored.
    pub fn conclude(&mut self, side: Side, result: GameResult) {
        if self.is_over() {
            return;
        }

        let outcome = match result.verdict() {
            Verdict::Win => Outcome::Winner(side),
            Verdict::Loss => Outcome::Winner(side.opponent()),
            Verdict::Draw => Outcome::Draw,
        };
        info!("Game over: {} by {} -> {:?}", result, side, outcome);
        self.outcome = Some(outcome);
        self.result = Some(result);
    }

    /// Hands the move to the other side, counting a round each time cool is up again.
    pub fn switch_side(&mut self) {
        self.side_to_move = self.side_to_move.opponent();
        if self.side_to_move == Side::Cool {
            self.round += 1;
        }
    }

    /// The 8 cells around `side`'s position as that side sees them.
    pub fn observe(&self, side: Side) -> Observation {
        let center = self.player(side).position;
        let opponent = self.player(side.opponent()).position;
        let mut cells = [Cell::Floor; 8];
        let mut slots = cells.iter_mut();

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let pos = Position::new(center.x + dx, center.y + dy);
                let cell = if pos == opponent {
                    Cell::Player
                } else {
                    self.board.get(pos).unwrap_or(Cell::Block)
                };
                if let Some(slot) = slots.next() {
                    *slot = cell;
                }
            }
        }

        Observation {
            running: !self.is_over(),
            cells,
        }
    }
}
