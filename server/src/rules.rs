//! Rule engine for WALK, PUT, LOOK and SEARCH.
//!
//! All functions operate on the side to move and complete synchronously.
//! A terminal result is recorded on the [`GameState`] as soon as it is
//! produced, so the post-action observation already reports the game as over.

use crate::game::GameState;
use chaser_shared::board::Board;
use chaser_shared::{Action, Cell, Command, Direction, GameResult, Position, Side, SCAN_LEN};

/// What a single action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub game_result: Option<GameResult>,
    pub new_position: Option<Position>,
    pub item_obtained: Option<bool>,
    /// LOOK and SEARCH output.
    pub cells: Option<[Cell; SCAN_LEN]>,
}

impl ActionResult {
    fn failed(game_result: Option<GameResult>) -> Self {
        Self {
            success: false,
            game_result,
            new_position: None,
            item_obtained: None,
            cells: None,
        }
    }

    fn succeeded(game_result: Option<GameResult>) -> Self {
        Self {
            success: true,
            ..Self::failed(game_result)
        }
    }

    fn scanned(cells: [Cell; SCAN_LEN]) -> Self {
        Self {
            cells: Some(cells),
            ..Self::succeeded(None)
        }
    }
}

/// Applies `command` for the side to move.
pub fn execute(state: &mut GameState, command: Command) -> ActionResult {
    let mover = state.side_to_move;
    let result = match command.action {
        Action::Walk => walk(state, mover, command.direction),
        Action::Put => put(state, mover, command.direction),
        Action::Look => ActionResult::scanned(look(state, mover, command.direction)),
        Action::Search => ActionResult::scanned(search(state, mover, command.direction)),
    };

    if let Some(game_result) = result.game_result {
        state.conclude(mover, game_result);
    }
    result
}

/// The side to move sent a command token that names no known action or direction.
pub fn reject_command(state: &mut GameState) -> ActionResult {
    let mover = state.side_to_move;
    state.conclude(mover, GameResult::LoseByInvalidCommand);
    ActionResult::failed(Some(GameResult::LoseByInvalidCommand))
}

fn walk(state: &mut GameState, mover: Side, direction: Direction) -> ActionResult {
    let origin = state.player(mover).position;
    let target = origin.step(direction);
    let opponent = state.player(mover.opponent()).position;

    let cell = match state.board.get(target) {
        None => return ActionResult::failed(Some(GameResult::LoseByWallHit)),
        Some(Cell::Block) => return ActionResult::failed(Some(GameResult::LoseByBlockHit)),
        Some(cell) => cell,
    };
    // No displacing: running into the opponent counts as hitting a wall.
    if target == opponent {
        return ActionResult::failed(Some(GameResult::LoseByWallHit));
    }

    state.player_mut(mover).position = target;

    let item_obtained = cell == Cell::Item;
    let mut game_result = None;
    if item_obtained {
        state.player_mut(mover).item_count += 1;
        state.board.set(target, Cell::Floor);
        state.board.set(origin, Cell::Block);

        if is_surrounded(&state.board, opponent) {
            game_result = Some(GameResult::WinByPut);
        }
    }

    ActionResult {
        new_position: Some(target),
        item_obtained: Some(item_obtained),
        ..ActionResult::succeeded(game_result)
    }
}

fn put(state: &mut GameState, mover: Side, direction: Direction) -> ActionResult {
    let position = state.player(mover).position;
    let target = position.step(direction);
    let opponent = state.player(mover.opponent()).position;

    match state.board.get(target) {
        None | Some(Cell::Block) | Some(Cell::Item) => return ActionResult::failed(None),
        Some(_) => {}
    }

    if target == opponent {
        return ActionResult::succeeded(Some(GameResult::WinByPut));
    }

    state.board.set(target, Cell::Block);

    let game_result = if is_surrounded(&state.board, position) {
        Some(GameResult::DrawByMutualPut)
    } else if is_surrounded(&state.board, opponent) {
        Some(GameResult::WinByPut)
    } else {
        None
    };
    ActionResult::succeeded(game_result)
}

/// The 3x3 block centered one step from the mover, row-major.
pub fn look(state: &GameState, mover: Side, direction: Direction) -> [Cell; SCAN_LEN] {
    let center = state.player(mover).position.step(direction);
    let players = [state.player(Side::Cool).position, state.player(Side::Hot).position];

    let mut cells = [Cell::Block; SCAN_LEN];
    for (i, cell) in cells.iter_mut().enumerate() {
        let pos = Position::new(center.x + (i % 3) as i32 - 1, center.y + (i / 3) as i32 - 1);
        *cell = match state.board.get(pos) {
            None => Cell::Block,
            Some(_) if players.contains(&pos) => Cell::Player,
            Some(board_cell) => board_cell,
        };
    }
    cells
}

/// The 9 cells at distances 1 through 9 from the mover along `direction`.
pub fn search(state: &GameState, mover: Side, direction: Direction) -> [Cell; SCAN_LEN] {
    let origin = state.player(mover).position;
    let opponent = state.player(mover.opponent()).position;

    let mut cells = [Cell::Block; SCAN_LEN];
    for (i, cell) in cells.iter_mut().enumerate() {
        let pos = origin.offset(direction, i as i32 + 1);
        *cell = match state.board.get(pos) {
            None => Cell::Block,
            Some(_) if pos == opponent => Cell::Player,
            Some(board_cell) => board_cell,
        };
    }
    cells
}

/// True iff every orthogonal neighbor of `pos` is a block or off the board.
pub fn is_surrounded(board: &Board, pos: Position) -> bool {
    Direction::ALL
        .iter()
        .all(|&d| matches!(board.get(pos.step(d)), None | Some(Cell::Block)))
}

/// Ends the game on item count once the round counter reaches the limit.
///
/// Returns true if this call ended the game.
pub fn check_turn_limit(state: &mut GameState) -> bool {
    if state.is_over() || state.round < state.turn_limit {
        return false;
    }

    let cool = state.player(Side::Cool).item_count;
    let hot = state.player(Side::Hot).item_count;
    match cool.cmp(&hot) {
        std::cmp::Ordering::Greater => state.conclude(Side::Cool, GameResult::WinByItemCount),
        std::cmp::Ordering::Less => state.conclude(Side::Hot, GameResult::WinByItemCount),
        std::cmp::Ordering::Equal => state.conclude(state.side_to_move, GameResult::Draw),
    }
    true
}
