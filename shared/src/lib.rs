//! Wire vocabulary and data model shared by the CHaser server and clients.
//!
//! Everything that crosses a connection lives here: the line tokens of the
//! handshake and turn exchange, the two-character command encoding, and the
//! nine-digit observation string. The board grid and the map description
//! loader are in [`board`] and [`map`].

pub mod board;
pub mod map;

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_COOL_PORT: u16 = 40000;
pub const DEFAULT_HOT_PORT: u16 = 50000;
pub const DEFAULT_TIMEOUT_MS: u64 = 180_000;

/// Team names are cut to this many characters.
pub const MAX_NAME_LEN: usize = 8;

pub const LINE_DELIMITER: &str = "\r\n";
pub const READY_TOKEN: &str = "@";
pub const TURN_REQUEST_TOKEN: &str = "gr";
pub const TURN_END_TOKEN: &str = "#";

/// Number of cells returned by LOOK and SEARCH.
pub const SCAN_LEN: usize = 9;

/// Contents of one grid square.
///
/// `Player` is only ever produced by observations; the board never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Floor,
    Player,
    Block,
    Item,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Cell::Floor => 0,
            Cell::Player => 1,
            Cell::Block => 2,
            Cell::Item => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Floor),
            1 => Some(Cell::Player),
            2 => Some(Cell::Block),
            3 => Some(Cell::Item),
            _ => None,
        }
    }

    pub fn as_digit(self) -> char {
        char::from(b'0' + self.code())
    }

    /// Cells a player can stand on or walk through.
    pub fn is_open(self) -> bool {
        matches!(self, Cell::Floor | Cell::Item)
    }
}

/// Grid coordinates; `x` is the column and `y` the row, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position `distance` steps away along `direction`.
    pub fn offset(self, direction: Direction, distance: i32) -> Position {
        let (dx, dy) = direction.delta();
        Position {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
        }
    }

    pub fn step(self, direction: Direction) -> Position {
        self.offset(direction, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the two participants. Cool always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Cool,
    Hot,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Cool, Side::Hot];

    pub fn opponent(self) -> Side {
        match self {
            Side::Cool => Side::Hot,
            Side::Hot => Side::Cool,
        }
    }

    /// Stable index for side-keyed arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Cool => 0,
            Side::Hot => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Cool => "cool",
            Side::Hot => "hot",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn from_char(c: char) -> Option<Direction> {
        match c {
            'u' => Some(Direction::Up),
            'r' => Some(Direction::Right),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Right => 'r',
            Direction::Down => 'd',
            Direction::Left => 'l',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Walk,
    Put,
    Look,
    Search,
}

impl Action {
    pub fn from_char(c: char) -> Option<Action> {
        match c {
            'w' => Some(Action::Walk),
            'p' => Some(Action::Put),
            'l' => Some(Action::Look),
            's' => Some(Action::Search),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Action::Walk => 'w',
            Action::Put => 'p',
            Action::Look => 'l',
            Action::Search => 's',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command must be exactly 2 characters, got {0}")]
    WrongLength(usize),
    #[error("unknown action {0:?}")]
    UnknownAction(char),
    #[error("unknown direction {0:?}")]
    UnknownDirection(char),
}

/// A parsed two-character command token such as `wu` or `pl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub action: Action,
    pub direction: Direction,
}

impl Command {
    pub fn new(action: Action, direction: Direction) -> Self {
        Self { action, direction }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let (Some(action), Some(direction), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(CommandError::WrongLength(token.chars().count()));
        };

        let action = Action::from_char(action).ok_or(CommandError::UnknownAction(action))?;
        let direction =
            Direction::from_char(direction).ok_or(CommandError::UnknownDirection(direction))?;
        Ok(Command { action, direction })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action.as_char(), self.direction.as_char())
    }
}

/// How a game ended, attributed to the side that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    WinByPut,
    LoseByWallHit,
    LoseByBlockHit,
    LoseByInvalidCommand,
    DrawByMutualPut,
    WinByItemCount,
    Draw,
}

/// Whether a [`GameResult`] is a win, loss or draw for the side it is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn verdict(self) -> Verdict {
        match self {
            GameResult::WinByPut | GameResult::WinByItemCount => Verdict::Win,
            GameResult::LoseByWallHit
            | GameResult::LoseByBlockHit
            | GameResult::LoseByInvalidCommand => Verdict::Loss,
            GameResult::DrawByMutualPut | GameResult::Draw => Verdict::Draw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WinByPut => "win_by_put",
            GameResult::LoseByWallHit => "lose_by_wall_hit",
            GameResult::LoseByBlockHit => "lose_by_block_hit",
            GameResult::LoseByInvalidCommand => "lose_by_invalid_command",
            GameResult::DrawByMutualPut => "draw_by_mutual_put",
            GameResult::WinByItemCount => "win_by_item_count",
            GameResult::Draw => "draw",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    #[error("observation must be 9 digits, got {0:?}")]
    WrongLength(String),
    #[error("invalid running flag {0:?}")]
    InvalidFlag(char),
    #[error("invalid cell code {0:?}")]
    InvalidCell(char),
}

/// The nine-character string sent before and after every action: a running
/// flag followed by the 8 cells around the mover, row-major, center skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub running: bool,
    pub cells: [Cell; 8],
}

impl Observation {
    /// Index into `cells` of the orthogonal neighbor in `direction`.
    pub fn neighbor_index(direction: Direction) -> usize {
        match direction {
            Direction::Up => 1,
            Direction::Left => 3,
            Direction::Right => 4,
            Direction::Down => 6,
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Cell {
        self.cells[Self::neighbor_index(direction)]
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.running { "1" } else { "0" })?;
        for cell in &self.cells {
            write!(f, "{}", cell.as_digit())?;
        }
        Ok(())
    }
}

impl FromStr for Observation {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(ObservationError::WrongLength(s.to_string()));
        }

        let running = match chars[0] {
            '1' => true,
            '0' => false,
            other => return Err(ObservationError::InvalidFlag(other)),
        };

        let mut cells = [Cell::Floor; 8];
        for (slot, &c) in cells.iter_mut().zip(&chars[1..]) {
            *slot = c
                .to_digit(10)
                .and_then(|d| Cell::from_code(d as u8))
                .ok_or(ObservationError::InvalidCell(c))?;
        }

        Ok(Observation { running, cells })
    }
}

/// Cuts a team name to at most [`MAX_NAME_LEN`] characters.
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}
