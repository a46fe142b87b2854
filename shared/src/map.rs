//! Loader for the line-oriented map description.
//!
//! A map is a sequence of prefixed records:
//!
//! ```text
//! N:name
//! T:max-turn-count
//! S:height,width
//! D:0,0,3,...      (one per row)
//! C:row,col        (cool start)
//! H:row,col        (hot start)
//! ```
//!
//! Everything is validated here so that the server never opens a socket for
//! a map it cannot play.

use crate::board::Board;
use crate::{Cell, Position};

/// Size of the tournament board as (height, width).
pub const STANDARD_SIZE: (usize, usize) = (15, 17);
/// Minimum item count on a tournament board.
pub const STANDARD_MIN_ITEMS: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("missing {0} record")]
    MissingRecord(&'static str),
    #[error("malformed {record} record: {line:?}")]
    MalformedRecord { record: &'static str, line: String },
    #[error("invalid number {value:?} in {record} record")]
    InvalidNumber { record: &'static str, value: String },
    #[error("invalid cell code {0} (expected 0, 2 or 3)")]
    InvalidCell(String),
    #[error("turn limit must be at least 1")]
    ZeroTurnLimit,
    #[error("declared size {declared_height}x{declared_width} does not match {actual_height} rows of {actual_width} columns")]
    DimensionMismatch {
        declared_height: usize,
        declared_width: usize,
        actual_height: usize,
        actual_width: usize,
    },
    #[error("map must be {required_height}x{required_width}, got {height}x{width}")]
    WrongSize {
        required_height: usize,
        required_width: usize,
        height: usize,
        width: usize,
    },
    #[error("{record} start {pos} is outside the board")]
    StartOutOfBounds { record: &'static str, pos: Position },
    #[error("{record} start {pos} is on a block")]
    StartOnBlock { record: &'static str, pos: Position },
    #[error("both players start on {0}")]
    SharedStart(Position),
    #[error("map has {found} items, at least {required} required")]
    InsufficientItems { found: usize, required: usize },
    #[error("items and blocks are not point-symmetric about the board center")]
    AsymmetricPlacement,
}

/// Optional constraints on top of the structural checks every map must pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapRules {
    /// Exact (height, width) the board must have.
    pub required_size: Option<(usize, usize)>,
    pub min_items: usize,
}

impl MapRules {
    /// Tournament rules: a 15x17 board with at least 36 items.
    pub fn standard() -> Self {
        Self {
            required_size: Some(STANDARD_SIZE),
            min_items: STANDARD_MIN_ITEMS,
        }
    }
}

/// A validated initial game configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDefinition {
    pub name: String,
    pub turn_limit: u32,
    pub board: Board,
    pub cool_start: Position,
    pub hot_start: Position,
}

impl MapDefinition {
    /// Parses and validates a map description.
    pub fn parse(text: &str, rules: &MapRules) -> Result<Self, MapError> {
        let mut name = String::new();
        let mut turn_limit = None;
        let mut size = None;
        let mut rows = Vec::new();
        let mut cool_start = None;
        let mut hot_start = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((prefix, body)) = line.split_once(':') else {
                continue;
            };
            match prefix {
                "N" => name = body.to_string(),
                "T" => turn_limit = Some(parse_number::<u32>("T", body)?),
                "S" => {
                    let [height, width] = parse_pair("S", line, body)?;
                    size = Some((height, width));
                }
                "D" => rows.push(parse_row(body)?),
                "C" => cool_start = Some(parse_start("C", line, body)?),
                "H" => hot_start = Some(parse_start("H", line, body)?),
                _ => {}
            }
        }

        let turn_limit = turn_limit.ok_or(MapError::MissingRecord("T"))?;
        let (height, width) = size.ok_or(MapError::MissingRecord("S"))?;
        let cool_start = cool_start.ok_or(MapError::MissingRecord("C"))?;
        let hot_start = hot_start.ok_or(MapError::MissingRecord("H"))?;

        if turn_limit == 0 {
            return Err(MapError::ZeroTurnLimit);
        }

        let actual_height = rows.len();
        let actual_width = rows.first().map_or(0, Vec::len);
        let mismatch = MapError::DimensionMismatch {
            declared_height: height,
            declared_width: width,
            actual_height,
            actual_width,
        };
        if actual_height != height || rows.iter().any(|row| row.len() != width) {
            return Err(mismatch);
        }
        let board = Board::from_rows(rows).ok_or(mismatch)?;

        if let Some((required_height, required_width)) = rules.required_size {
            if (height, width) != (required_height, required_width) {
                return Err(MapError::WrongSize {
                    required_height,
                    required_width,
                    height,
                    width,
                });
            }
        }

        for (record, pos) in [("C", cool_start), ("H", hot_start)] {
            match board.get(pos) {
                None => return Err(MapError::StartOutOfBounds { record, pos }),
                Some(Cell::Block) => return Err(MapError::StartOnBlock { record, pos }),
                Some(_) => {}
            }
        }
        if cool_start == hot_start {
            return Err(MapError::SharedStart(cool_start));
        }

        let found = board.count(Cell::Item);
        if found < rules.min_items {
            return Err(MapError::InsufficientItems {
                found,
                required: rules.min_items,
            });
        }

        if !board.is_point_symmetric() {
            return Err(MapError::AsymmetricPlacement);
        }

        Ok(MapDefinition {
            name,
            turn_limit,
            board,
            cool_start,
            hot_start,
        })
    }
}

fn parse_number<T: std::str::FromStr>(record: &'static str, value: &str) -> Result<T, MapError> {
    value.trim().parse().map_err(|_| MapError::InvalidNumber {
        record,
        value: value.to_string(),
    })
}

fn parse_pair(record: &'static str, line: &str, body: &str) -> Result<[usize; 2], MapError> {
    let fields: Vec<&str> = body.split(',').collect();
    let [first, second] = fields[..] else {
        return Err(MapError::MalformedRecord {
            record,
            line: line.to_string(),
        });
    };
    Ok([parse_number(record, first)?, parse_number(record, second)?])
}

/// Start records are `row,col`, i.e. `y,x`.
fn parse_start(record: &'static str, line: &str, body: &str) -> Result<Position, MapError> {
    let [row, col] = parse_pair(record, line, body)?;
    let to_coord = |v: usize| {
        i32::try_from(v).map_err(|_| MapError::InvalidNumber {
            record,
            value: v.to_string(),
        })
    };
    Ok(Position::new(to_coord(col)?, to_coord(row)?))
}

fn parse_row(body: &str) -> Result<Vec<Cell>, MapError> {
    body.split(',')
        .map(|field| {
            let code: u8 = parse_number("D", field)?;
            match Cell::from_code(code) {
                Some(Cell::Player) | None => Err(MapError::InvalidCell(field.trim().to_string())),
                Some(cell) => Ok(cell),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_MAP: &str = "N:small
T:20
S:3,5
D:0,2,0,3,0
D:3,0,0,0,3
D:0,3,0,2,0
C:1,1
H:1,3";

    #[test]
    fn test_parse_small_map() {
        let map = MapDefinition::parse(SMALL_MAP, &MapRules::default()).unwrap();
        assert_eq!(map.name, "small");
        assert_eq!(map.turn_limit, 20);
        assert_eq!(map.board.height(), 3);
        assert_eq!(map.board.width(), 5);
        assert_eq!(map.cool_start, Position::new(1, 1));
        assert_eq!(map.hot_start, Position::new(3, 1));
        assert_eq!(map.board.get(Position::new(1, 0)), Some(Cell::Block));
        assert_eq!(map.board.get(Position::new(0, 1)), Some(Cell::Item));
        assert_eq!(map.board.count(Cell::Item), 4);
    }

    #[test]
    fn test_cells_preserved_in_order() {
        let map = MapDefinition::parse(SMALL_MAP, &MapRules::default()).unwrap();
        let rendered: Vec<String> = map
            .board
            .rows()
            .map(|row| {
                row.iter()
                    .map(|c| c.code().to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        assert_eq!(rendered, vec!["0,2,0,3,0", "3,0,0,0,3", "0,3,0,2,0"]);
    }

    #[test]
    fn test_crlf_and_blank_lines_tolerated() {
        let text = SMALL_MAP.replace('\n', "\r\n\r\n");
        assert!(MapDefinition::parse(&text, &MapRules::default()).is_ok());
    }

    #[test]
    fn test_missing_records() {
        let without_size = SMALL_MAP.replace("S:3,5\n", "");
        assert_eq!(
            MapDefinition::parse(&without_size, &MapRules::default()),
            Err(MapError::MissingRecord("S"))
        );

        let without_hot = SMALL_MAP.replace("\nH:1,3", "");
        assert_eq!(
            MapDefinition::parse(&without_hot, &MapRules::default()),
            Err(MapError::MissingRecord("H"))
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let taller = SMALL_MAP.replace("S:3,5", "S:4,5");
        assert!(matches!(
            MapDefinition::parse(&taller, &MapRules::default()),
            Err(MapError::DimensionMismatch { .. })
        ));

        let ragged = SMALL_MAP.replace("D:3,0,0,0,3", "D:3,0,0,3");
        assert!(matches!(
            MapDefinition::parse(&ragged, &MapRules::default()),
            Err(MapError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_asymmetric_placement_rejected() {
        let asymmetric = SMALL_MAP.replace("D:0,3,0,2,0", "D:0,3,0,0,0");
        assert_eq!(
            MapDefinition::parse(&asymmetric, &MapRules::default()),
            Err(MapError::AsymmetricPlacement)
        );
    }

    #[test]
    fn test_invalid_cells_and_numbers() {
        let player_cell = SMALL_MAP.replace("D:3,0,0,0,3", "D:3,0,1,0,3");
        assert_eq!(
            MapDefinition::parse(&player_cell, &MapRules::default()),
            Err(MapError::InvalidCell("1".to_string()))
        );

        let bad_turns = SMALL_MAP.replace("T:20", "T:lots");
        assert!(matches!(
            MapDefinition::parse(&bad_turns, &MapRules::default()),
            Err(MapError::InvalidNumber { record: "T", .. })
        ));

        let bad_size = SMALL_MAP.replace("S:3,5", "S:3");
        assert!(matches!(
            MapDefinition::parse(&bad_size, &MapRules::default()),
            Err(MapError::MalformedRecord { record: "S", .. })
        ));
    }

    #[test]
    fn test_zero_turn_limit_rejected() {
        let zero = SMALL_MAP.replace("T:20", "T:0");
        assert_eq!(
            MapDefinition::parse(&zero, &MapRules::default()),
            Err(MapError::ZeroTurnLimit)
        );
    }

    #[test]
    fn test_start_positions_validated() {
        let outside = SMALL_MAP.replace("C:1,1", "C:1,9");
        assert!(matches!(
            MapDefinition::parse(&outside, &MapRules::default()),
            Err(MapError::StartOutOfBounds { record: "C", .. })
        ));

        let on_block = SMALL_MAP.replace("C:1,1", "C:0,1");
        assert!(matches!(
            MapDefinition::parse(&on_block, &MapRules::default()),
            Err(MapError::StartOnBlock { record: "C", .. })
        ));

        let shared = SMALL_MAP.replace("H:1,3", "H:1,1");
        assert_eq!(
            MapDefinition::parse(&shared, &MapRules::default()),
            Err(MapError::SharedStart(Position::new(1, 1)))
        );
    }

    #[test]
    fn test_rules_enforced() {
        let min_items = MapRules {
            required_size: None,
            min_items: 5,
        };
        assert_eq!(
            MapDefinition::parse(SMALL_MAP, &min_items),
            Err(MapError::InsufficientItems {
                found: 4,
                required: 5
            })
        );

        assert!(matches!(
            MapDefinition::parse(SMALL_MAP, &MapRules::standard()),
            Err(MapError::WrongSize { .. })
        ));
    }
}
