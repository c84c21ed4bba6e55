//! Tile-based level geometry.
//!
//! Levels are authored as ASCII grids, one character per tile:
//!
//! | glyph | meaning |
//! |-------|---------|
//! | `#`   | solid tile |
//! | `~`   | solid ice tile |
//! | `=`   | one-way platform |
//! | `P`   | player spawn (empty tile) |
//! | `S`   | respawn point (empty tile) |
//! | `.` or space | empty |
//!
//! Spawn glyphs mark the tile a character stands *in*; the stored position
//! is the bottom-centre of that tile, where the feet rest.
use std::{fs, path::Path};

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Aabb;
use crate::numeric::{cell_index, count_to_f32, index_to_f32};

/// A small arena used by the CLI when no level file is given.
pub const DEMO_ARENA: &str = "\
........................................
........................................
...S................................S...
..........######........######..........
........................................
........................................
...=======....................=======...
........................................
........................................
..............====......====............
.................P......................
##########..~~~~~~~~~~~~~~~~~~~~..######
........................................
........................................
....S..........................S........
...========..................========...
........................................
........................................
.........####################...........
........................................
....S..............................S....
########....########################....
";

/// Errors raised while building a [`TileMap`].
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("row {row} has {found} tiles, expected {expected}")]
    /// Rows differ in length.
    Ragged {
        /// Offending row, top first.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    /// A glyph outside the level alphabet.
    UnknownGlyph {
        /// The character found.
        glyph: char,
        /// Its row, top first.
        row: usize,
        /// Its column, left first.
        column: usize,
    },
    #[error("tile size must be positive, got {0}")]
    /// Tile size was zero, negative or not finite.
    InvalidTileSize(f32),
    #[error("failed to read level {path}: {source}")]
    /// The level file could not be read.
    Io {
        /// File that failed to open.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level file: {0}")]
    /// The level file is not valid JSON.
    Json(#[from] serde_json::Error),
}

/// One cell of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    /// Open space.
    Empty,
    /// Blocks from every side.
    Solid,
    /// Solid and slippery.
    Ice,
    /// Solid from above only.
    OneWay,
}

impl Tile {
    /// Blocks movement from every side.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Solid | Self::Ice)
    }

    /// Can be stood on.
    #[must_use]
    pub const fn is_floor(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

enum Marker {
    None,
    Player,
    Spawn,
}

fn classify(glyph: char) -> Option<(Tile, Marker)> {
    match glyph {
        '#' => Some((Tile::Solid, Marker::None)),
        '~' => Some((Tile::Ice, Marker::None)),
        '=' => Some((Tile::OneWay, Marker::None)),
        'P' => Some((Tile::Empty, Marker::Player)),
        'S' => Some((Tile::Empty, Marker::Spawn)),
        '.' | ' ' => Some((Tile::Empty, Marker::None)),
        _ => None,
    }
}

/// On-disk JSON form of a level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    /// Edge length of a tile in pixels.
    pub tile_size: f32,
    /// Grid rows, top first, one glyph per tile.
    pub rows: Vec<String>,
}

/// Read-only queries the simulation makes against level geometry.
#[cfg_attr(test, mockall::automock)]
pub trait WorldQuery {
    /// True when the floor directly under `feet` is ice.
    fn is_surface_ice(&self, feet: Vec2) -> bool;
    /// Rectangle bodies wrap around when they leave it.
    fn used_platform_bounds(&self) -> Aabb;
}

/// Dense tile grid with spawn markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileMap {
    tile_size: f32,
    columns: usize,
    rows: usize,
    tiles: Vec<Tile>,
    player_spawns: Vec<Vec2>,
    spawn_points: Vec<Vec2>,
}

impl TileMap {
    /// Parses an ASCII grid. Blank leading and trailing lines are ignored.
    ///
    /// # Errors
    /// Returns [`LevelError`] for ragged rows, unknown glyphs or a
    /// non-positive tile size.
    pub fn parse(text: &str, tile_size: f32) -> Result<Self, LevelError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let top = lines.iter().position(|l| !l.trim().is_empty());
        let bottom = lines.iter().rposition(|l| !l.trim().is_empty());
        let body = match (top, bottom) {
            (Some(first), Some(last)) => lines.get(first..=last).unwrap_or_default(),
            _ => &[],
        };
        Self::from_rows(body, tile_size)
    }

    /// Builds a map from pre-split rows.
    ///
    /// # Errors
    /// As [`TileMap::parse`].
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, LevelError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(LevelError::InvalidTileSize(tile_size));
        }
        let columns = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut map = Self {
            tile_size,
            columns,
            rows: rows.len(),
            tiles: Vec::with_capacity(columns * rows.len()),
            player_spawns: Vec::new(),
            spawn_points: Vec::new(),
        };
        for (row, raw) in rows.iter().enumerate() {
            let line = raw.as_ref();
            let found = line.chars().count();
            if found != columns {
                return Err(LevelError::Ragged {
                    row,
                    expected: columns,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let (tile, marker) =
                    classify(glyph).ok_or(LevelError::UnknownGlyph { glyph, row, column })?;
                map.tiles.push(tile);
                let feet = Vec2::new(
                    (count_to_f32(column) + 0.5) * tile_size,
                    count_to_f32(row + 1) * tile_size,
                );
                match marker {
                    Marker::Player => map.player_spawns.push(feet),
                    Marker::Spawn => map.spawn_points.push(feet),
                    Marker::None => {}
                }
            }
        }
        if map.tiles.is_empty() {
            warn!("level has no tiles; bodies will fall forever");
        }
        Ok(map)
    }

    /// Parses the JSON [`LevelFile`] form.
    ///
    /// # Errors
    /// Returns [`LevelError::Json`] for malformed JSON, otherwise as
    /// [`TileMap::from_rows`].
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        Self::from_rows(&file.rows, file.tile_size)
    }

    /// Loads a level from disk. `.json` files use the [`LevelFile`] form;
    /// anything else is read as an ASCII grid with the default tile size.
    ///
    /// # Errors
    /// Returns [`LevelError::Io`] when the file cannot be read, otherwise as
    /// the matching parser.
    pub fn load(path: impl AsRef<Path>, default_tile_size: f32) -> Result<Self, LevelError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| LevelError::Io {
            path: file.display().to_string(),
            source,
        })?;
        if file.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)
        } else {
            Self::parse(&text, default_tile_size)
        }
    }

    /// Edge length of a tile.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Feet positions of `P` markers.
    #[must_use]
    pub fn player_spawns(&self) -> &[Vec2] {
        &self.player_spawns
    }

    /// Feet positions of `S` markers.
    #[must_use]
    pub fn spawn_points(&self) -> &[Vec2] {
        &self.spawn_points
    }

    /// Tile at a grid cell. Cells outside the grid are empty.
    #[must_use]
    pub fn tile(&self, column: i32, row: i32) -> Tile {
        let (Ok(column), Ok(row)) = (usize::try_from(column), usize::try_from(row)) else {
            return Tile::Empty;
        };
        if column >= self.columns || row >= self.rows {
            return Tile::Empty;
        }
        self.tiles
            .get(row * self.columns + column)
            .copied()
            .unwrap_or_default()
    }

    /// Grid cell containing a world position.
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            cell_index(position.x, self.tile_size),
            cell_index(position.y, self.tile_size),
        )
    }

    /// Tile containing a world position.
    #[must_use]
    pub fn tile_at(&self, position: Vec2) -> Tile {
        let (column, row) = self.cell_of(position);
        self.tile(column, row)
    }

    /// World-space y of the top edge of `row`.
    #[must_use]
    pub fn row_top(&self, row: i32) -> f32 {
        index_to_f32(row) * self.tile_size
    }

    /// World-space x of the left edge of `column`.
    #[must_use]
    pub fn column_left(&self, column: i32) -> f32 {
        index_to_f32(column) * self.tile_size
    }

    /// Rectangle covered by the grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec2::ZERO,
            Vec2::new(
                count_to_f32(self.columns) * self.tile_size,
                count_to_f32(self.rows) * self.tile_size,
            ),
        )
    }
}

impl WorldQuery for TileMap {
    fn is_surface_ice(&self, feet: Vec2) -> bool {
        // Feet rest exactly on the tile boundary, so sample just below it.
        self.tile_at(Vec2::new(feet.x, feet.y + self.tile_size * 0.25)) == Tile::Ice
    }

    fn used_platform_bounds(&self) -> Aabb {
        self.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SMALL: &str = "
S..P
.==.
#~~#
";

    #[rstest]
    fn parses_tiles_and_markers() {
        let map = TileMap::parse(SMALL, 16.0).expect("level should parse");
        assert_eq!((map.columns(), map.rows()), (4, 3));
        assert_eq!(map.tile(0, 2), Tile::Solid);
        assert_eq!(map.tile(1, 2), Tile::Ice);
        assert_eq!(map.tile(1, 1), Tile::OneWay);
        assert_eq!(map.tile(0, 0), Tile::Empty);
        assert_eq!(map.spawn_points(), &[Vec2::new(8.0, 16.0)]);
        assert_eq!(map.player_spawns(), &[Vec2::new(56.0, 16.0)]);
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(0, -1)]
    #[case(4, 0)]
    #[case(0, 3)]
    fn outside_cells_are_empty(#[case] column: i32, #[case] row: i32) {
        let map = TileMap::parse(SMALL, 16.0).expect("level should parse");
        assert_eq!(map.tile(column, row), Tile::Empty);
    }

    #[rstest]
    fn ice_is_detected_under_feet() {
        let map = TileMap::parse(SMALL, 16.0).expect("level should parse");
        assert!(map.is_surface_ice(Vec2::new(24.0, 32.0)));
        assert!(!map.is_surface_ice(Vec2::new(8.0, 32.0)));
        assert!(!map.is_surface_ice(Vec2::new(24.0, 16.0)));
    }

    #[rstest]
    fn ragged_rows_are_rejected() {
        let err = TileMap::parse("...\n..\n", 16.0).expect_err("ragged level");
        assert!(matches!(
            err,
            LevelError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[rstest]
    fn unknown_glyphs_are_rejected() {
        let err = TileMap::parse("..x\n", 16.0).expect_err("bad glyph");
        assert!(matches!(err, LevelError::UnknownGlyph { glyph: 'x', column: 2, .. }));
    }

    #[rstest]
    fn json_form_round_trips_through_rows() {
        let json = r###"{ "tile_size": 8.0, "rows": ["..", "##"] }"###;
        let map = TileMap::from_json_str(json).expect("json level");
        assert_eq!(map.tile_size(), 8.0);
        assert_eq!(map.used_platform_bounds().max, Vec2::new(16.0, 16.0));
    }

    #[rstest]
    fn demo_arena_parses() {
        let map = TileMap::parse(DEMO_ARENA, 16.0).expect("demo arena should parse");
        assert_eq!(map.player_spawns().len(), 1);
        assert!(map.spawn_points().len() >= 4);
    }
}
