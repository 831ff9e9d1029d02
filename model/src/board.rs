use std::collections::BTreeSet;

use ndarray::Array2;
use rand::Rng;
use tracing::{debug, trace};
use Color::{Blue, Cyan, Green, Magenta, Red, Yellow};

use crate::error::BoardError;

/// A joker is generated for roughly one tile in `JOKER_CHANCE`.
pub const JOKER_CHANCE: u32 = 12;

/// Largest supported width or height.
pub const MAX_DIMENSION: usize = 255;

const AXIS_OFFSETS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (2, 1),
    (1, 2),
    (-2, 1),
    (-1, 2),
    (2, -1),
    (1, -2),
    (-2, -1),
    (-1, -2),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
}

impl Color {
    /// The full palette, in the order colors are taken from it.
    pub const PALETTE: [Color; 6] = [Red, Green, Blue, Yellow, Cyan, Magenta];

    pub fn symbol(self) -> char {
        match self {
            Red => 'r',
            Green => 'g',
            Blue => 'b',
            Yellow => 'y',
            Cyan => 'c',
            Magenta => 'm',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::PALETTE.iter().copied().find(|c| c.symbol() == symbol)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tile {
    Color(Color),
    Joker,
}

impl Tile {
    pub fn color(self) -> Option<Color> {
        match self {
            Tile::Color(color) => Some(color),
            Tile::Joker => None,
        }
    }
}

/// Grid coordinate as `(x, y)`.
pub type Point = (usize, usize);

/// How a cell reached by a paint is treated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Visit {
    /// Recolor if it still has the original base color, and continue through its neighbors.
    Region,
    /// Recolor regardless of its color, then only probe its neighbors.
    Node,
    /// Never recolor; only record a joker found here.
    Probe,
}

/// The playing grid, the base position and the undo history.
///
/// Tiles are stored in an `(width, height)` array indexed by `[[x, y]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    tiles: Array2<Tile>,
    base: Point,
    history: Vec<Array2<Tile>>,
}

fn check_dimensions(width: usize, height: usize) -> Result<(), BoardError> {
    if (1..=MAX_DIMENSION).contains(&width) && (1..=MAX_DIMENSION).contains(&height) {
        Ok(())
    } else {
        Err(BoardError::InvalidDimensions { width, height })
    }
}

impl Board {
    /// Fills a new board with random colors and jokers.
    ///
    /// Only the first `colors_num` palette colors are used. The tile at (0, 0) is never a joker,
    /// and the base starts there.
    pub fn new<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        colors_num: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        check_dimensions(width, height)?;
        let palette_size = Color::PALETTE.len();
        if !(2..=palette_size).contains(&colors_num) {
            return Err(BoardError::InvalidColorCount {
                colors_num,
                palette_size,
            });
        }
        let palette = &Color::PALETTE[..colors_num];

        // Joker roll and color roll are separate draws.
        let tiles = Array2::from_shape_fn((width, height), |(x, y)| {
            if x + y > 0 && rng.gen_ratio(1, JOKER_CHANCE) {
                Tile::Joker
            } else {
                Tile::Color(palette[rng.gen_range(0..colors_num)])
            }
        });

        let board = Self::from_tiles(tiles)?;
        debug!(
            width,
            height,
            colors_num,
            jokers = board.tiles.iter().filter(|t| **t == Tile::Joker).count(),
            "board generated"
        );
        Ok(board)
    }

    /// Builds a board from a fixed layout, with the base at (0, 0).
    pub fn from_tiles(tiles: Array2<Tile>) -> Result<Self, BoardError> {
        let (width, height) = (tiles.shape()[0], tiles.shape()[1]);
        check_dimensions(width, height)?;
        if tiles[(0, 0)] == Tile::Joker {
            return Err(BoardError::JokerAtOrigin);
        }
        Ok(Self {
            tiles,
            base: (0, 0),
            history: Vec::new(),
        })
    }

    pub fn tiles(&self) -> &Array2<Tile> {
        &self.tiles
    }
    pub fn width(&self) -> usize {
        self.tiles.shape()[0]
    }
    pub fn height(&self) -> usize {
        self.tiles.shape()[1]
    }
    pub fn base(&self) -> Point {
        self.base
    }
    pub fn base_tile(&self) -> Tile {
        self.tiles[self.base]
    }
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn index(&self, x: isize, y: isize) -> Option<Point> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x < self.width() && y < self.height() {
            Some((x, y))
        } else {
            None
        }
    }

    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        self.index(x, y).is_some()
    }

    /// Moves the base.
    ///
    /// Fails, leaving the base where it was, if the position is out of bounds, is already the
    /// base, or holds a joker.
    pub fn set_base(&mut self, x: isize, y: isize) -> bool {
        match self.index(x, y) {
            Some(point) if point != self.base && self.tiles[point] != Tile::Joker => {
                self.base = point;
                true
            }
            _ => false,
        }
    }

    /// Paints from the base onwards and returns the jokers reached.
    ///
    /// The region of the base color connected to the base (up, down, left, right) takes the new
    /// color. Then every tile a chess knight move away from the base is colored too, without
    /// spreading into its own region. Jokers met on the way are collected, not colored; pass them
    /// to [`Board::resolve_jokers`].
    pub fn paint(&mut self, color: Color) -> BTreeSet<Point> {
        let mut jokers = BTreeSet::new();
        let original = self.base_tile();
        let (x, y) = (self.base.0 as isize, self.base.1 as isize);

        let mut painted = self.visit(color, original, &mut jokers, (x, y), Visit::Region);
        for (dx, dy) in KNIGHT_OFFSETS {
            painted += self.visit(color, original, &mut jokers, (x + dx, y + dy), Visit::Node);
        }

        debug!(
            color = %color.symbol(),
            painted,
            jokers = jokers.len(),
            "painted from base"
        );
        jokers
    }

    /// Colors the given jokers and everything around them.
    ///
    /// Each joker takes the color, and so do its 8 surrounding tiles. Jokers found among those
    /// surroundings, or right next to a tile colored this way, form the next wave. Waves repeat
    /// until none is left.
    pub fn resolve_jokers(&mut self, color: Color, mut jokers: BTreeSet<Point>) {
        let mut wave = 0;
        while !jokers.is_empty() {
            trace!(wave, size = jokers.len(), "joker wave");
            let mut next = BTreeSet::new();
            for &(x, y) in &jokers {
                match self.tiles.get_mut((x, y)) {
                    Some(tile) => *tile = Tile::Color(color),
                    None => continue,
                }
                let (x, y) = (x as isize, y as isize);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        self.visit(color, Tile::Joker, &mut next, (x + dx, y + dy), Visit::Node);
                    }
                }
            }
            // A joker queued early in a wave may have been colored later in the same wave.
            jokers = next
                .into_iter()
                .filter(|&point| self.tiles[point] == Tile::Joker)
                .collect();
            wave += 1;
        }
        if wave > 0 {
            debug!(color = %color.symbol(), waves = wave, "jokers resolved");
        }
    }

    /// Walks from `start`, coloring tiles as `mode` allows. Returns the number of tiles colored.
    ///
    /// Stops at the border and at tiles already in `color`. A joker is recorded in `jokers` and
    /// stops the walk too.
    fn visit(
        &mut self,
        color: Color,
        original: Tile,
        jokers: &mut BTreeSet<Point>,
        start: (isize, isize),
        mode: Visit,
    ) -> usize {
        let target = Tile::Color(color);
        let mut painted = 0;
        let mut pending = vec![(start, mode)];

        while let Some(((x, y), mode)) = pending.pop() {
            let point = match self.index(x, y) {
                Some(point) => point,
                None => continue,
            };
            let tile = self.tiles[point];
            if tile == Tile::Joker {
                jokers.insert(point);
                continue;
            }
            if tile == target {
                continue;
            }
            let paintable = match mode {
                Visit::Region => tile == original,
                Visit::Node => true,
                Visit::Probe => false,
            };
            if !paintable {
                continue;
            }

            self.tiles[point] = target;
            painted += 1;

            let next = match mode {
                Visit::Region => Visit::Region,
                Visit::Node | Visit::Probe => Visit::Probe,
            };
            for (dx, dy) in AXIS_OFFSETS {
                pending.push(((x + dx, y + dy), next));
            }
        }
        painted
    }

    /// The board is solved when every tile has the color of the tile at (0, 0).
    pub fn solved(&self) -> bool {
        let corner = self.tiles[(0, 0)];
        self.tiles.iter().all(|tile| *tile == corner)
    }

    /// Number of tiles that differ from the base tile.
    pub fn count_remaining_tiles(&self) -> usize {
        let base = self.base_tile();
        self.tiles.iter().filter(|tile| **tile != base).count()
    }

    /// Saves the tiles so the next move can be undone. The base position is not saved.
    pub fn save_board(&mut self) {
        self.history.push(self.tiles.clone());
    }

    /// Returns the tiles to the last saved state, if there is one.
    pub fn undo_board(&mut self) -> bool {
        match self.history.pop() {
            Some(tiles) => {
                self.tiles = tiles;
                debug!(remaining = self.history.len(), "board undone");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Board, Color, Tile};
    use ndarray::Array2;

    pub const R: Tile = Tile::Color(Color::Red);
    pub const G: Tile = Tile::Color(Color::Green);
    pub const B: Tile = Tile::Color(Color::Blue);
    pub const Y: Tile = Tile::Color(Color::Yellow);
    pub const J: Tile = Tile::Joker;

    pub fn board(tiles: Array2<Tile>) -> Board {
        Board::from_tiles(tiles).unwrap()
    }
}

#[test]
fn new_rejects_color_count_outside_palette() {
    use crate::error::BoardError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(0);
    for colors_num in [0, 1, 7, 100] {
        assert_eq!(
            Board::new(5, 5, colors_num, &mut rng),
            Err(BoardError::InvalidColorCount {
                colors_num,
                palette_size: 6
            })
        );
    }
    assert!(Board::new(5, 5, 2, &mut rng).is_ok());
    assert!(Board::new(5, 5, 6, &mut rng).is_ok());
}

#[test]
fn new_rejects_dimensions_outside_range() {
    use crate::error::BoardError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        Board::new(0, 5, 4, &mut rng),
        Err(BoardError::InvalidDimensions {
            width: 0,
            height: 5
        })
    );
    assert_eq!(
        Board::new(3, 256, 4, &mut rng),
        Err(BoardError::InvalidDimensions {
            width: 3,
            height: 256
        })
    );
    let board = Board::new(255, 1, 4, &mut rng).unwrap();
    assert_eq!((board.width(), board.height()), (255, 1));
}

#[test]
fn from_tiles_rejects_joker_at_origin() {
    use crate::board::tests::{J, R};
    use crate::error::BoardError;
    use ndarray::arr2;
    assert_eq!(
        Board::from_tiles(arr2(&[[J, R], [R, R]])),
        Err(BoardError::JokerAtOrigin)
    );
}

#[test]
fn generated_tiles_use_first_colors_only() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let colors_num = 2 + (seed as usize % 5);
        let board = Board::new(1 + seed as usize % 17, 1 + seed as usize % 13, colors_num, &mut rng)
            .unwrap();
        let allowed = &Color::PALETTE[..colors_num];
        assert_ne!(board.tiles()[(0, 0)], Tile::Joker);
        assert_eq!(board.base(), (0, 0));
        assert!(!board.has_history());
        for tile in board.tiles().iter() {
            match tile {
                Tile::Joker => {}
                Tile::Color(color) => assert!(allowed.contains(color), "{:?}", color),
            }
        }
    }
}

#[test]
fn generation_places_jokers_and_is_reproducible() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let first = Board::new(18, 18, 4, &mut StdRng::seed_from_u64(7)).unwrap();
    let second = Board::new(18, 18, 4, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(first, second);

    let jokers: usize = (0..20)
        .map(|seed| {
            Board::new(18, 18, 4, &mut StdRng::seed_from_u64(seed))
                .unwrap()
                .tiles()
                .iter()
                .filter(|t| **t == Tile::Joker)
                .count()
        })
        .sum();
    let cells = 20 * 18 * 18;
    assert!(jokers > cells / 24 && jokers < cells / 6, "{}", jokers);
}

#[test]
fn single_tile_board_is_always_solved() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    for seed in 0..20 {
        let board = Board::new(1, 1, 2, &mut StdRng::seed_from_u64(seed)).unwrap();
        let tile = board.tiles()[(0, 0)];
        assert!(tile == Tile::Color(Color::Red) || tile == Tile::Color(Color::Green));
        assert!(board.solved());
        assert_eq!(board.count_remaining_tiles(), 0);
    }
}

#[test]
fn set_base_rules() {
    use crate::board::tests::{board, G, J, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[[R, G, J], [G, R, G]]));

    assert!(!board.set_base(0, 0)); // already the base
    assert!(!board.set_base(0, 2)); // joker
    assert!(!board.set_base(-1, 0));
    assert!(!board.set_base(2, 0));
    assert!(!board.set_base(0, 3));
    assert_eq!(board.base(), (0, 0));

    assert!(board.set_base(1, 2));
    assert_eq!(board.base(), (1, 2));
    assert_eq!(board.base_tile(), G);
    assert!(board.set_base(0, 0));
    assert_eq!(board.base(), (0, 0));
}

#[test]
fn paint_fills_region_and_knight_tiles() {
    use crate::board::tests::{board, B, G, R, Y};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, R, G, B, B],
        [R, G, G, B, Y],
        [R, B, Y, Y, Y],
        [G, G, G, G, G],
        [B, B, B, B, B],
    ]));
    let jokers = board.paint(Color::Yellow);
    assert!(jokers.is_empty());
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [Y, Y, G, B, B],
            [Y, G, Y, B, Y],
            [Y, Y, Y, Y, Y],
            [G, G, G, G, G],
            [B, B, B, B, B],
        ])
    );
}

#[test]
fn paint_knight_tiles_do_not_spread() {
    use crate::board::tests::{board, B, G, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, G, R, R], //
        [G, G, R, R],
        [G, R, G, G],
    ]));
    board.paint(Color::Blue);
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [B, G, R, R], //
            [G, G, B, R],
            [G, B, G, G],
        ])
    );
}

#[test]
fn paint_collects_jokers_around_isolated_base() {
    use crate::board::tests::{board, B, G, J, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [G, J, G], //
        [J, R, B],
        [G, G, J],
    ]));
    assert!(board.set_base(1, 1));
    let jokers = board.paint(Color::Green);
    assert_eq!(jokers.into_iter().collect::<Vec<_>>(), vec![(0, 1), (1, 0)]);
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [G, J, G], //
            [J, G, B],
            [G, G, J],
        ])
    );
}

#[test]
fn paint_knight_tile_probes_neighbors_for_jokers() {
    use crate::board::tests::{board, B, G, J, R, Y};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, G, G, G], //
        [G, G, B, J],
        [G, G, G, G],
    ]));
    let jokers = board.paint(Color::Yellow);
    assert_eq!(jokers.into_iter().collect::<Vec<_>>(), vec![(1, 3)]);
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [Y, G, G, G], //
            [G, G, Y, J],
            [G, Y, G, G],
        ])
    );
}

#[test]
fn repeated_paint_still_visits_knight_tiles() {
    use crate::board::tests::{board, G, J, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, R, G], //
        [G, G, J],
        [R, G, G],
    ]));
    let first = board.paint(Color::Red);
    let tiles = board.tiles().clone();
    let second = board.paint(Color::Red);
    assert_eq!(first, second);
    assert_eq!(second.into_iter().collect::<Vec<_>>(), vec![(1, 2)]);
    assert_eq!(*board.tiles(), tiles);
}

#[test]
fn resolve_jokers_chains_waves() {
    use crate::board::tests::{board, B, G, J, R, Y};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, J, G, B],
        [G, G, J, B],
        [B, B, B, J],
        [Y, Y, G, G],
    ]));
    let jokers = board.paint(Color::Green);
    assert_eq!(
        jokers.iter().copied().collect::<Vec<_>>(),
        vec![(0, 1), (1, 2)]
    );
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [G, J, G, B],
            [G, G, J, B],
            [B, G, B, J],
            [Y, Y, G, G],
        ])
    );

    board.resolve_jokers(Color::Green, jokers);
    assert_eq!(
        *board.tiles(),
        arr2(&[
            [G, G, G, G],
            [G, G, G, G],
            [B, G, G, G],
            [Y, Y, G, G],
        ])
    );
    assert_eq!(board.count_remaining_tiles(), 3);
    assert!(!board.solved());
}

#[test]
fn resolve_jokers_without_jokers_does_nothing() {
    use crate::board::tests::{board, G, R};
    use ndarray::arr2;
    use std::collections::BTreeSet;
    let mut board = board(arr2(&[[R, G], [G, R]]));
    let before = board.clone();
    board.resolve_jokers(Color::Blue, BTreeSet::new());
    assert_eq!(board, before);
}

#[test]
fn undo_restores_tiles_but_not_base() {
    use crate::board::tests::{board, B, G, J, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[
        [R, J, G], //
        [G, B, R],
        [R, R, G],
    ]));
    let before = board.tiles().clone();

    board.save_board();
    assert!(board.set_base(2, 0));
    let jokers = board.paint(Color::Blue);
    board.resolve_jokers(Color::Blue, jokers);
    assert_ne!(*board.tiles(), before);
    assert!(board.has_history());

    assert!(board.undo_board());
    assert_eq!(*board.tiles(), before);
    assert_eq!(board.base(), (2, 0));
    assert!(!board.has_history());
}

#[test]
fn undo_without_history_fails() {
    use crate::board::tests::{board, G, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[[R, G], [G, R]]));
    let before = board.clone();
    assert!(!board.undo_board());
    assert_eq!(board, before);
}

#[test]
fn undo_is_last_in_first_out() {
    use crate::board::tests::{board, B, G, R};
    use ndarray::arr2;
    let mut board = board(arr2(&[[R, G, B], [B, G, R]]));
    let start = board.tiles().clone();
    board.save_board();
    board.paint(Color::Green);
    let middle = board.tiles().clone();
    board.save_board();
    board.paint(Color::Blue);
    assert_eq!(board.history_len(), 2);

    assert!(board.undo_board());
    assert_eq!(*board.tiles(), middle);
    assert!(board.undo_board());
    assert_eq!(*board.tiles(), start);
    assert!(!board.undo_board());
}

#[test]
fn solved_compares_with_corner() {
    use crate::board::tests::{board, G, R};
    use ndarray::arr2;
    assert!(board(arr2(&[[R, R], [R, R]])).solved());
    assert!(!board(arr2(&[[R, R], [R, G]])).solved());

    let mut board = board(arr2(&[[G, R], [R, R]]));
    assert!(board.set_base(0, 1));
    assert_eq!(board.count_remaining_tiles(), 1);
    assert!(!board.solved());
}

#[test]
fn paint_changes_only_region_and_knight_tiles() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new(9, 11, 4, &mut rng).unwrap();
        let before = board.tiles().clone();
        let original = board.base_tile();
        let color = Color::PALETTE[..4]
            .iter()
            .copied()
            .find(|c| Tile::Color(*c) != original)
            .unwrap();

        let mut region = BTreeSet::new();
        let mut pending = vec![(0isize, 0isize)];
        while let Some((x, y)) = pending.pop() {
            if !board.in_bounds(x, y) {
                continue;
            }
            let point = (x as usize, y as usize);
            if before[point] != original || !region.insert(point) {
                continue;
            }
            pending.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
        }
        let knights: BTreeSet<_> = KNIGHT_OFFSETS
            .iter()
            .filter(|(dx, dy)| board.in_bounds(*dx, *dy))
            .map(|&(dx, dy)| (dx as usize, dy as usize))
            .collect();

        let jokers = board.paint(color);
        for ((x, y), tile) in board.tiles().indexed_iter() {
            let point = (x, y);
            if region.contains(&point) {
                assert_eq!(*tile, Tile::Color(color), "seed {} at {:?}", seed, point);
            } else if before[point] == Tile::Joker {
                assert_eq!(*tile, Tile::Joker);
            } else if !knights.contains(&point) {
                assert_eq!(*tile, before[point], "seed {} at {:?}", seed, point);
            }
        }
        for joker in jokers {
            assert_eq!(before[joker], Tile::Joker);
        }
    }
}

#[test]
fn resolved_jokers_leave_no_adjacent_jokers() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new(12, 12, 3, &mut rng).unwrap();
        let color = Color::PALETTE[..3]
            .iter()
            .copied()
            .find(|c| Tile::Color(*c) != board.base_tile())
            .unwrap();
        let before = board.tiles().clone();
        let jokers = board.paint(color);
        board.resolve_jokers(color, jokers.clone());

        for joker in &jokers {
            assert_eq!(board.tiles()[*joker], Tile::Color(color));
        }
        // Every former joker was resolved, so none of its 8 neighbors may still be a joker.
        for ((x, y), tile) in before.indexed_iter() {
            if *tile != Tile::Joker || board.tiles()[(x, y)] == Tile::Joker {
                continue;
            }
            for dx in -1..=1isize {
                for dy in -1..=1isize {
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if board.in_bounds(nx, ny) {
                        assert_ne!(
                            board.tiles()[(nx as usize, ny as usize)],
                            Tile::Joker,
                            "seed {}",
                            seed
                        );
                    }
                }
            }
        }
    }
}
