pub mod board;
pub mod error;
pub mod game;

pub use board::{Board, Color, Point, Tile};
pub use error::{BoardError, MoveError};
pub use game::{Action, Game, Settings, Status};
