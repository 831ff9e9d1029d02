use thiserror::Error;

/// Errors that abort board construction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid number of colors: {colors_num} (must be 2-{palette_size})")]
    InvalidColorCount {
        colors_num: usize,
        palette_size: usize,
    },

    #[error("Invalid board size: {width}x{height} (each side must be 1-255)")]
    InvalidDimensions { width: usize, height: usize },

    /// The origin cell must hold a color.
    #[error("Tile (0, 0) cannot be a joker")]
    JokerAtOrigin,
}

/// Rejected player actions. None of them change the game state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("Position ({x}, {y}) is not valid")]
    InvalidBase { x: isize, y: isize },

    #[error("Color {0} is invalid")]
    InvalidColor(char),

    #[error("Undo is not possible")]
    NoHistory,

    #[error("The game is over")]
    GameOver,
}
