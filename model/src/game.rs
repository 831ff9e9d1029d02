use rand::Rng;
use tracing::{debug, info};

use crate::board::{Board, Color};
use crate::error::{BoardError, MoveError};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub moves: u32,
    pub width: usize,
    pub height: usize,
    pub colors_num: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            moves: 21,
            width: 18,
            height: 18,
            colors_num: 4,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    Paint(Color),
    MoveBase { x: isize, y: isize },
    Undo,
    Quit,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Playing,
    Won,
    Lost,
    Quit,
}

/// A board together with the move budget.
pub struct Game {
    board: Board,
    moves: u32,
    colors_num: usize,
    quit: bool,
}

impl Game {
    pub fn new<R: Rng + ?Sized>(settings: Settings, rng: &mut R) -> Result<Self, BoardError> {
        let board = Board::new(settings.width, settings.height, settings.colors_num, rng)?;
        info!(?settings, "new game");
        Ok(Self {
            board,
            moves: settings.moves,
            colors_num: settings.colors_num,
            quit: false,
        })
    }

    pub fn from_board(board: Board, moves: u32, colors_num: usize) -> Result<Self, BoardError> {
        let palette_size = Color::PALETTE.len();
        if !(2..=palette_size).contains(&colors_num) {
            return Err(BoardError::InvalidColorCount {
                colors_num,
                palette_size,
            });
        }
        Ok(Self {
            board,
            moves,
            colors_num,
            quit: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Colors in play.
    pub fn palette(&self) -> &'static [Color] {
        &Color::PALETTE[..self.colors_num]
    }

    /// Colors the base can be painted with right now.
    pub fn available_colors(&self) -> Vec<Color> {
        let base = self.board.base_tile().color();
        self.palette()
            .iter()
            .copied()
            .filter(|color| Some(*color) != base)
            .collect()
    }

    pub fn status(&self) -> Status {
        if self.quit {
            Status::Quit
        } else if self.board.solved() {
            Status::Won
        } else if self.moves == 0 {
            Status::Lost
        } else {
            Status::Playing
        }
    }

    /// Plays one action. A rejected action leaves the game untouched.
    pub fn apply(&mut self, action: Action) -> Result<Status, MoveError> {
        if self.status() != Status::Playing {
            return Err(MoveError::GameOver);
        }
        match action {
            Action::Paint(color) => self.paint(color)?,
            Action::MoveBase { x, y } => {
                if !self.board.set_base(x, y) {
                    return Err(MoveError::InvalidBase { x, y });
                }
            }
            Action::Undo => {
                if !self.board.undo_board() {
                    return Err(MoveError::NoHistory);
                }
                self.moves += 1;
            }
            Action::Quit => self.quit = true,
        }
        let status = self.status();
        debug!(?action, moves = self.moves, ?status, "action applied");
        Ok(status)
    }

    fn paint(&mut self, color: Color) -> Result<(), MoveError> {
        if !self.available_colors().contains(&color) {
            return Err(MoveError::InvalidColor(color.symbol()));
        }
        self.board.save_board();
        let jokers = self.board.paint(color);
        self.board.resolve_jokers(color, jokers);
        self.moves -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Game, Settings, Status};
    use crate::board::tests::{board, B, G, J, R};
    use crate::board::Color;
    use crate::error::{BoardError, MoveError};
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_game_uses_settings() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = Game::new(Settings::default(), &mut rng).unwrap();
        assert_eq!(game.moves(), 21);
        assert_eq!((game.board().width(), game.board().height()), (18, 18));
        assert_eq!(game.palette().len(), 4);

        let settings = Settings {
            colors_num: 9,
            ..Settings::default()
        };
        assert!(matches!(
            Game::new(settings, &mut rng),
            Err(BoardError::InvalidColorCount { colors_num: 9, .. })
        ));
    }

    #[test]
    fn available_colors_skip_base_color() {
        let game = Game::from_board(board(arr2(&[[G, R], [B, R]])), 5, 3).unwrap();
        assert_eq!(game.available_colors(), vec![Color::Red, Color::Blue]);
    }

    #[test]
    fn paint_spends_a_move_and_saves_history() {
        let mut game = Game::from_board(board(arr2(&[[R, G, J], [B, G, R]])), 5, 3).unwrap();
        assert_eq!(game.apply(Action::Paint(Color::Green)), Ok(Status::Playing));
        assert_eq!(game.moves(), 4);
        assert!(game.board().has_history());
        assert_eq!(game.board().tiles()[(0, 0)], G);
    }

    #[test]
    fn paint_rejects_base_color_and_unused_colors() {
        let mut game = Game::from_board(board(arr2(&[[R, G], [B, G]])), 5, 3).unwrap();
        assert_eq!(
            game.apply(Action::Paint(Color::Red)),
            Err(MoveError::InvalidColor('r'))
        );
        assert_eq!(
            game.apply(Action::Paint(Color::Yellow)),
            Err(MoveError::InvalidColor('y'))
        );
        assert_eq!(game.moves(), 5);
        assert!(!game.board().has_history());
    }

    #[test]
    fn move_base_is_free() {
        let mut game = Game::from_board(board(arr2(&[[R, J], [B, G]])), 5, 3).unwrap();
        assert_eq!(
            game.apply(Action::MoveBase { x: 0, y: 1 }),
            Err(MoveError::InvalidBase { x: 0, y: 1 })
        );
        assert_eq!(
            game.apply(Action::MoveBase { x: 1, y: 1 }),
            Ok(Status::Playing)
        );
        assert_eq!(game.board().base(), (1, 1));
        assert_eq!(game.moves(), 5);
    }

    #[test]
    fn undo_gives_the_move_back() {
        let mut game = Game::from_board(board(arr2(&[[R, G], [B, G]])), 5, 3).unwrap();
        assert_eq!(game.apply(Action::Undo), Err(MoveError::NoHistory));

        let before = game.board().tiles().clone();
        game.apply(Action::Paint(Color::Blue)).unwrap();
        assert_eq!(game.moves(), 4);
        assert_eq!(game.apply(Action::Undo), Ok(Status::Playing));
        assert_eq!(game.moves(), 5);
        assert_eq!(*game.board().tiles(), before);
    }

    #[test]
    fn last_move_can_win() {
        let mut game = Game::from_board(board(arr2(&[[R, G], [G, G]])), 1, 2).unwrap();
        assert_eq!(game.apply(Action::Paint(Color::Green)), Ok(Status::Won));
        assert_eq!(game.moves(), 0);
        assert_eq!(
            game.apply(Action::Paint(Color::Red)),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn running_out_of_moves_loses() {
        let mut game = Game::from_board(board(arr2(&[[R, G], [B, G]])), 1, 3).unwrap();
        assert_eq!(game.apply(Action::Paint(Color::Green)), Ok(Status::Lost));
        assert_eq!(game.apply(Action::Undo), Err(MoveError::GameOver));
    }

    #[test]
    fn quit_ends_the_game() {
        let mut game = Game::from_board(board(arr2(&[[R, G], [B, G]])), 3, 3).unwrap();
        assert_eq!(game.apply(Action::Quit), Ok(Status::Quit));
        assert_eq!(game.status(), Status::Quit);
        assert_eq!(game.apply(Action::Undo), Err(MoveError::GameOver));
    }
}
