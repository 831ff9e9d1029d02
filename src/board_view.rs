use lazy_static::lazy_static;
use model::{Board, Color, Game, Status, Tile};
use std::collections::HashMap;
use std::fmt::Write;

const FOREGROUND: u8 = 30;
const BACKGROUND: u8 = 40;
const BLACK: u8 = 0;
const WHITE: u8 = 7;
const RESET: &str = "\x1b[0m";

lazy_static! {
    static ref COLOR_CODES: HashMap<Color, u8> = [
        (Color::Red, 1),
        (Color::Green, 2),
        (Color::Yellow, 3),
        (Color::Blue, 4),
        (Color::Magenta, 5),
        (Color::Cyan, 6),
    ]
    .iter()
    .copied()
    .collect();
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::Red => "red",
        Color::Green => "green",
        Color::Blue => "blue",
        Color::Yellow => "yellow",
        Color::Cyan => "cyan",
        Color::Magenta => "magenta",
    }
}

/// Two digit ruler index, alternating black and white.
fn index_label(i: usize) -> String {
    let (fg, bg) = if i % 2 == 1 {
        (WHITE, BLACK)
    } else {
        (BLACK, WHITE)
    };
    format!(
        "\x1b[{};{}m{:02}{}",
        fg + FOREGROUND,
        bg + BACKGROUND,
        i.min(99),
        RESET
    )
}

fn ruler(out: &mut String, height: usize) {
    out.push_str("  ");
    for y in 0..height {
        out.push_str(&index_label(y));
    }
    out.push('\n');
}

/// Draws the board. The base tile shows the remaining moves.
pub fn render(board: &Board, moves: u32) -> String {
    let mut out = String::from("\n--= Board =--\n");
    ruler(&mut out, board.height());
    for x in 0..board.width() {
        out.push_str(&index_label(x));
        for y in 0..board.height() {
            match board.tiles()[(x, y)] {
                Tile::Joker => {
                    out.push_str("\x1b[1mJK");
                    out.push_str(RESET);
                }
                Tile::Color(color) if (x, y) == board.base() => {
                    let _ = write!(
                        out,
                        "\x1b[{}m{:02}{}",
                        COLOR_CODES[&color] + FOREGROUND,
                        moves.min(99),
                        RESET
                    );
                }
                Tile::Color(color) => {
                    let _ = write!(out, "\x1b[{}m  {}", COLOR_CODES[&color] + BACKGROUND, RESET);
                }
            }
        }
        out.push_str(&index_label(x));
        out.push('\n');
    }
    ruler(&mut out, board.height());
    out.push('\n');
    out
}

pub fn intro(game: &Game) -> String {
    let controls = Color::PALETTE
        .iter()
        .map(|color| format!("'{}' - {}", color.symbol(), color_name(*color)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "--= Coloring Game =--\n\n\
         Try to fill the whole board ({}X{}) in {} moves or less.\n\
         Controls are: {}, 'u' - undo, 's' - change base, 'q' ESC DEL - quit.\n",
        game.board().height(),
        game.board().width(),
        game.moves(),
        controls
    )
}

pub fn prompt(game: &Game) -> String {
    let colors: String = game
        .available_colors()
        .iter()
        .map(|color| color.symbol())
        .collect();
    format!(
        "{} moves left to fill {} more tiles, Enter action [{}] ({}s): ",
        game.moves(),
        game.board().count_remaining_tiles(),
        colors,
        if game.board().has_history() { "u, " } else { "" }
    )
}

pub fn outcome(status: Status) -> &'static str {
    match status {
        Status::Won => "--= Congrats you win =--",
        Status::Lost => "--= Boo you lose =--",
        Status::Quit => "\n--= Rookie move... =--",
        Status::Playing => "",
    }
}

#[cfg(test)]
mod tests {
    use super::{index_label, outcome, prompt, render};
    use model::{Action, Board, Color, Game, Status, Tile};
    use ndarray::arr2;

    const R: Tile = Tile::Color(Color::Red);
    const G: Tile = Tile::Color(Color::Green);
    const J: Tile = Tile::Joker;

    #[test]
    fn index_labels_alternate() {
        assert_eq!(index_label(0), "\x1b[30;47m00\x1b[0m");
        assert_eq!(index_label(1), "\x1b[37;40m01\x1b[0m");
        assert_eq!(index_label(12), "\x1b[30;47m12\x1b[0m");
        assert_eq!(index_label(150), "\x1b[30;47m99\x1b[0m");
    }

    #[test]
    fn render_marks_base_and_jokers() {
        let board = Board::from_tiles(arr2(&[[R, J], [G, R]])).unwrap();
        let text = render(&board, 7);
        assert!(text.starts_with("\n--= Board =--\n"));
        assert!(text.contains("\x1b[31m07\x1b[0m"));
        assert!(text.contains("\x1b[1mJK\x1b[0m"));
        assert!(text.contains("\x1b[42m  \x1b[0m"));
        assert!(text.contains("\x1b[41m  \x1b[0m"));
        // blank, title, two rulers, two rows, blank
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn prompt_offers_undo_only_with_history() {
        let board = Board::from_tiles(arr2(&[[R, G], [G, G]])).unwrap();
        let mut game = Game::from_board(board, 5, 3).unwrap();
        assert_eq!(
            prompt(&game),
            "5 moves left to fill 3 more tiles, Enter action [gb] (s): "
        );
        game.apply(Action::Paint(Color::Blue)).unwrap();
        assert_eq!(
            prompt(&game),
            "4 moves left to fill 3 more tiles, Enter action [rg] (u, s): "
        );
    }

    #[test]
    fn outcomes() {
        assert_eq!(outcome(Status::Won), "--= Congrats you win =--");
        assert_eq!(outcome(Status::Lost), "--= Boo you lose =--");
        assert!(outcome(Status::Quit).contains("Rookie move"));
    }
}
