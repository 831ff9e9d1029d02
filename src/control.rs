use lazy_static::lazy_static;
use model::{Action, Color};
use std::collections::HashSet;

lazy_static! {
    /// 'q', ESC and DEL.
    static ref QUIT_KEYS: HashSet<char> = ['q', '\u{1b}', '\u{7f}'].iter().copied().collect();
}

pub const UNDO_KEY: char = 'u';
pub const CHANGE_BASE_KEY: char = 's';

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Action(Action),
    /// Change of base requested without coordinates; they come on the next line.
    AskBase,
    Unknown(char),
    Empty,
}

/// Reads one input line. Only the first non-blank character picks the action.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_start();
    let key = match line.chars().next() {
        Some(key) => key.to_ascii_lowercase(),
        None => return Command::Empty,
    };
    if key == UNDO_KEY {
        Command::Action(Action::Undo)
    } else if key == CHANGE_BASE_KEY {
        match parse_base(&line[key.len_utf8()..]) {
            Some((x, y)) => Command::Action(Action::MoveBase { x, y }),
            None => Command::AskBase,
        }
    } else if QUIT_KEYS.contains(&key) {
        Command::Action(Action::Quit)
    } else if let Some(color) = Color::from_symbol(key) {
        Command::Action(Action::Paint(color))
    } else {
        Command::Unknown(key)
    }
}

/// Parses `column row` into board coordinates `(x, y)`.
///
/// The board is printed with `x` down the side and `y` along the top, so the column is `y`.
pub fn parse_base(text: &str) -> Option<(isize, isize)> {
    let mut values = text.split_whitespace().map(str::parse::<isize>);
    match (values.next(), values.next(), values.next()) {
        (Some(Ok(column)), Some(Ok(row)), None) => Some((row, column)),
        _ => None,
    }
}
