mod board_view;
mod control;

use std::io::{self, BufRead, Lines, Write};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use clap::Parser;
use model::{Action, Game, MoveError, Settings, Status};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use control::Command;

const USAGE: &str = "Usage: coloring [MOVES (21)] [HEIGHT (18) WIDTH (18)] [COLORS_NUM (4)]";

/// Fill the whole board with a single color before the moves run out.
#[derive(Debug, Parser)]
#[command(name = "coloring", version, about, long_about = None)]
struct CliArgs {
    /// MOVES, or MOVES HEIGHT WIDTH, or MOVES HEIGHT WIDTH COLORS_NUM.
    #[arg(value_name = "VALUES")]
    values: Vec<u32>,
    /// Seed for the board generator. Defaults to the current time.
    #[arg(long)]
    seed: Option<u64>,
}

impl CliArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        match *self.values.as_slice() {
            [] => {}
            [moves] => settings.moves = moves,
            [moves, height, width] => {
                settings.moves = moves;
                settings.height = height as usize;
                settings.width = width as usize;
            }
            [moves, height, width, colors_num] => {
                settings.moves = moves;
                settings.height = height as usize;
                settings.width = width as usize;
                settings.colors_num = colors_num as usize;
            }
            _ => bail!(USAGE),
        }
        Ok(settings)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

/// Reads lines until one of them is accepted as an action. End of input quits.
fn turn<B: BufRead, W: Write>(game: &mut Game, lines: &mut Lines<B>, out: &mut W) -> Result<()> {
    loop {
        let line = match lines.next().transpose()? {
            Some(line) => line,
            None => {
                game.apply(Action::Quit)?;
                return Ok(());
            }
        };
        let action = match control::parse_command(&line) {
            Command::Empty => continue,
            Command::Action(action) => action,
            Command::Unknown(key) => {
                write!(out, "{}, retry: ", MoveError::InvalidColor(key))?;
                out.flush()?;
                continue;
            }
            Command::AskBase => {
                writeln!(out, "Enter new base (column row):")?;
                out.flush()?;
                let line = match lines.next().transpose()? {
                    Some(line) => line,
                    None => {
                        game.apply(Action::Quit)?;
                        return Ok(());
                    }
                };
                match control::parse_base(&line) {
                    Some((x, y)) => Action::MoveBase { x, y },
                    None => {
                        write!(out, "Position is not valid, retry: ")?;
                        out.flush()?;
                        continue;
                    }
                }
            }
        };
        match game.apply(action) {
            Ok(_) => return Ok(()),
            Err(error) => {
                write!(out, "{}, retry: ", error)?;
                out.flush()?;
            }
        }
    }
}

fn play<B: BufRead, W: Write>(game: &mut Game, input: B, out: &mut W) -> Result<Status> {
    write!(out, "{}", board_view::intro(game))?;
    let mut lines = input.lines();
    while game.status() == Status::Playing {
        write!(out, "{}", board_view::render(game.board(), game.moves()))?;
        write!(out, "{}", board_view::prompt(game))?;
        out.flush()?;
        turn(game, &mut lines, out)?;
    }

    let status = game.status();
    if status != Status::Quit {
        write!(out, "{}", board_view::render(game.board(), game.moves()))?;
    }
    writeln!(out, "{}", board_view::outcome(status))?;
    Ok(status)
}

fn run(args: CliArgs) -> Result<Status> {
    let settings = args.settings()?;
    let seed = args.seed.unwrap_or_else(clock_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(settings, &mut rng)?;
    info!(seed, "board ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let status = play(&mut game, stdin.lock(), &mut stdout.lock())?;
    info!(?status, moves = game.moves(), "game finished");
    Ok(status)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let status = run(CliArgs::parse())?;
    Ok(if status == Status::Won {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::{play, CliArgs};
    use clap::Parser;
    use model::{Board, Color, Game, Settings, Status, Tile};
    use ndarray::arr2;
    use std::io::Cursor;

    const R: Tile = Tile::Color(Color::Red);
    const G: Tile = Tile::Color(Color::Green);
    const B: Tile = Tile::Color(Color::Blue);

    fn settings(args: &[&str]) -> anyhow::Result<Settings> {
        CliArgs::try_parse_from(std::iter::once("coloring").chain(args.iter().copied()))?.settings()
    }

    fn game(tiles: ndarray::Array2<Tile>, moves: u32) -> Game {
        Game::from_board(Board::from_tiles(tiles).unwrap(), moves, 3).unwrap()
    }

    #[test]
    fn cli_value_counts() {
        assert_eq!(settings(&[]).unwrap(), Settings::default());
        assert_eq!(
            settings(&["30"]).unwrap(),
            Settings {
                moves: 30,
                ..Settings::default()
            }
        );
        assert_eq!(
            settings(&["30", "10", "12"]).unwrap(),
            Settings {
                moves: 30,
                height: 10,
                width: 12,
                colors_num: 4
            }
        );
        assert_eq!(
            settings(&["30", "10", "12", "6"]).unwrap(),
            Settings {
                moves: 30,
                height: 10,
                width: 12,
                colors_num: 6
            }
        );
        assert!(settings(&["30", "10"]).is_err());
        assert!(settings(&["1", "2", "3", "4", "5"]).is_err());
        assert!(settings(&["ten"]).is_err());
    }

    #[test]
    fn cli_seed() {
        let args = CliArgs::try_parse_from(["coloring", "--seed", "42", "9"]).unwrap();
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.settings().unwrap().moves, 9);
    }

    #[test]
    fn play_until_won() {
        let mut game = game(arr2(&[[R, G], [G, G]]), 3);
        let mut out = Vec::new();
        let status = play(&mut game, Cursor::new("\nx\nr\ng\n"), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(status, Status::Won);
        assert_eq!(game.moves(), 2);
        assert!(out.contains("Color x is invalid, retry: "));
        assert!(out.contains("Color r is invalid, retry: "));
        assert!(out.ends_with("--= Congrats you win =--\n"));
    }

    #[test]
    fn play_until_out_of_moves() {
        let mut game = game(arr2(&[[R, G], [B, G]]), 1);
        let mut out = Vec::new();
        let status = play(&mut game, Cursor::new("u\ng\n"), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(status, Status::Lost);
        assert!(out.contains("Undo is not possible, retry: "));
        assert!(out.ends_with("--= Boo you lose =--\n"));
    }

    #[test]
    fn change_base_then_quit() {
        let mut game = game(arr2(&[[R, G], [B, G]]), 4);
        let mut out = Vec::new();
        let input = "s\n5 5\ns\n1 0\nq\n";
        let status = play(&mut game, Cursor::new(input), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(status, Status::Quit);
        assert_eq!(game.board().base(), (0, 1));
        assert!(out.contains("Enter new base (column row):"));
        assert!(out.contains("Position (5, 5) is not valid, retry: "));
        assert!(out.contains("Rookie move"));
    }

    #[test]
    fn end_of_input_quits() {
        let mut game = game(arr2(&[[R, G], [B, G]]), 4);
        let mut out = Vec::new();
        let status = play(&mut game, Cursor::new(""), &mut out).unwrap();
        assert_eq!(status, Status::Quit);
        assert_eq!(game.moves(), 4);
    }
}
