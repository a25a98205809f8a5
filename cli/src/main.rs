//! # Tile Merge CLI
//!
//! Command-line interface for playing the tile merge puzzle interactively or
//! running headless simulations with configurable policies.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Read, Write};
use tile_merge_core::{Direction, Game, GameConfig};

#[derive(Parser, Debug)]
#[command(name = "tile-merge")]
#[command(author, version, about = "Play the tile merge puzzle in the terminal or run simulations")]
struct Args {
    /// Number of episodes to run in headless mode (interactive if omitted)
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Side length of the board
    #[arg(long, default_value = "4")]
    size: usize,

    /// Tiles placed on a fresh board
    #[arg(long, default_value = "2")]
    initial_tiles: usize,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> GameConfig {
        GameConfig {
            size: self.size,
            initial_tiles: self.initial_tiles,
            ..GameConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random valid moves
    Random,
    /// Cycle through directions: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    args.config().validate().context("invalid board configuration")?;

    if let Some(episodes) = args.episodes {
        run_headless(&args, episodes)
    } else {
        run_interactive(&args)
    }
}

/// Run interactive mode where user plays with keyboard.
fn run_interactive(args: &Args) -> Result<()> {
    let mut game = Game::new(args.config(), args.seed)?;
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    // Set terminal to raw mode for single-key input. Restored when the guard
    // drops, including on an early `?` return.
    let _raw = RawMode::enable();
    redraw(&game)?;

    loop {
        let bytes_read = stdin.read(&mut buffer).unwrap_or(0);
        if bytes_read == 0 {
            continue;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(dir) => {
                if game.is_over() {
                    continue;
                }
                let swipe = game.swipe(dir)?;
                if !swipe.moved {
                    continue;
                }
                // No animation in a terminal: the move is presented as soon
                // as it is resolved.
                let settle = game.settle()?;
                redraw(&game)?;

                let merges = swipe.outcomes.iter().filter(|o| o.destroyed).count();
                if merges > 0 {
                    println!("  {} merge{}", merges, if merges == 1 { "" } else { "s" });
                }
                if settle.terminal {
                    println!("\n  *** GAME OVER ***");
                    println!("  Moves: {}", game.moves());
                    println!("  Max Tile: {}", game.max_tile());
                    println!("\n  Press R to restart or Q to quit");
                }
            }
            InputAction::Restart => {
                game.reset(args.seed);
                redraw(&game)?;
            }
            InputAction::Quit => {
                println!("\nGoodbye!");
                return Ok(());
            }
            InputAction::None => {}
        }
    }
}

/// Run headless simulation mode.
fn run_headless(args: &Args, episodes: u32) -> Result<()> {
    let mut total_moves: u64 = 0;
    let mut max_tile_overall: u32 = 0;
    let mut moves: Vec<u32> = Vec::with_capacity(episodes as usize);
    let mut max_tiles: Vec<u32> = Vec::with_capacity(episodes as usize);

    // Separate RNG for direction selection
    let mut policy_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(episode as u64);
        let mut game = Game::new(args.config(), episode_seed)?;
        let mut steps = 0;
        let mut cycle = 0;

        while !game.is_over() && (args.max_steps == 0 || steps < args.max_steps) {
            let direction = match args.policy {
                Policy::Random => select_random_direction(&game, &mut policy_rng),
                Policy::Cycle => select_cycle_direction(&game, &mut cycle),
            };
            let Some(dir) = direction else {
                break;
            };

            let result = game.step(dir);
            steps += 1;
            debug!("episode {} step {}: {:?} {:?}", episode + 1, steps, dir, result);

            if args.verbose {
                println!("Episode {} Step {}: {:?}", episode + 1, steps, dir);
                print_game(&game)?;
            }
        }

        let max_tile = game.max_tile();
        moves.push(game.moves());
        max_tiles.push(max_tile);
        total_moves += u64::from(game.moves());
        max_tile_overall = max_tile_overall.max(max_tile);
        info!(
            "episode {} finished: moves={} max_tile={} over={}",
            episode + 1,
            game.moves(),
            max_tile,
            game.is_over()
        );
    }

    let avg_moves = total_moves as f64 / episodes.max(1) as f64;
    moves.sort_unstable();

    // Count tile distribution
    let mut tile_counts = std::collections::BTreeMap::new();
    for tile in &max_tiles {
        *tile_counts.entry(*tile).or_insert(0u32) += 1;
    }

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", args.seed);
    println!("size={}", args.size);
    println!("max_steps={}", args.max_steps);
    println!("avg_moves={:.2}", avg_moves);
    println!("min_moves={}", moves.first().unwrap_or(&0));
    println!("max_moves={}", moves.last().unwrap_or(&0));
    println!("max_tile_overall={}", max_tile_overall);
    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{}:{}", tile, count))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
    Ok(())
}

/// Select a random legal direction.
fn select_random_direction(game: &Game, rng: &mut SmallRng) -> Option<Direction> {
    let legal = game.legal_directions();
    let candidates: Vec<Direction> = Direction::all()
        .into_iter()
        .zip(legal)
        .filter(|(_, ok)| *ok)
        .map(|(d, _)| d)
        .collect();

    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

/// Select directions in a cycle: Left, Down, Right, Up.
fn select_cycle_direction(game: &Game, cycle: &mut usize) -> Option<Direction> {
    let order = [
        Direction::Left,
        Direction::Down,
        Direction::Right,
        Direction::Up,
    ];
    let legal = game.legal_directions();

    // Try directions in cycle order, starting from current position
    for _ in 0..order.len() {
        let dir = order[*cycle % order.len()];
        *cycle += 1;
        if legal[dir as usize] {
            return Some(dir);
        }
    }
    None
}

enum InputAction {
    Move(Direction),
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(Direction::Up),
        [b's'] | [b'S'] => InputAction::Move(Direction::Down),
        [b'a'] | [b'A'] => InputAction::Move(Direction::Left),
        [b'd'] | [b'D'] => InputAction::Move(Direction::Right),

        // Control keys
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

fn redraw(game: &Game) -> Result<()> {
    println!("\x1b[2J\x1b[H"); // Clear screen
    println!("=== Tile Merge ===");
    println!("Controls: WASD or Arrow Keys | Q to quit | R to restart\n");
    print_game(game)
}

fn print_game(game: &Game) -> Result<()> {
    print!("{}", game);
    io::stdout().flush()?;
    Ok(())
}

/// Keeps the terminal in raw mode for as long as it is alive.
struct RawMode;

impl RawMode {
    fn enable() -> Self {
        enable_raw_mode();
        RawMode
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        disable_raw_mode();
    }
}

// Platform-specific terminal raw mode handling
#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // Without raw mode each key needs Enter
}

#[cfg(not(unix))]
fn disable_raw_mode() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert!(matches!(parse_input(&[27, 91, 65]), InputAction::Move(Direction::Up)));
        assert!(matches!(parse_input(b"a"), InputAction::Move(Direction::Left)));
        assert!(matches!(parse_input(b"D"), InputAction::Move(Direction::Right)));
        assert!(matches!(parse_input(b"q"), InputAction::Quit));
        assert!(matches!(parse_input(b"r"), InputAction::Restart));
        assert!(matches!(parse_input(b"x"), InputAction::None));
    }

    #[test]
    fn test_cycle_policy_skips_illegal() {
        let game = Game::new(GameConfig::default(), 3).unwrap();
        let mut cycle = 0;
        let dir = select_cycle_direction(&game, &mut cycle).unwrap();
        assert!(game.legal_directions()[dir as usize]);
    }

    #[cfg(unix)]
    fn terminal_flags() -> Option<libc::tcflag_t> {
        use std::os::unix::io::AsRawFd;
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(io::stdin().as_raw_fd(), &mut termios) != 0 {
                return None;
            }
            Some(termios.c_lflag & (libc::ICANON | libc::ECHO))
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_mode_restored_on_early_return() {
        fn fails_inside_raw_mode() -> Result<()> {
            let _raw = RawMode::enable();
            anyhow::bail!("swipe failed");
        }

        let before = terminal_flags();
        assert!(fails_inside_raw_mode().is_err());
        // Only meaningful when stdin is a terminal; otherwise both are None.
        if before.is_some() {
            assert_eq!(terminal_flags(), Some(libc::ICANON | libc::ECHO));
        }
    }

    #[test]
    fn test_args_build_config() {
        let args = Args::parse_from(["tile-merge", "--size", "5", "--initial-tiles", "3"]);
        let config = args.config();
        assert_eq!(config.size, 5);
        assert_eq!(config.initial_tiles, 3);
        assert_eq!(config.spawn_per_move, 1);
    }
}
