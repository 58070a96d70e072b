//! Headless mode for the tier board.
//!
//! This module provides a simple text-based interface for generating and
//! exporting boards without a TUI. It's designed for scripting and
//! automated testing.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tierboard_core::config::{parse_attempts, parse_ladder};
use tierboard_core::{
    BoardConfig, BoardState, BoardView, ConfigError, EntitySource, SessionError, SinkAttempt,
    TierBoard,
};

use crate::app::summarize;

const HELP: &[&str] = &[
    "  #generate      - Generate a new board",
    "  #export        - Copy the board as a PNG (or share / save it)",
    "  #show          - Print the current board",
    "  #show --json   - Print the current board and run report as JSON",
    "  #status        - Show board state and settings",
    "  #help          - Show this help",
    "  #quit          - Exit",
];

/// Run the board in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - Lines starting with `#` are commands
/// - Output lines are tagged (`[BOARD]`, `[EXPORTED]`, `[ERROR]`, ...)
pub async fn run_headless(config: BoardConfig) -> Result<(), SessionError> {
    let mut board = TierBoard::from_config(config.client()?, &config)?;

    println!("=== Pokémon Tier Board Headless Mode ===");
    println!(
        "Ladder: {} | Attempt budget: {} | On fetch error: {}",
        config.ladder.kind(),
        config.attempt_budget,
        config.on_fetch_error
    );
    println!("Output directory: {}", config.output_dir.display());
    println!();
    println!("Commands:");
    for line in HELP {
        println!("{line}");
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = line.strip_prefix('#') else {
            println!("[ERROR] Commands start with '#'. Type #help for help.");
            continue;
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        match parts.first().copied() {
            Some("quit") | Some("exit") => {
                println!("Goodbye!");
                break;
            }
            Some("generate") => {
                let result = board
                    .generate_with_progress(|progress| {
                        if progress.attempts % 25 == 0 {
                            print!(
                                "\r[GENERATING] {}/{} attempts",
                                progress.attempts, progress.budget
                            );
                            io::stdout().flush().ok();
                        }
                    })
                    .await;
                print!("\r                                        \r");

                match result {
                    Ok(report) => println!("[GENERATED] {}", summarize(report)),
                    Err(e) => println!("[ERROR] {e}"),
                }
                if !board.view().is_blank() {
                    println!("[BOARD]");
                    print!("{}", format_board(board.view()));
                }
            }
            Some("export") => match board.export().await {
                Ok(outcome) => {
                    for attempt in &outcome.fallthrough {
                        match attempt {
                            SinkAttempt::Skipped(kind) => {
                                println!("[SKIPPED] {kind} not available")
                            }
                            SinkAttempt::Failed { kind, reason } => {
                                println!("[FAILED] {kind}: {reason}")
                            }
                        }
                    }
                    println!("[EXPORTED] Board {}", outcome.delivery);
                    if let Some(confirmation) = outcome.confirmation(std::time::Instant::now()) {
                        println!("[CONFIRM] {}", confirmation.message);
                    }
                }
                Err(e) => println!("[ERROR] Export failed: {e}"),
            },
            Some("show") => {
                let json = parts.get(1) == Some(&"--json");
                match board.report() {
                    None => println!("[EMPTY] No board yet - use #generate"),
                    Some(report) if json => match serde_json::to_string_pretty(report) {
                        Ok(text) => println!("{text}"),
                        Err(e) => println!("[ERROR] Could not serialize board: {e}"),
                    },
                    Some(_) => {
                        println!("[BOARD]");
                        print!("{}", format_board(board.view()));
                    }
                }
            }
            Some("status") => print!("{}", format_status(&board, &config)),
            Some("help") => {
                println!("[HELP]");
                for line in HELP {
                    println!("{line}");
                }
            }
            _ => {
                println!("[ERROR] Unknown command. Type #help for help.");
            }
        }
        stdout.flush().ok();
    }

    Ok(())
}

/// Plain-text board, one tier per line, strongest first.
pub fn format_board(view: &BoardView) -> String {
    let mut out = String::new();
    for row in &view.rows {
        let cards = if row.cards.is_empty() {
            "-".to_string()
        } else {
            row.cards
                .iter()
                .map(|card| format!("{} ({})", card.name, card.score))
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push_str(&format!("  {} | {}\n", row.label, cards));
    }
    out
}

fn format_status<S: EntitySource>(board: &TierBoard<S>, config: &BoardConfig) -> String {
    let mut out = String::from("[STATUS]\n");
    match board.state() {
        BoardState::Empty => out.push_str("  State: empty\n"),
        BoardState::Loading { attempts, budget } => {
            out.push_str(&format!("  State: generating ({attempts}/{budget})\n"))
        }
        BoardState::Ready(report) => {
            out.push_str(&format!(
                "  State: ready{}\n",
                if report.is_complete() { "" } else { " (partial)" }
            ));
            out.push_str(&format!("  Placed: {}\n", report.accepted()));
            out.push_str(&format!("  Attempts: {}\n", report.attempts));
            out.push_str(&format!("  Duplicates: {}\n", report.duplicates));
            out.push_str(&format!("  Tier full: {}\n", report.tier_full));
            out.push_str(&format!(
                "  Failed fetches: {} network, {} malformed\n",
                report.network_failures, report.malformed_records
            ));
        }
    }
    out.push_str(&format!("  Ladder: {}\n", config.ladder.kind()));
    out.push_str(&format!("  Attempt budget: {}\n", config.attempt_budget));
    if let Some(seed) = config.seed {
        out.push_str(&format!("  Seed: {seed}\n"));
    }
    out
}

/// Apply command line flags on top of `config`. `args[0]` is the program
/// name.
pub fn parse_config_from_args(
    args: &[String],
    mut config: BoardConfig,
) -> Result<BoardConfig, ConfigError> {
    let mut i = 1;
    while i < args.len() {
        let next = args.get(i + 1).map(String::as_str);

        match args[i].as_str() {
            "--ladder" => {
                config.ladder = parse_ladder(required(next, "--ladder")?).map_err(|message| {
                    ConfigError::Invalid {
                        var: "--ladder",
                        message,
                    }
                })?;
                i += 1;
            }
            "--attempts" => {
                config.attempt_budget = parse_attempts(required(next, "--attempts")?).map_err(
                    |message| ConfigError::Invalid {
                        var: "--attempts",
                        message,
                    },
                )?;
                i += 1;
            }
            "--seed" => {
                let raw = required(next, "--seed")?;
                config.seed = Some(raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "--seed",
                    message: format!("'{raw}' is not an unsigned integer"),
                })?);
                i += 1;
            }
            "--output" => {
                config.output_dir = PathBuf::from(required(next, "--output")?);
                i += 1;
            }
            "--on-fetch-error" => {
                config.on_fetch_error = required(next, "--on-fetch-error")?
                    .parse()
                    .map_err(|message| ConfigError::Invalid {
                        var: "--on-fetch-error",
                        message,
                    })?;
                i += 1;
            }
            "--headless" | "--help" | "-h" => {}
            other => {
                return Err(ConfigError::Invalid {
                    var: "arguments",
                    message: format!("unrecognized argument '{other}'"),
                })
            }
        }
        i += 1;
    }

    Ok(config)
}

fn required<'a>(value: Option<&'a str>, flag: &'static str) -> Result<&'a str, ConfigError> {
    value.ok_or(ConfigError::Invalid {
        var: flag,
        message: "missing value".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierboard_core::{Board, BoardEntry, FetchFailurePolicy, Tier, TierLadder};

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("tierboard")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_flags_override_config() {
        let config = parse_config_from_args(
            &args(&[
                "--headless",
                "--ladder",
                "rebalanced",
                "--attempts",
                "120",
                "--seed",
                "77",
                "--output",
                "/tmp/boards",
                "--on-fetch-error",
                "abort",
            ]),
            BoardConfig::default(),
        )
        .unwrap();

        assert_eq!(config.ladder, TierLadder::REBALANCED);
        assert_eq!(config.attempt_budget, 120);
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/boards"));
        assert_eq!(config.on_fetch_error, FetchFailurePolicy::Abort);
    }

    #[test]
    fn test_no_flags_keeps_environment_config() {
        let base = BoardConfig::default().with_seed(5).with_attempt_budget(90);
        let config = parse_config_from_args(&args(&["--headless"]), base.clone()).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        for bad in [
            vec!["--ladder", "steep"],
            vec!["--attempts", "many"],
            vec!["--attempts", "0"],
            vec!["--seed", "abc"],
            vec!["--ladder"],
            vec!["--atempts", "5"],
            vec!["--headless", "rebalanced"],
        ] {
            let result = parse_config_from_args(&args(&bad), BoardConfig::default());
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_misspelled_flag_names_the_argument() {
        let result = parse_config_from_args(&args(&["--atempts", "5"]), BoardConfig::default());
        match result {
            Err(ConfigError::Invalid { var, message }) => {
                assert_eq!(var, "arguments");
                assert!(message.contains("--atempts"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_format_board_lists_every_tier() {
        let mut board = Board::default();
        for (id, name, tier, score) in [
            (150, "mewtwo", Tier::Five, 680),
            (149, "dragonite", Tier::Five, 600),
            (19, "rattata", Tier::One, 253),
        ] {
            board.place(
                tier,
                BoardEntry {
                    id,
                    name: name.to_string(),
                    sprite: None,
                    score,
                },
            );
        }

        let text = format_board(&BoardView::render(&board));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "  $5 | mewtwo (680), dragonite (600)",
                "  $4 | -",
                "  $3 | -",
                "  $2 | -",
                "  $1 | rattata (253)",
            ]
        );
    }
}
