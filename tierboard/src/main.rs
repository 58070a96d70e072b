//! Pokémon tier board TUI application.
//!
//! Draws random Pokémon into five capped tiers by base stat total and
//! exports the board as a PNG.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p tierboard -- --headless --ladder rebalanced --seed 7
//! ```

mod app;
mod events;
mod headless;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tierboard_core::BoardConfig;

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = match BoardConfig::from_env()
        .and_then(|config| headless::parse_config_from_args(&args, config))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    // Check for --headless mode
    if args.iter().any(|a| a == "--headless") {
        init_logging(&config, true);
        return headless::run_headless(config).await.map_err(|e| e.into());
    }

    init_logging(&config, false);

    let app = match build_app(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn build_app(config: &BoardConfig) -> Result<App, tierboard_core::ConfigError> {
    let client = config.client()?;
    let sampler = config.sampler()?;
    log::info!(
        "starting with {} ladder, budget {}, api {}",
        config.ladder.kind(),
        config.attempt_budget,
        client.base_url()
    );

    Ok(App::new(Arc::new(client), sampler, config.exporter(), config.rng())
        .with_output_dir(&config.output_dir))
}

/// Logs go to stderr in headless mode and to a file next to exports in the
/// TUI, where stderr would tear the alternate screen.
fn init_logging(config: &BoardConfig, headless: bool) {
    let default = if headless { "warn" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    builder.format_timestamp_secs();

    if !headless {
        let log_path = config.log_path();
        let file = fs::create_dir_all(&config.output_dir).and_then(|_| File::create(&log_path));
        match file {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Could not open {}: {e}; logging disabled", log_path.display());
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    let _ = builder.try_init();
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        // Pick up progress and results from background tasks
        app.drain_worker_events();
        app.tick(Instant::now());

        // Render
        terminal.draw(|f| render(f, &app))?;

        // Poll for events with timeout so progress keeps moving
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("Pokémon Tier Board - random boards ranked by base stat total");
    println!();
    println!("USAGE:");
    println!("  tierboard [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help                 Show this help message");
    println!("  --headless                 Run in headless mode (text-only, no TUI)");
    println!("  --ladder <NAME>            Tier ladder: classic (default) or rebalanced");
    println!("  --attempts <N>             Maximum draws per board (default: 500)");
    println!("  --seed <N>                 Seed the random draws for a repeatable board");
    println!("  --output <DIR>             Where saved boards and the log go (default: .)");
    println!("  --on-fetch-error <POLICY>  skip (default) or abort");
    println!();
    println!("LADDERS:");
    println!("  classic      $5 >= 600, $4 >= 500, $3 >= 400, $2 >= 300");
    println!("  rebalanced   $5 >= 550, $4 >= 450, $3 >= 350, $2 >= 300");
    println!();
    println!("ENVIRONMENT:");
    println!("  POKEAPI_BASE_URL           API root (default: https://pokeapi.co/api/v2)");
    println!("  TIERBOARD_LADDER           Same as --ladder");
    println!("  TIERBOARD_ATTEMPTS         Same as --attempts");
    println!("  TIERBOARD_TIMEOUT_SECS     Per-request timeout (default: 10)");
    println!("  TIERBOARD_ON_FETCH_ERROR   Same as --on-fetch-error");
    println!("  TIERBOARD_OUTPUT_DIR       Same as --output");
    println!("  TIERBOARD_SEED             Same as --seed");
    println!("  RUST_LOG                   Log filter");
    println!();
    println!("EXAMPLES:");
    println!("  tierboard                              # Interactive TUI mode");
    println!("  tierboard --headless                   # Headless with defaults");
    println!("  tierboard --headless --ladder rebalanced --seed 7");
}
