//! # Coinwise Terminal
//!
//! Line-based front end for the shopping drill.
//!
//! ## Module Organization
//! - [`commands`] - Input parsing and command execution
//! - [`error`] - What the player sees when a command fails

pub mod commands;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;

use coinwise_core::voice::Feedback;
use coinwise_core::{Denomination, Money, Stage};
use coinwise_shop::{LatestUtterance, ShopConfig, ShopEventEmitter, ShopSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::commands::Flow;
use crate::error::CliResult;

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - ERROR: Failures that end the session
/// - WARN: Failed commands, bad config values
/// - INFO: Stage changes, rounds
/// - DEBUG: Commands, tray redraws
/// - TRACE: Sequencer steps
///
/// Logs go to stderr so they do not interleave with the prompt output.
/// Set `RUST_LOG` to override (e.g. `RUST_LOG=coinwise_shop=trace`).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,coinwise=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Console Emitter
// =============================================================================

/// Prints session events as they happen.
struct ConsoleEmitter;

impl ShopEventEmitter for ConsoleEmitter {
    fn emit_stage(&self, stage: Stage) {
        println!("== {} ==", stage);
    }

    fn emit_tray(&self, items: &[Denomination], total: Money) {
        debug!(pieces = items.len(), total = %total, "Tray changed");
        let labels: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}:{}", i, d.display_label()))
            .collect();
        println!("  tray [{}] = {}", labels.join(" "), total);
    }

    fn emit_feedback(&self, feedback: &Feedback, text: &str) {
        debug!(?feedback, "Feedback");
        if !text.is_empty() {
            println!("  > {}", text);
        }
    }
}

// =============================================================================
// Application Entry Point
// =============================================================================

/// Runs the terminal front end until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize tracing                                                 │
/// │  2. Load ShopConfig (argv[1], else COINWISE_CONFIG, else shop.toml)    │
/// │  3. Spawn the speaker task (latest utterance wins)                     │
/// │  4. Build the ShopSession with the console emitter                     │
/// │  5. Read stdin lines until quit                                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> CliResult<()> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("COINWISE_CONFIG").ok())
        .map(PathBuf::from);

    let config = ShopConfig::load(config_path).map_err(|e| {
        error!("Failed to load config: {}", e);
        e
    })?;
    let default_range = config.game.range.clone();

    let speaker = Arc::new(LatestUtterance::new());
    let mut utterances = speaker.subscribe();
    tokio::spawn(async move {
        while let Some(text) = utterances.next().await {
            println!("  ♪ {}", text);
        }
    });

    let session = ShopSession::builder(config)
        .with_notifier(speaker)
        .with_emitter(Arc::new(ConsoleEmitter))
        .build()?;

    info!(range = %default_range, "Coinwise terminal ready");
    println!("{}", commands::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                commands::report(e);
                continue;
            }
        };

        match commands::execute(&session, command, &default_range) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => commands::report(e),
        }
    }

    info!("Coinwise terminal shutting down");
    Ok(())
}
