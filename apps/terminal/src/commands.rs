//! # Terminal Commands
//!
//! One input line becomes one [`Command`], and each command maps onto one
//! session operation.
//!
//! ```text
//! "add 50" ──parse──► Command::Add(50) ──execute──► session.add_denomination(50)
//!                                                        │
//!                                                        ▼
//!                                             Done / Rejected / CliError
//! ```
//!
//! `pay` and `reveal` are decided on the spot: the tray total is read and
//! the tray taken before the next line is read. Only the cashier animation
//! runs on its own task, so the prompt stays live and anything typed
//! meanwhile is rejected by the session.

use coinwise_core::payment::{ChangeStatus, PaymentOutcome};
use coinwise_core::Money;
use coinwise_shop::{Attempt, PendingReplay, ShopSession};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult, ErrorCode};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Ranges,
    Wallet,
    /// Start a round, optionally in a named range.
    Start(Option<String>),
    Add(i64),
    /// Remove by zero-based tray position.
    Remove(usize),
    Reset,
    Pay,
    Reveal,
    Setup,
    ChangeMode(bool),
    Voice(bool),
    Status,
    Quit,
}

pub const HELP: &str = "\
commands:
  ranges            list price ranges
  wallet            list coins and notes
  start [range]     start a round (default: configured range)
  add <value>       put a coin or note on the tray
  remove <pos>      take the piece at position <pos> off the tray
  reset             clear the tray
  pay               pay with the tray
  reveal            show one way to pay the price
  setup             back to setup
  change on|off     change practice (setup only)
  voice on|off      spoken feedback
  status            session as JSON
  quit";

/// Parses one input line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> CliResult<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(CliError::unknown_command(format!(
            "Too many arguments: {}",
            line.trim()
        )));
    }

    let command = match (head.to_ascii_lowercase().as_str(), arg) {
        ("help" | "?", None) => Command::Help,
        ("ranges", None) => Command::Ranges,
        ("wallet", None) => Command::Wallet,
        ("start", range) => Command::Start(range.map(str::to_string)),
        ("add", Some(value)) => Command::Add(parse_number(value)?),
        ("remove" | "rm", Some(pos)) => Command::Remove(parse_number(pos)?),
        ("reset", None) => Command::Reset,
        ("pay", None) => Command::Pay,
        ("reveal", None) => Command::Reveal,
        ("setup", None) => Command::Setup,
        ("change", Some(flag)) => Command::ChangeMode(parse_flag(flag)?),
        ("voice", Some(flag)) => Command::Voice(parse_flag(flag)?),
        ("status", None) => Command::Status,
        ("quit" | "exit" | "q", None) => Command::Quit,
        _ => {
            return Err(CliError::unknown_command(format!(
                "Unknown command: {} (type `help`)",
                line.trim()
            )))
        }
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(text: &str) -> CliResult<T> {
    text.parse()
        .map_err(|_| CliError::unknown_command(format!("Not a number: {}", text)))
}

fn parse_flag(text: &str) -> CliResult<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(CliError::unknown_command(format!(
            "Expected on or off, got {}",
            text
        ))),
    }
}

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs one command against the session and prints the result.
pub fn execute(session: &ShopSession, command: Command, default_range: &str) -> CliResult<Flow> {
    debug!(?command, "Executing command");

    match command {
        Command::Help => println!("{}", HELP),
        Command::Ranges => {
            for range in session.ranges() {
                println!("  {:<10} {}", range.id, range.label);
            }
        }
        Command::Wallet => {
            let pieces: Vec<String> = session
                .denominations()
                .iter()
                .map(|d| d.display_label())
                .collect();
            println!("  {}", pieces.join("  "));
        }
        Command::Start(range) => {
            let range = range.as_deref().unwrap_or(default_range);
            match session.start_round(range)? {
                Attempt::Done(round) => {
                    println!("  {} costs {}", round.product.name, round.price())
                }
                Attempt::Rejected(reason) => rejected(reason),
            }
        }
        Command::Add(value) => {
            if let Attempt::Rejected(reason) = session.add_denomination(Money::from_units(value))? {
                rejected(reason);
            }
        }
        Command::Remove(index) => match session.remove_denomination(index) {
            Attempt::Done(removal) => match removal.change {
                Some(ChangeStatus::Complete { change }) => {
                    println!("  change taken, {} left on the tray", change)
                }
                Some(ChangeStatus::TooMuchTaken { paid }) => {
                    println!("  took {}, that is more than the price, start over", paid)
                }
                Some(ChangeStatus::StillTaking { paid, remaining }) => {
                    println!("  taken {}, {} to go", paid, remaining)
                }
                None => {}
            },
            Attempt::Rejected(reason) => rejected(reason),
        },
        Command::Reset => {
            if let Attempt::Rejected(reason) = session.reset_tray() {
                rejected(reason);
            }
        }
        Command::Pay => pay(session)?,
        Command::Reveal => reveal(session)?,
        Command::Setup => {
            if let Attempt::Rejected(reason) = session.return_to_setup() {
                rejected(reason);
            }
        }
        Command::ChangeMode(enabled) => match session.set_change_mode(enabled) {
            Attempt::Done(()) => println!("  change practice {}", on_off(enabled)),
            Attempt::Rejected(reason) => rejected(reason),
        },
        Command::Voice(enabled) => {
            session.set_voice_feedback(enabled);
            println!("  voice {}", on_off(enabled));
        }
        Command::Status => {
            let json = serde_json::to_string_pretty(&session.snapshot())
                .map_err(|e| CliError::new(ErrorCode::Io, e.to_string()))?;
            println!("{}", json);
        }
        Command::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

fn pay(session: &ShopSession) -> CliResult<()> {
    let payment = match session.submit_payment()? {
        Attempt::Done(payment) => payment,
        Attempt::Rejected(reason) => {
            rejected(reason);
            return Ok(());
        }
    };

    match payment.outcome {
        PaymentOutcome::Exact => println!("  paid exactly"),
        PaymentOutcome::Short { diff } => println!("  {} short", diff),
        PaymentOutcome::OverRejected { excess } => {
            println!("  {} too much, take some back", excess)
        }
        PaymentOutcome::OverAccepted { snapshot } => println!(
            "  paid {}, take the price off the tray once the cashier is done",
            snapshot.initial_payment_total
        ),
    }
    if let Some(replay) = payment.replay {
        spawn_replay(replay);
    }
    Ok(())
}

fn reveal(session: &ShopSession) -> CliResult<()> {
    match session.submit_reveal()? {
        Attempt::Done(replay) => {
            let labels: Vec<String> = replay.pieces().iter().map(|d| d.display_label()).collect();
            println!("  {}", labels.join(" + "));
            spawn_replay(replay);
        }
        Attempt::Rejected(reason) => rejected(reason),
    }
    Ok(())
}

/// Runs the timed part on its own task so the prompt stays live.
fn spawn_replay(replay: PendingReplay) {
    tokio::spawn(async move {
        let total = replay.run().await;
        debug!(total = %total, "Replay finished");
    });
}

fn rejected(reason: coinwise_shop::Rejection) {
    println!("  (ignored: {})", reason);
}

/// Prints a command error.
pub fn report(err: CliError) {
    warn!(code = ?err.code, "Command failed");
    eprintln!("  {}", err);
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("add 50").unwrap(), Some(Command::Add(50)));
        assert_eq!(parse("  REMOVE 3 ").unwrap(), Some(Command::Remove(3)));
        assert_eq!(parse("start").unwrap(), Some(Command::Start(None)));
        assert_eq!(
            parse("start 41-50").unwrap(),
            Some(Command::Start(Some("41-50".into())))
        );
        assert_eq!(parse("change on").unwrap(), Some(Command::ChangeMode(true)));
        assert_eq!(parse("voice off").unwrap(), Some(Command::Voice(false)));
        assert_eq!(parse("q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_blank_line_is_nothing() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_bad_input() {
        for line in ["add", "add fifty", "remove -1", "change maybe", "pay now", "dance", "add 5 5"] {
            let err = parse(line).unwrap_err();
            assert_eq!(err.code, ErrorCode::UnknownCommand, "{}", line);
        }
    }

    #[tokio::test]
    async fn test_execute_against_session() {
        let config = coinwise_shop::ShopConfig::default();
        let session = ShopSession::builder(config).with_seed(1).build().unwrap();

        assert_eq!(execute(&session, Command::Ranges, "all").unwrap(), Flow::Continue);
        execute(&session, Command::Start(None), "41-50").unwrap();
        assert!(session.current_round().is_some());

        execute(&session, Command::Add(50), "41-50").unwrap();
        assert_eq!(session.snapshot().tray_total, Money::from_units(50));

        let err = execute(&session, Command::Add(7), "41-50").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownDenomination);

        assert_eq!(execute(&session, Command::Quit, "41-50").unwrap(), Flow::Quit);
    }

    #[tokio::test]
    async fn test_pay_judges_the_submitted_tray() {
        let session = ShopSession::builder(coinwise_shop::ShopConfig::default())
            .with_seed(1)
            .build()
            .unwrap();
        execute(&session, Command::Start(None), "41-50").unwrap();
        for value in [10, 10, 10, 10, 5] {
            execute(&session, Command::Add(value), "41-50").unwrap();
        }

        execute(&session, Command::Pay, "41-50").unwrap();
        execute(&session, Command::Add(1), "41-50").unwrap();

        let snapshot = session.snapshot();
        assert!(snapshot.completing);
        assert_eq!(snapshot.tray_total, Money::from_units(45));
        assert_eq!(snapshot.feedback.as_deref(), Some("答對了！好棒！"));
    }

    #[tokio::test]
    async fn test_pay_takes_the_tray_before_returning() {
        let mut config = coinwise_shop::ShopConfig::default();
        config.game.change_mode = true;
        let session = ShopSession::builder(config).with_seed(1).build().unwrap();
        execute(&session, Command::Start(None), "41-50").unwrap();
        execute(&session, Command::Add(50), "41-50").unwrap();

        execute(&session, Command::Pay, "41-50").unwrap();
        assert!(session.is_animating());

        execute(&session, Command::Add(1), "41-50").unwrap();
        assert_eq!(session.snapshot().tray_total, Money::from_units(50));
    }
}
