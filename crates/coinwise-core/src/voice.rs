//! # Voice Phrases
//!
//! Feedback events and the templates that turn them into spoken text.
//!
//! ## Template Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session decides WHAT to say          Templates decide HOW to say it   │
//! │                                                                         │
//! │  Feedback::Shortage { diff: 5 } ──► "還差 {diff} 元" ──► "還差 5 元"      │
//! │                                                                         │
//! │  Placeholders are plain {name} tokens, replaced everywhere they occur. │
//! │  Each phrase accepts only its own placeholders; anything else is      │
//! │  rejected when the config is validated.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Feedback
// =============================================================================

/// Something the drill wants to tell the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// New round: "I want to buy {name}, {price}".
    Welcome { name: String, price: Money },
    /// Tray total after a piece lands.
    RunningTotal { total: Money },
    /// Exact payment.
    Correct,
    /// Not enough paid.
    Shortage { diff: Money },
    /// Overpaid with change practice off.
    Over,
    /// Change practice prompt. Also repeated when too much was taken.
    ChangeModeStart { price: Money },
    /// Change practice, still short of the price.
    ChangeProgress { paid: Money, remaining: Money },
    /// Change practice finished; what is left is the change.
    ChangeComplete { change: Money },
    /// The solution is being demonstrated.
    Reveal,
}

// =============================================================================
// Templates
// =============================================================================

/// Phrase templates, one per feedback kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct VoiceTemplates {
    pub correct: String,
    pub welcome: String,
    pub total: String,
    pub shortage: String,
    pub over: String,
    pub change_mode_start: String,
    pub change_progress: String,
    pub change_complete: String,
    pub reveal: String,
}

impl Default for VoiceTemplates {
    fn default() -> Self {
        VoiceTemplates {
            correct: "答對了！好棒！".to_string(),
            welcome: "我要買{name}，{price}元".to_string(),
            total: "{total}元".to_string(),
            shortage: "還差 {diff} 元".to_string(),
            over: "付太多了，試試看能不能付剛好？".to_string(),
            change_mode_start: "付太多了，我們來練習找錢。請拿走要付的{price}元。".to_string(),
            change_progress: "目前拿了{paid}元，還要再拿{remaining}元。".to_string(),
            change_complete: "付好了！剩下{change}元是找的錢。".to_string(),
            reveal: "像這樣付就對了".to_string(),
        }
    }
}

impl VoiceTemplates {
    /// Renders `feedback` into the text handed to the notifier.
    pub fn render(&self, feedback: &Feedback) -> String {
        match feedback {
            Feedback::Welcome { name, price } => fill(
                &self.welcome,
                &[("name", name.clone()), ("price", price.to_string())],
            ),
            Feedback::RunningTotal { total } => fill(&self.total, &[("total", total.to_string())]),
            Feedback::Correct => self.correct.clone(),
            Feedback::Shortage { diff } => fill(&self.shortage, &[("diff", diff.to_string())]),
            Feedback::Over => self.over.clone(),
            Feedback::ChangeModeStart { price } => {
                fill(&self.change_mode_start, &[("price", price.to_string())])
            }
            Feedback::ChangeProgress { paid, remaining } => fill(
                &self.change_progress,
                &[("paid", paid.to_string()), ("remaining", remaining.to_string())],
            ),
            Feedback::ChangeComplete { change } => {
                fill(&self.change_complete, &[("change", change.to_string())])
            }
            Feedback::Reveal => self.reveal.clone(),
        }
    }

    /// Checks each phrase uses only the placeholders it is rendered with.
    pub fn validate(&self) -> ValidationResult<()> {
        check_phrase("voice.correct", &self.correct, &[])?;
        check_phrase("voice.welcome", &self.welcome, &["name", "price"])?;
        check_phrase("voice.total", &self.total, &["total"])?;
        check_phrase("voice.shortage", &self.shortage, &["diff"])?;
        check_phrase("voice.over", &self.over, &[])?;
        check_phrase("voice.change_mode_start", &self.change_mode_start, &["price"])?;
        check_phrase(
            "voice.change_progress",
            &self.change_progress,
            &["paid", "remaining"],
        )?;
        check_phrase("voice.change_complete", &self.change_complete, &["change"])?;
        check_phrase("voice.reveal", &self.reveal, &[])
    }
}

fn check_phrase(field: &str, template: &str, allowed: &[&str]) -> ValidationResult<()> {
    if template.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if let Some(unknown) = placeholders(template).find(|p| !allowed.contains(p)) {
        return Err(ValidationError::UnknownPlaceholder {
            field: field.to_string(),
            placeholder: unknown.to_string(),
        });
    }
    Ok(())
}

/// Replaces every `{key}` with its value.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// Names inside `{...}` pairs, in order of appearance.
fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    template.split('{').skip(1).filter_map(|rest| {
        let end = rest.find('}')?;
        Some(&rest[..end])
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
