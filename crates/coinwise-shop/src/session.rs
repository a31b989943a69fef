//! # Shop Session
//!
//! The game state machine. Owns the tray, the current round and the
//! change-practice snapshot, and drives the sequencer.
//!
//! ## Stage Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌───────┐  start_round   ┌────────┐  pay: over + change mode         │
//! │   │ SETUP │───────────────►│ BUYING │──────────────┐                   │
//! │   └───────┘                └────────┘              │ replay breakdown  │
//! │       ▲                     ▲   │  ▲               ▼                   │
//! │       │                     │   │  │        ┌───────────────┐          │
//! │       │ return_to_setup     │   │  │        │ CHANGE_ACTION │          │
//! │       └─────────────────────┼───┘  │        └───────┬───────┘          │
//! │                             │      │ pay: exact     │ paid so far      │
//! │                             │      │ (after delay)  │ == price         │
//! │                             │      │                │ (after delay)    │
//! │                             └──────┴── next round ◄─┘                  │
//! │                                                                         │
//! │   pay: short / over without change mode ──► stays BUYING               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rejections
//! Player actions that make no sense right now (tapping the tray during an
//! animation, paying twice while the success screen is up, removing from
//! an empty slot) return [`Attempt::Rejected`] and change nothing. They are
//! not errors.
//!
//! ## Runtime
//! Operations that start a round or finish one spawn timer tasks, so the
//! session must be used from inside a tokio runtime. Event emitters and
//! notifiers are called synchronously and must not call back into the
//! session.
//!
//! `pay` and `reveal_solution` come in two halves. `submit_payment` and
//! `submit_reveal` decide synchronously and take the tray; the returned
//! [`PendingReplay`] does the timed part, so a front end can hand it to a
//! task and keep reading input.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coinwise_core::catalog::{CanonicalSubset, DenominationCatalog};
use coinwise_core::decompose::{decompose, solution};
use coinwise_core::ledger::TenderLedger;
use coinwise_core::payment::{
    evaluate_change, evaluate_payment, ChangeStatus, PaymentOutcome, TransactionSnapshot,
};
use coinwise_core::round::next_round;
use coinwise_core::voice::{Feedback, VoiceTemplates};
use coinwise_core::{CoreError, Denomination, Money, PriceRange, Round, Stage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Catalogs, ShopConfig, TimingSettings};
use crate::error::{ShopError, ShopResult};
use crate::events::{NoOpEmitter, ShopEventEmitter};
use crate::notify::{NoOpNotifier, Notifier};
use crate::sequencer::{AnimationSequencer, ReplayStep};
use crate::tray::{ExclusiveTray, Tray};

// =============================================================================
// Attempt Results
// =============================================================================

/// Outcome of a player action that may be refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The action took effect.
    Done(T),
    /// The action was ignored; nothing changed.
    Rejected(Rejection),
}

impl<T> Attempt<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Attempt::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Attempt::Done(value) => Some(value),
            Attempt::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Attempt::Done(_) => None,
            Attempt::Rejected(reason) => Some(*reason),
        }
    }
}

/// Why an action was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The sequencer holds the tray.
    Animating,
    /// The action is not available in this stage.
    WrongStage { stage: Stage },
    /// The round is finished and the next one has not started yet.
    RoundCompleting,
    /// No piece at that tray position.
    NoSuchItem { index: usize },
    /// There is no round to act on.
    NoActiveRound,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Animating => write!(f, "tray is busy"),
            Rejection::WrongStage { stage } => write!(f, "not available in {}", stage),
            Rejection::RoundCompleting => write!(f, "round is completing"),
            Rejection::NoSuchItem { index } => write!(f, "no piece at position {}", index),
            Rejection::NoActiveRound => write!(f, "no active round"),
        }
    }
}

/// Result of taking a piece off the tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: Denomination,
    /// Tray total after the removal.
    pub total: Money,
    /// Change-practice progress, when in CHANGE_ACTION.
    pub change: Option<ChangeStatus>,
}

/// Result of submitting the tray as payment.
#[derive(Debug)]
pub struct Payment {
    pub outcome: PaymentOutcome,
    /// The change-practice layout, present only for `OverAccepted`.
    pub replay: Option<PendingReplay>,
}

/// A cashier replay that already holds the tray.
///
/// The tray stays locked until [`PendingReplay::run`] finishes. Dropping it
/// unrun releases the lock and leaves the tray untouched.
#[must_use = "the tray stays locked until the replay runs"]
pub struct PendingReplay {
    session: ShopSession,
    exclusive: ExclusiveTray,
    pieces: Vec<Denomination>,
    /// Round that enters CHANGE_ACTION once the pieces are down.
    change_round: Option<String>,
}

impl PendingReplay {
    /// Pieces the replay will lay out, in order.
    pub fn pieces(&self) -> &[Denomination] {
        &self.pieces
    }

    /// Lays the pieces out on the tray and returns the final total.
    pub async fn run(self) -> Money {
        let PendingReplay {
            session,
            exclusive,
            pieces,
            change_round,
        } = self;

        let total = session
            .inner
            .sequencer
            .replay(exclusive, pieces, |step| session.on_replay_step(step))
            .await;

        if let Some(round_id) = change_round {
            let mut state = session.state();
            if state.is_current(&round_id) && state.stage == Stage::Buying {
                session.set_stage(&mut state, Stage::ChangeAction);
            }
        }
        total
    }
}

impl std::fmt::Debug for PendingReplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReplay")
            .field("pieces", &self.pieces.len())
            .field("change_round", &self.change_round)
            .finish()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Serialisable view of the session for redraws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub stage: Stage,
    pub round: Option<Round>,
    pub tray: Vec<Denomination>,
    pub tray_total: Money,
    /// Amount taken so far, only during change practice.
    pub paid_so_far: Option<Money>,
    /// Last feedback text.
    pub feedback: Option<String>,
    pub animating: bool,
    pub completing: bool,
    pub change_mode: bool,
    pub voice_feedback: bool,
}

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug, Default)]
struct SessionState {
    stage: Stage,
    round: Option<Round>,
    /// Range the current round came from; the next round reuses it.
    range: Option<PriceRange>,
    snapshot: Option<TransactionSnapshot>,
    change_mode: bool,
    voice_feedback: bool,
    completing: bool,
    feedback: Option<String>,
}

impl SessionState {
    fn is_current(&self, round_id: &str) -> bool {
        self.round.as_ref().is_some_and(|r| r.id == round_id)
    }
}

struct Inner {
    catalogs: Catalogs,
    voice: VoiceTemplates,
    timing: TimingSettings,
    sequencer: AnimationSequencer,
    tray: Tray,
    state: Mutex<SessionState>,
    rng: Mutex<StdRng>,
    notifier: Arc<dyn Notifier>,
    emitter: Arc<dyn ShopEventEmitter>,
}

/// Cloneable handle to one shopping session.
#[derive(Clone)]
pub struct ShopSession {
    inner: Arc<Inner>,
}

impl ShopSession {
    /// Creates a session with no speech and no event output.
    pub fn new(config: ShopConfig) -> ShopResult<Self> {
        ShopSessionBuilder::new(config).build()
    }

    pub fn builder(config: ShopConfig) -> ShopSessionBuilder {
        ShopSessionBuilder::new(config)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn stage(&self) -> Stage {
        self.state().stage
    }

    pub fn current_round(&self) -> Option<Round> {
        self.state().round.clone()
    }

    /// Returns true while the sequencer holds the tray.
    pub fn is_animating(&self) -> bool {
        self.inner.tray.is_locked()
    }

    pub fn denominations(&self) -> &DenominationCatalog {
        &self.inner.catalogs.denominations
    }

    pub fn canonical_subset(&self) -> &CanonicalSubset {
        &self.inner.catalogs.canonical
    }

    pub fn ranges(&self) -> &[PriceRange] {
        &self.inner.catalogs.ranges
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        let (tray, tray_total) = self.inner.tray.contents();
        let paid_so_far = match (state.stage, state.snapshot) {
            (Stage::ChangeAction, Some(snapshot)) => Some(snapshot.paid_so_far(tray_total)),
            _ => None,
        };

        SessionSnapshot {
            stage: state.stage,
            round: state.round.clone(),
            tray,
            tray_total,
            paid_so_far,
            feedback: state.feedback.clone(),
            animating: self.is_animating(),
            completing: state.completing,
            change_mode: state.change_mode,
            voice_feedback: state.voice_feedback,
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Starts the first round from the range with id `range_id`.
    ///
    /// ## Errors
    /// - `UnknownRange` if no configured range has that id
    /// - `NoProductsInRange` if the range holds no product; stage stays SETUP
    pub fn start_round(&self, range_id: &str) -> ShopResult<Attempt<Round>> {
        let range = self.inner.catalogs.range(range_id)?.clone();
        let mut state = self.state();

        if state.stage != Stage::Setup {
            return Ok(Attempt::Rejected(Rejection::WrongStage { stage: state.stage }));
        }

        let round = self.begin_round(&mut state, range)?;
        Ok(Attempt::Done(round))
    }

    /// Turns change practice on or off. Only in SETUP.
    pub fn set_change_mode(&self, enabled: bool) -> Attempt<()> {
        let mut state = self.state();
        if state.stage != Stage::Setup {
            return Attempt::Rejected(Rejection::WrongStage { stage: state.stage });
        }
        debug!(change_mode = enabled, "Change mode set");
        state.change_mode = enabled;
        Attempt::Done(())
    }

    /// Turns running-total speech on or off. Allowed at any time.
    pub fn set_voice_feedback(&self, enabled: bool) {
        debug!(voice_feedback = enabled, "Voice feedback set");
        self.state().voice_feedback = enabled;
    }

    /// Leaves the round and goes back to SETUP.
    ///
    /// A pending round completion is discarded.
    pub fn return_to_setup(&self) -> Attempt<()> {
        let mut state = self.state();
        if self.inner.tray.is_locked() {
            return Attempt::Rejected(Rejection::Animating);
        }
        if state.stage == Stage::Setup {
            return Attempt::Rejected(Rejection::WrongStage { stage: state.stage });
        }

        if self.inner.tray.try_with_tray_mut(TenderLedger::clear).is_none() {
            return Attempt::Rejected(Rejection::Animating);
        }

        state.round = None;
        state.snapshot = None;
        state.completing = false;
        state.feedback = None;
        self.set_stage(&mut state, Stage::Setup);
        self.emit_tray();
        Attempt::Done(())
    }

    // =========================================================================
    // Tray Operations
    // =========================================================================

    /// Puts a piece of the given value on the tray. BUYING only.
    ///
    /// ## Errors
    /// - `UnknownDenomination` if the value is not in the catalog
    /// - `TrayFull` once the tray holds the maximum number of pieces
    pub fn add_denomination(&self, value: Money) -> ShopResult<Attempt<Money>> {
        let denomination = self.inner.catalogs.denominations.require(value)?.clone();
        let mut state = self.state();

        if let Some(rejection) = self.mutation_blocked(&state) {
            return Ok(Attempt::Rejected(rejection));
        }
        if state.stage != Stage::Buying {
            return Ok(Attempt::Rejected(Rejection::WrongStage { stage: state.stage }));
        }

        let total = match self.inner.tray.try_with_tray_mut(|l| l.add(denomination)) {
            None => return Ok(Attempt::Rejected(Rejection::Animating)),
            Some(result) => result?,
        };

        debug!(value = %value, total = %total, "Piece added");
        self.emit_tray();
        if state.voice_feedback {
            self.say(&mut state, Feedback::RunningTotal { total });
        }
        Ok(Attempt::Done(total))
    }

    /// Takes the piece at `index` off the tray.
    ///
    /// In CHANGE_ACTION this also checks change-practice progress and
    /// completes the round once exactly the price has been taken.
    pub fn remove_denomination(&self, index: usize) -> Attempt<Removal> {
        let mut state = self.state();

        if let Some(rejection) = self.mutation_blocked(&state) {
            return Attempt::Rejected(rejection);
        }
        if state.stage == Stage::Setup {
            return Attempt::Rejected(Rejection::WrongStage { stage: state.stage });
        }

        let removed = self
            .inner
            .tray
            .try_with_tray_mut(|l| l.remove(index).map(|d| (d, l.total())));
        let (removed, total) = match removed {
            None => return Attempt::Rejected(Rejection::Animating),
            Some(None) => return Attempt::Rejected(Rejection::NoSuchItem { index }),
            Some(Some(pair)) => pair,
        };

        debug!(index, value = %removed.value, total = %total, "Piece removed");
        self.emit_tray();

        let change = match (state.stage, state.snapshot, state.round.clone()) {
            (Stage::ChangeAction, Some(snapshot), Some(round)) => {
                let status = evaluate_change(&snapshot, total, round.price());
                match status {
                    ChangeStatus::Complete { change } => {
                        info!(round_id = %round.id, change = %change, "Change practice complete");
                        self.say(&mut state, Feedback::ChangeComplete { change });
                        state.completing = true;
                        self.schedule_completion(round.id);
                    }
                    ChangeStatus::TooMuchTaken { .. } => {
                        self.say(
                            &mut state,
                            Feedback::ChangeModeStart {
                                price: round.price(),
                            },
                        );
                    }
                    ChangeStatus::StillTaking { paid, remaining } => {
                        self.say(&mut state, Feedback::ChangeProgress { paid, remaining });
                    }
                }
                Some(status)
            }
            _ => None,
        };

        Attempt::Done(Removal {
            removed,
            total,
            change,
        })
    }

    /// Empties the tray. BUYING only.
    pub fn reset_tray(&self) -> Attempt<()> {
        let state = self.state();

        if let Some(rejection) = self.mutation_blocked(&state) {
            return Attempt::Rejected(rejection);
        }
        if state.stage != Stage::Buying {
            return Attempt::Rejected(Rejection::WrongStage { stage: state.stage });
        }
        if self.inner.tray.try_with_tray_mut(TenderLedger::clear).is_none() {
            return Attempt::Rejected(Rejection::Animating);
        }

        debug!("Tray reset");
        self.emit_tray();
        Attempt::Done(())
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Evaluates the tray against the price without waiting for any replay.
    ///
    /// The tray total is read and, for an accepted overpayment, the tray
    /// lock is taken before this returns. Input arriving afterwards can no
    /// longer change what was paid.
    ///
    /// ## Outcomes
    /// - `Exact`: success feedback, next round after the completion delay
    /// - `Short` / `OverRejected`: feedback only
    /// - `OverAccepted`: carries a [`PendingReplay`] of the breakdown. Running
    ///   it fills the tray and moves the stage to CHANGE_ACTION.
    ///
    /// ## Errors
    /// `DecompositionIncomplete` when the breakdown cannot be built. The
    /// tray and stage are left as they were.
    pub fn submit_payment(&self) -> ShopResult<Attempt<Payment>> {
        let mut state = self.state();
        let round = match self.ready_to_pay(&state) {
            Ok(round) => round,
            Err(rejection) => return Ok(Attempt::Rejected(rejection)),
        };

        let total = self.inner.tray.total();
        let price = round.price();
        let outcome = evaluate_payment(total, price, state.change_mode);
        debug!(round_id = %round.id, total = %total, price = %price, ?outcome, "Payment evaluated");

        let replay = match outcome {
            PaymentOutcome::Exact => {
                info!(round_id = %round.id, "Exact payment");
                self.say(&mut state, Feedback::Correct);
                state.completing = true;
                self.schedule_completion(round.id);
                None
            }
            PaymentOutcome::Short { diff } => {
                self.say(&mut state, Feedback::Shortage { diff });
                None
            }
            PaymentOutcome::OverRejected { .. } => {
                self.say(&mut state, Feedback::Over);
                None
            }
            PaymentOutcome::OverAccepted { snapshot } => {
                let catalogs = &self.inner.catalogs;
                let breakdown =
                    decompose(price, total, &catalogs.denominations, &catalogs.canonical)
                        .map_err(|err| self.breakdown_failed(&mut state, &round, err))?;

                let Some(exclusive) = self.inner.tray.try_lock_exclusive() else {
                    return Ok(Attempt::Rejected(Rejection::Animating));
                };

                info!(
                    round_id = %round.id,
                    paid = %total,
                    pieces = breakdown.len(),
                    change = %breakdown.change_total(),
                    "Starting change practice"
                );
                state.snapshot = Some(snapshot);
                self.say(&mut state, Feedback::ChangeModeStart { price });
                Some(PendingReplay {
                    session: self.clone(),
                    exclusive,
                    pieces: breakdown.sequence(),
                    change_round: Some(round.id),
                })
            }
        };

        Ok(Attempt::Done(Payment { outcome, replay }))
    }

    /// Evaluates the tray against the price and waits for any replay.
    ///
    /// Same outcomes and errors as [`ShopSession::submit_payment`]; resolves
    /// once an accepted overpayment has been laid out on the tray.
    pub async fn pay(&self) -> ShopResult<Attempt<PaymentOutcome>> {
        let payment = match self.submit_payment()? {
            Attempt::Done(payment) => payment,
            Attempt::Rejected(rejection) => return Ok(Attempt::Rejected(rejection)),
        };
        if let Some(replay) = payment.replay {
            replay.run().await;
        }
        Ok(Attempt::Done(payment.outcome))
    }

    /// Takes the tray for a demonstration of paying the price exactly.
    ///
    /// The returned replay clears the tray and lays out a full-catalog
    /// breakdown of the price. The stage stays BUYING, so a following `pay`
    /// is exact.
    ///
    /// ## Errors
    /// `DecompositionIncomplete` when the catalog cannot make the price. The
    /// failure becomes the feedback text; the tray is left as it was.
    pub fn submit_reveal(&self) -> ShopResult<Attempt<PendingReplay>> {
        let mut state = self.state();
        let round = match self.ready_to_pay(&state) {
            Ok(round) => round,
            Err(rejection) => return Ok(Attempt::Rejected(rejection)),
        };

        let pieces = solution(round.price(), &self.inner.catalogs.denominations)
            .map_err(|err| self.breakdown_failed(&mut state, &round, err))?;
        let Some(exclusive) = self.inner.tray.try_lock_exclusive() else {
            return Ok(Attempt::Rejected(Rejection::Animating));
        };

        info!(round_id = %round.id, pieces = pieces.len(), "Revealing solution");
        self.say(&mut state, Feedback::Reveal);
        Ok(Attempt::Done(PendingReplay {
            session: self.clone(),
            exclusive,
            pieces,
            change_round: None,
        }))
    }

    /// Demonstrates a way to pay the price exactly and waits for the replay.
    pub async fn reveal_solution(&self) -> ShopResult<Attempt<Vec<Denomination>>> {
        let replay = match self.submit_reveal()? {
            Attempt::Done(replay) => replay,
            Attempt::Rejected(rejection) => return Ok(Attempt::Rejected(rejection)),
        };
        let pieces = replay.pieces().to_vec();
        replay.run().await;
        Ok(Attempt::Done(pieces))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejection shared by every tray write.
    fn mutation_blocked(&self, state: &SessionState) -> Option<Rejection> {
        if self.inner.tray.is_locked() {
            Some(Rejection::Animating)
        } else if state.completing {
            Some(Rejection::RoundCompleting)
        } else {
            None
        }
    }

    /// Checks pay / reveal preconditions and returns the current round.
    fn ready_to_pay(&self, state: &SessionState) -> Result<Round, Rejection> {
        if let Some(rejection) = self.mutation_blocked(state) {
            return Err(rejection);
        }
        if state.stage != Stage::Buying {
            return Err(Rejection::WrongStage { stage: state.stage });
        }
        state.round.clone().ok_or(Rejection::NoActiveRound)
    }

    fn begin_round(&self, state: &mut SessionState, range: PriceRange) -> ShopResult<Round> {
        let round = {
            let mut rng = self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner);
            next_round(&self.inner.catalogs.products, &range, &mut *rng)?
        };

        if self.inner.tray.try_with_tray_mut(TenderLedger::clear).is_none() {
            warn!("Tray locked while starting a round");
        }

        info!(
            round_id = %round.id,
            product = %round.product.name,
            price = %round.price(),
            range = %range.id,
            "Round started"
        );

        state.round = Some(round.clone());
        state.range = Some(range);
        state.snapshot = None;
        state.completing = false;
        state.feedback = None;
        self.set_stage(state, Stage::Buying);
        self.emit_tray();
        self.schedule_welcome(&round);

        Ok(round)
    }

    fn schedule_welcome(&self, round: &Round) {
        let session = self.clone();
        let round_id = round.id.clone();
        let feedback = Feedback::Welcome {
            name: round.product.name.clone(),
            price: round.price(),
        };
        let delay = self.inner.timing.welcome_delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = session.state();
            if state.is_current(&round_id) {
                session.say(&mut state, feedback);
            }
        });
    }

    fn schedule_completion(&self, round_id: String) {
        let session = self.clone();
        let delay = self.inner.timing.completion_delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = session.state();

            if !state.is_current(&round_id) || !state.completing {
                debug!(round_id = %round_id, "Discarding stale round completion");
                return;
            }

            let range = state.range.clone().unwrap_or_else(PriceRange::all);
            if let Err(err) = session.begin_round(&mut state, range) {
                warn!(error = %err, "Could not start next round, returning to setup");
                state.round = None;
                state.completing = false;
                session.set_stage(&mut state, Stage::Setup);
            }
        });
    }

    /// Records a failed breakdown as the visible feedback.
    fn breakdown_failed(&self, state: &mut SessionState, round: &Round, err: CoreError) -> ShopError {
        warn!(round_id = %round.id, error = %err, "Breakdown failed");
        state.feedback = Some(err.to_string());
        err.into()
    }

    fn on_replay_step(&self, step: ReplayStep) {
        self.emit_tray();
        if let ReplayStep::Landed { total, .. } = step {
            let mut state = self.state();
            if state.voice_feedback {
                self.say(&mut state, Feedback::RunningTotal { total });
            }
        }
    }

    fn say(&self, state: &mut SessionState, feedback: Feedback) {
        let text = self.inner.voice.render(&feedback);
        self.inner.notifier.notify(&text);
        self.inner.emitter.emit_feedback(&feedback, &text);
        state.feedback = Some(text);
    }

    fn set_stage(&self, state: &mut SessionState, stage: Stage) {
        if state.stage != stage {
            info!(from = %state.stage, to = %stage, "Stage changed");
            state.stage = stage;
            self.inner.emitter.emit_stage(stage);
        }
    }

    fn emit_tray(&self) {
        let (items, total) = self.inner.tray.contents();
        self.inner.emitter.emit_tray(&items, total);
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for ShopSession.
pub struct ShopSessionBuilder {
    config: ShopConfig,
    notifier: Option<Arc<dyn Notifier>>,
    emitter: Option<Arc<dyn ShopEventEmitter>>,
    seed: Option<u64>,
}

impl ShopSessionBuilder {
    pub fn new(config: ShopConfig) -> Self {
        ShopSessionBuilder {
            config,
            notifier: None,
            emitter: None,
            seed: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ShopEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Seeds product selection, for reproducible rounds.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the config and builds the session.
    pub fn build(self) -> ShopResult<ShopSession> {
        self.config.validate()?;
        let catalogs = self.config.catalogs()?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let state = SessionState {
            change_mode: self.config.game.change_mode,
            voice_feedback: self.config.game.voice_feedback,
            ..SessionState::default()
        };

        let inner = Inner {
            catalogs,
            voice: self.config.voice,
            sequencer: AnimationSequencer::from_timing(&self.config.timing),
            timing: self.config.timing,
            tray: Tray::new(),
            state: Mutex::new(state),
            rng: Mutex::new(rng),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(NoOpNotifier)),
            emitter: self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter)),
        };

        Ok(ShopSession {
            inner: Arc::new(inner),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use coinwise_core::error::BreakdownPhase;
    use coinwise_core::{DenominationKind, Product};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        fn heard(&self, text: &str) -> bool {
            self.lines().iter().any(|l| l == text)
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, text: &str) {
            self.lines.lock().unwrap().push(text.to_string());
        }
    }

    fn m(units: i64) -> Money {
        Money::from_units(units)
    }

    fn config_with(products: Vec<Product>, change_mode: bool) -> ShopConfig {
        let mut config = ShopConfig::default();
        config.catalog.products = products;
        config.game.change_mode = change_mode;
        config
    }

    fn session(config: ShopConfig) -> (ShopSession, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let session = ShopSession::builder(config)
            .with_notifier(recorder.clone())
            .with_seed(7)
            .build()
            .unwrap();
        (session, recorder)
    }

    fn started(price: i64, change_mode: bool) -> (ShopSession, Arc<Recorder>) {
        let (session, recorder) = session(config_with(
            vec![Product::new("p1", "漢堡", price)],
            change_mode,
        ));
        assert!(session.start_round("all").unwrap().is_done());
        (session, recorder)
    }

    fn add_all(session: &ShopSession, values: &[i64]) {
        for &v in values {
            assert!(session.add_denomination(m(v)).unwrap().is_done());
        }
    }

    fn tray_values(session: &ShopSession) -> Vec<i64> {
        session.snapshot().tray.iter().map(|d| d.value.units()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_range_keeps_setup() {
        let (session, _) = session(ShopConfig::default());

        let err = session.start_round("500-1000").unwrap_err();
        assert!(matches!(
            err,
            ShopError::Core(CoreError::NoProductsInRange { .. })
        ));
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.current_round().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_range_is_error() {
        let (session, _) = session(ShopConfig::default());
        assert!(matches!(
            session.start_round("9-99"),
            Err(ShopError::UnknownRange(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_round_and_welcome() {
        let (session, recorder) = started(45, false);

        assert_eq!(session.stage(), Stage::Buying);
        assert_eq!(session.current_round().unwrap().price(), m(45));
        assert!(recorder.lines().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(recorder.heard("我要買漢堡，45元"));

        // A second start while buying is ignored
        assert!(matches!(
            session.start_round("all").unwrap(),
            Attempt::Rejected(Rejection::WrongStage { stage: Stage::Buying })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_payment() {
        let (session, recorder) = started(30, false);
        add_all(&session, &[10, 10, 5]);

        let outcome = session.pay().await.unwrap().done().unwrap();
        assert_eq!(outcome, PaymentOutcome::Short { diff: m(5) });
        assert_eq!(session.stage(), Stage::Buying);
        assert!(recorder.heard("還差 5 元"));
        assert_eq!(session.snapshot().feedback.as_deref(), Some("還差 5 元"));

        // Still playable
        assert!(session.add_denomination(m(5)).unwrap().is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overpayment_rejected_without_change_mode() {
        let (session, recorder) = started(45, false);
        add_all(&session, &[50]);

        let outcome = session.pay().await.unwrap().done().unwrap();
        assert_eq!(outcome, PaymentOutcome::OverRejected { excess: m(5) });
        assert_eq!(session.stage(), Stage::Buying);
        assert_eq!(session.snapshot().tray_total, m(50));
        assert!(recorder.heard("付太多了，試試看能不能付剛好？"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_practice_walkthrough() {
        let (session, recorder) = started(45, true);
        add_all(&session, &[50]);

        let outcome = session.pay().await.unwrap().done().unwrap();
        assert!(matches!(outcome, PaymentOutcome::OverAccepted { .. }));
        assert_eq!(session.stage(), Stage::ChangeAction);
        assert_eq!(tray_values(&session), vec![10, 10, 10, 10, 5, 5]);
        assert_eq!(session.snapshot().paid_so_far, Some(m(0)));
        assert!(!session.is_animating());

        // Adding is not part of change practice
        assert!(matches!(
            session.add_denomination(m(1)).unwrap(),
            Attempt::Rejected(Rejection::WrongStage { .. })
        ));

        let removal = session.remove_denomination(0).done().unwrap();
        assert_eq!(
            removal.change,
            Some(ChangeStatus::StillTaking {
                paid: m(10),
                remaining: m(35)
            })
        );
        assert!(recorder.heard("目前拿了10元，還要再拿35元。"));

        for _ in 0..3 {
            session.remove_denomination(0).done().unwrap();
        }
        assert_eq!(session.snapshot().paid_so_far, Some(m(40)));

        let removal = session.remove_denomination(0).done().unwrap();
        assert_eq!(removal.change, Some(ChangeStatus::Complete { change: m(5) }));
        assert!(recorder.heard("付好了！剩下5元是找的錢。"));

        // Nothing moves while the success screen is up
        assert_eq!(
            session.remove_denomination(0).rejection(),
            Some(Rejection::RoundCompleting)
        );

        let finished = session.current_round().unwrap().id;
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(session.stage(), Stage::Buying);
        assert_ne!(session.current_round().unwrap().id, finished);
        assert!(session.snapshot().tray.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_taking_too_much_reprompts() {
        let (session, recorder) = started(42, true);
        add_all(&session, &[50]);
        session.pay().await.unwrap();
        assert_eq!(tray_values(&session), vec![10, 10, 10, 10, 1, 1, 5, 1, 1, 1]);

        for _ in 0..4 {
            session.remove_denomination(0).done().unwrap();
        }
        // Tray is now [1, 1, 5, 1, 1, 1]; taking the 5 overshoots 42
        let removal = session.remove_denomination(2).done().unwrap();
        assert_eq!(removal.total, m(5));
        assert_eq!(removal.change, Some(ChangeStatus::TooMuchTaken { paid: m(45) }));
        assert_eq!(session.stage(), Stage::ChangeAction);
        assert!(recorder.heard("付太多了，我們來練習找錢。請拿走要付的42元。"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emptying_tray_pays_initial_total() {
        let (session, _) = started(42, true);
        add_all(&session, &[50]);
        session.pay().await.unwrap();

        // The 5 first, so no prefix of the removals sums to exactly 42
        session.remove_denomination(6).done().unwrap();
        while session.snapshot().tray_total.is_positive() {
            session.remove_denomination(0).done().unwrap();
        }
        assert_eq!(session.snapshot().paid_so_far, Some(m(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_payment_completes_after_delay() {
        let (session, recorder) = started(45, false);
        add_all(&session, &[10, 10, 10, 10, 5]);
        let first = session.current_round().unwrap().id;

        let outcome = session.pay().await.unwrap().done().unwrap();
        assert_eq!(outcome, PaymentOutcome::Exact);
        assert!(recorder.heard("答對了！好棒！"));

        assert_eq!(
            session.add_denomination(m(1)).unwrap().rejection(),
            Some(Rejection::RoundCompleting)
        );
        assert_eq!(
            session.pay().await.unwrap().rejection(),
            Some(Rejection::RoundCompleting)
        );

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(session.current_round().unwrap().id, first);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_ne!(session.current_round().unwrap().id, first);
        assert!(!session.snapshot().completing);
        assert!(session.add_denomination(m(1)).unwrap().is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tray_locked_during_replay() {
        let (session, _) = started(45, true);
        add_all(&session, &[50]);

        let paying = session.clone();
        let task = tokio::spawn(async move { paying.pay().await });
        while !session.is_animating() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            session.add_denomination(m(1)).unwrap().rejection(),
            Some(Rejection::Animating)
        );
        assert_eq!(
            session.remove_denomination(0).rejection(),
            Some(Rejection::Animating)
        );
        assert_eq!(session.reset_tray().rejection(), Some(Rejection::Animating));
        assert_eq!(
            session.pay().await.unwrap().rejection(),
            Some(Rejection::Animating)
        );
        assert_eq!(
            session.reveal_solution().await.unwrap().rejection(),
            Some(Rejection::Animating)
        );
        assert_eq!(session.return_to_setup().rejection(), Some(Rejection::Animating));

        assert!(task.await.unwrap().unwrap().is_done());
        assert_eq!(tray_values(&session), vec![10, 10, 10, 10, 5, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_speaks_running_totals_in_order() {
        let (session, recorder) = started(45, true);
        add_all(&session, &[50]);
        session.pay().await.unwrap();

        let totals: Vec<String> = recorder
            .lines()
            .into_iter()
            .skip_while(|l| !l.starts_with("付太多了，我們來練習找錢"))
            .filter(|l| l.trim_end_matches('元').parse::<i64>().is_ok())
            .collect();
        assert_eq!(totals, vec!["10元", "20元", "30元", "40元", "45元", "50元"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_feedback_off_mutes_totals_only() {
        let (session, recorder) = started(30, false);
        session.set_voice_feedback(false);

        add_all(&session, &[10]);
        assert!(!recorder.heard("10元"));

        session.pay().await.unwrap();
        assert!(recorder.heard("還差 20 元"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decomposition_failure_leaves_tray_alone() {
        let mut config = config_with(vec![Product::new("p1", "怪價錢", 47)], true);
        config.catalog.denominations = vec![
            Denomination::new(5, DenominationKind::Coin),
            Denomination::new(10, DenominationKind::Coin),
            Denomination::new(50, DenominationKind::Coin),
        ];
        config.catalog.canonical_subset = vec![m(50), m(10), m(5)];
        let (session, _) = session(config);
        session.start_round("all").unwrap();
        add_all(&session, &[50]);

        let err = session.pay().await.unwrap_err();
        assert!(matches!(
            err,
            ShopError::Core(CoreError::DecompositionIncomplete {
                phase: BreakdownPhase::Price,
                ..
            })
        ));
        assert_eq!(session.stage(), Stage::Buying);
        assert_eq!(tray_values(&session), vec![50]);
        assert!(!session.is_animating());
        assert_eq!(session.snapshot().feedback, Some(err.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_price_change_practice_runs_past_player_limit() {
        let (session, _) = started(9999, true);
        add_all(&session, &[1000; 10]);

        let outcome = session.pay().await.unwrap().done().unwrap();
        assert!(matches!(outcome, PaymentOutcome::OverAccepted { .. }));
        assert_eq!(session.stage(), Stage::ChangeAction);

        // 199×50 + 4×10 + 5 + 4×1 for the price, one 1 for the change
        let snapshot = session.snapshot();
        assert_eq!(snapshot.tray.len(), 209);
        assert!(snapshot.tray.len() > coinwise_core::MAX_TRAY_ITEMS);
        assert_eq!(snapshot.tray_total, m(10_000));
        assert_eq!(snapshot.paid_so_far, Some(m(0)));

        let removal = session.remove_denomination(208).done().unwrap();
        assert_eq!(
            removal.change,
            Some(ChangeStatus::StillTaking {
                paid: m(1),
                remaining: m(9998)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_payment_ignores_later_input() {
        let (session, _) = started(45, true);
        add_all(&session, &[50]);

        let payment = session.submit_payment().unwrap().done().unwrap();
        assert!(matches!(payment.outcome, PaymentOutcome::OverAccepted { .. }));
        assert!(session.is_animating());

        // The tray is taken before the replay starts
        assert_eq!(
            session.add_denomination(m(1)).unwrap().rejection(),
            Some(Rejection::Animating)
        );
        assert_eq!(session.snapshot().tray_total, m(50));

        let replay = payment.replay.unwrap();
        assert_eq!(replay.pieces().len(), 6);
        assert_eq!(replay.run().await, m(50));
        assert_eq!(session.stage(), Stage::ChangeAction);
        assert!(!session.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_failure_shows_feedback() {
        let mut config = config_with(vec![Product::new("p1", "怪價錢", 47)], false);
        config.catalog.denominations = vec![
            Denomination::new(5, DenominationKind::Coin),
            Denomination::new(10, DenominationKind::Coin),
            Denomination::new(50, DenominationKind::Coin),
        ];
        config.catalog.canonical_subset = vec![m(50), m(10), m(5)];
        let (session, _) = session(config);
        session.start_round("all").unwrap();
        add_all(&session, &[10]);

        let err = session.reveal_solution().await.unwrap_err();
        assert!(matches!(
            err,
            ShopError::Core(CoreError::DecompositionIncomplete { .. })
        ));
        assert_eq!(session.snapshot().feedback, Some(err.to_string()));
        assert_eq!(tray_values(&session), vec![10]);
        assert!(!session.is_animating());
        assert_eq!(session.stage(), Stage::Buying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_solution_then_pay_exact() {
        let (session, recorder) = started(120, true);
        add_all(&session, &[1, 1]);

        let pieces = session.reveal_solution().await.unwrap().done().unwrap();
        let values: Vec<i64> = pieces.iter().map(|d| d.value.units()).collect();
        assert_eq!(values, vec![100, 10, 10]);
        assert_eq!(tray_values(&session), vec![100, 10, 10]);
        assert_eq!(session.stage(), Stage::Buying);
        assert!(recorder.heard("像這樣付就對了"));

        assert_eq!(
            session.pay().await.unwrap().done(),
            Some(PaymentOutcome::Exact)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_setup_discards_pending_completion() {
        let (session, _) = started(45, false);
        add_all(&session, &[10, 10, 10, 10, 5]);
        session.pay().await.unwrap();

        assert!(session.return_to_setup().is_done());
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.snapshot().tray.is_empty());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.current_round().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_rules() {
        let (session, _) = session(config_with(vec![Product::new("p1", "牛奶", 32)], false));

        assert!(matches!(
            session.add_denomination(m(1)).unwrap(),
            Attempt::Rejected(Rejection::WrongStage { stage: Stage::Setup })
        ));
        assert!(matches!(
            session.remove_denomination(0),
            Attempt::Rejected(Rejection::WrongStage { .. })
        ));
        assert!(session.set_change_mode(true).is_done());
        assert!(session.snapshot().change_mode);

        session.start_round("31-40").unwrap();
        assert!(matches!(
            session.set_change_mode(false),
            Attempt::Rejected(Rejection::WrongStage { stage: Stage::Buying })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_denomination_and_bad_index() {
        let (session, _) = started(45, false);

        assert!(matches!(
            session.add_denomination(m(3)),
            Err(ShopError::Core(CoreError::UnknownDenomination { .. }))
        ));
        assert_eq!(
            session.remove_denomination(4).rejection(),
            Some(Rejection::NoSuchItem { index: 4 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes_for_ui() {
        let (session, _) = started(45, false);
        add_all(&session, &[10]);

        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["stage"], "BUYING");
        assert_eq!(json["tray_total"], 10);
        assert_eq!(json["round"]["product"]["name"], "漢堡");
        assert!(json["paid_so_far"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_tray() {
        let (session, _) = started(45, false);
        add_all(&session, &[10, 5]);
        assert!(session.reset_tray().is_done());
        assert_eq!(session.snapshot().tray_total, m(0));
    }
}
