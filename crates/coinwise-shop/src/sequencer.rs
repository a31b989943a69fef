//! # Animation Sequencer
//!
//! Replays a breakdown onto the tray one piece at a time.
//!
//! ## Timeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lock ─ clear ─┬─ flight ─ pause ─ append[0] ─┬─ flight ─ pause ─ ...  │
//! │                │                              │                        │
//! │                └──────── piece 0 ─────────────┘                        │
//! │                                                                         │
//! │  ... ─ append[n-1] ─ unlock ─ return                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each timer await is a suspension point. Piece i+1 can never land before
//! piece i because the loop awaits its timers in order. There is no
//! cancellation: once started, a replay runs to the end.

use std::time::Duration;

use coinwise_core::{Denomination, Money};
use tracing::{debug, trace};

use crate::config::TimingSettings;
use crate::tray::ExclusiveTray;

/// A step the caller can observe while the replay runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// The tray was emptied before the first piece.
    Cleared,
    /// A piece landed; `total` is the tray total after it.
    Landed {
        index: usize,
        denomination: Denomination,
        total: Money,
    },
}

/// Fixed-timing replay of denomination lists.
#[derive(Debug, Clone, Copy)]
pub struct AnimationSequencer {
    flight: Duration,
    pause: Duration,
}

impl AnimationSequencer {
    pub fn new(flight: Duration, pause: Duration) -> Self {
        AnimationSequencer { flight, pause }
    }

    pub fn from_timing(timing: &TimingSettings) -> Self {
        Self::new(timing.flight(), timing.pause())
    }

    /// Time a replay of `pieces` items takes.
    pub fn duration_for(&self, pieces: usize) -> Duration {
        (self.flight + self.pause) * pieces as u32
    }

    /// Clears the tray and replays `pieces` into it.
    ///
    /// Consumes the exclusive guard, so the tray unlocks when this returns.
    /// Returns the final tray total.
    pub async fn replay<F>(
        &self,
        tray: ExclusiveTray,
        pieces: Vec<Denomination>,
        mut on_step: F,
    ) -> Money
    where
        F: FnMut(ReplayStep),
    {
        debug!(pieces = pieces.len(), "Starting tray replay");

        tray.clear();
        on_step(ReplayStep::Cleared);

        let mut total = Money::zero();
        for (index, denomination) in pieces.into_iter().enumerate() {
            tokio::time::sleep(self.flight).await;
            tokio::time::sleep(self.pause).await;

            total = tray.push(denomination.clone());
            trace!(index, value = %denomination.value, total = %total, "Piece landed");
            on_step(ReplayStep::Landed {
                index,
                denomination,
                total,
            });
        }

        debug!(total = %total, "Tray replay finished");
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tray::Tray;
    use coinwise_core::DenominationKind;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn coin(value: i64) -> Denomination {
        Denomination::new(value, DenominationKind::Coin)
    }

    fn sequencer() -> AnimationSequencer {
        AnimationSequencer::new(Duration::from_millis(600), Duration::from_millis(200))
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_clears_then_appends_in_order() {
        let tray = Tray::new();
        tray.try_with_tray_mut(|l| l.add(coin(50))).unwrap().unwrap();

        let exclusive = tray.try_lock_exclusive().unwrap();
        let mut steps = Vec::new();
        let total = sequencer()
            .replay(exclusive, vec![coin(10), coin(10), coin(5)], |s| steps.push(s))
            .await;

        assert_eq!(total.units(), 25);
        assert_eq!(steps[0], ReplayStep::Cleared);
        let landed: Vec<(usize, i64)> = steps[1..]
            .iter()
            .map(|s| match s {
                ReplayStep::Landed { index, total, .. } => (*index, total.units()),
                ReplayStep::Cleared => panic!("cleared twice"),
            })
            .collect();
        assert_eq!(landed, vec![(0, 10), (1, 20), (2, 25)]);
        assert!(!tray.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_piece_lands_after_flight_and_pause() {
        let tray = Tray::new();
        let exclusive = tray.try_lock_exclusive().unwrap();
        let start = Instant::now();
        let times = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&times);

        sequencer()
            .replay(exclusive, vec![coin(1), coin(1)], move |s| {
                if let ReplayStep::Landed { .. } = s {
                    recorded.lock().unwrap().push(start.elapsed());
                }
            })
            .await;

        let times = times.lock().unwrap();
        assert_eq!(*times, vec![Duration::from_millis(800), Duration::from_millis(1600)]);
        assert_eq!(sequencer().duration_for(2), Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tray_locked_for_whole_run() {
        let tray = Tray::new();
        let exclusive = tray.try_lock_exclusive().unwrap();
        let observer = tray.clone();

        let run = tokio::spawn(async move {
            sequencer()
                .replay(exclusive, vec![coin(10), coin(5)], |_| {})
                .await
        });

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(observer.is_locked());
        assert!(observer.try_with_tray_mut(|l| l.add(coin(1))).is_none());
        assert!(observer.try_lock_exclusive().is_none());
        assert_eq!(observer.total().units(), 10);

        run.await.unwrap();
        assert!(!observer.is_locked());
        assert_eq!(observer.total().units(), 15);
    }
}
