//! Periodic progress reporting
//!
//! One periodic time observer per session feeds `UiEvent::TimeTick` into the
//! UI queue; the reporter turns each tick into a normalized progress value
//! for the overlay's progress bar.

use crate::player::{MediaPlayer, TimeObserverToken, UiEvent, UiSender};
use crate::utils::error::{PipViewError, Result};
use crate::view::ScreenView;
use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;

/// Elapsed/total pair for one observer tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSample {
    pub elapsed: Duration,
    pub total: Duration,
}

impl ProgressSample {
    /// Build a sample, or `None` when the duration is unknown or zero
    pub fn new(elapsed: Duration, total: Option<Duration>) -> Option<Self> {
        match total {
            Some(total) if !total.is_zero() => Some(Self { elapsed, total }),
            _ => None,
        }
    }

    /// Progress in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        let fraction = self.elapsed.as_secs_f64() / self.total.as_secs_f64();
        fraction.clamp(0.0, 1.0) as f32
    }
}

/// Owns the periodic time observer of the live session
#[derive(Debug)]
pub struct ProgressReporter {
    interval: Duration,
    token: Option<TimeObserverToken>,
    emitted: u64,
    last: Option<ProgressSample>,
}

impl ProgressReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            token: None,
            emitted: 0,
            last: None,
        }
    }

    /// Register the periodic observer on `player`.
    ///
    /// Ticks are posted to the UI queue tagged with `generation`. Fails if an
    /// observer is already registered.
    pub fn register(
        &mut self,
        player: &mut dyn MediaPlayer,
        generation: u64,
        tx: UiSender,
    ) -> Result<()> {
        if self.token.is_some() {
            return Err(PipViewError::Internal(
                "time observer already registered for this session".to_string(),
            ));
        }

        let token = player.add_periodic_time_observer(
            self.interval,
            Box::new(move |elapsed| {
                let _ = tx.send(UiEvent::TimeTick { generation, elapsed });
            }),
        );
        debug!("Registered time observer {} every {:?}", token.id(), self.interval);

        self.token = Some(token);
        self.last = None;
        Ok(())
    }

    /// Remove the observer from `player`. Returns whether one was registered.
    pub fn deregister(&mut self, player: &mut dyn MediaPlayer) -> bool {
        match self.token.take() {
            Some(token) => {
                debug!("Removing time observer {}", token.id());
                player.remove_time_observer(token);
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.token.is_some()
    }

    /// Turn one observer tick into a progress update on `view`
    pub fn on_tick<V: ScreenView + ?Sized>(
        &mut self,
        elapsed: Duration,
        duration: Option<Duration>,
        view: &mut V,
    ) -> Option<ProgressSample> {
        if self.token.is_none() {
            warn!("Time tick without a registered observer");
            return None;
        }

        let sample = match ProgressSample::new(elapsed, duration) {
            Some(sample) => sample,
            None => {
                debug!("Duration unavailable, skipping progress at {:?}", elapsed);
                return None;
            }
        };

        view.set_progress(sample.fraction(), self.interval);
        self.emitted += 1;
        self.last = Some(sample);
        Some(sample)
    }

    pub fn last_sample(&self) -> Option<ProgressSample> {
        self.last
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RecordingView, SimPlayer};

    #[test]
    fn test_sample_fraction() {
        let sample =
            ProgressSample::new(Duration::from_secs(15), Some(Duration::from_secs(60))).unwrap();
        assert_eq!(sample.fraction(), 0.25);

        let past_end =
            ProgressSample::new(Duration::from_secs(61), Some(Duration::from_secs(60))).unwrap();
        assert_eq!(past_end.fraction(), 1.0);
    }

    #[test]
    fn test_no_sample_without_duration() {
        assert!(ProgressSample::new(Duration::from_secs(1), None).is_none());
        assert!(ProgressSample::new(Duration::from_secs(1), Some(Duration::ZERO)).is_none());
    }

    #[test]
    fn test_register_once() {
        let (mut player, handle) = SimPlayer::standalone(Some(Duration::from_secs(10)));
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut reporter = ProgressReporter::new(Duration::from_secs(1));

        reporter.register(&mut player, 1, tx.clone()).unwrap();
        assert!(reporter.register(&mut player, 1, tx).is_err());
        assert_eq!(handle.observer_count(), 1);
        assert!(reporter.is_registered());
    }

    #[test]
    fn test_deregister_once() {
        let (mut player, handle) = SimPlayer::standalone(Some(Duration::from_secs(10)));
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut reporter = ProgressReporter::new(Duration::from_secs(1));
        reporter.register(&mut player, 1, tx).unwrap();

        assert!(reporter.deregister(&mut player));
        assert!(!reporter.deregister(&mut player));
        assert_eq!(handle.observer_count(), 0);
        assert_eq!(handle.observers_removed(), 1);
        assert!(!reporter.is_registered());
    }

    #[test]
    fn test_ticks_reach_queue() {
        let (mut player, handle) = SimPlayer::standalone(Some(Duration::from_secs(10)));
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut reporter = ProgressReporter::new(Duration::from_secs(1));
        reporter.register(&mut player, 4, tx).unwrap();

        player.play();
        handle.advance(Duration::from_millis(2500));

        let ticks: Vec<_> = rx
            .try_iter()
            .map(|event| match event {
                UiEvent::TimeTick { generation, elapsed } => (generation, elapsed),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(ticks, vec![(4, Duration::from_secs(1)), (4, Duration::from_secs(2))]);
    }

    #[test]
    fn test_tick_updates_view() {
        let (mut player, _) = SimPlayer::standalone(Some(Duration::from_secs(4)));
        let (tx, _rx) = crossbeam_channel::unbounded();
        let (mut view, recorder) = RecordingView::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(1));
        reporter.register(&mut player, 1, tx).unwrap();

        let sample =
            reporter.on_tick(Duration::from_secs(1), Some(Duration::from_secs(4)), &mut view);
        assert_eq!(sample.map(|s| s.fraction()), Some(0.25));
        assert_eq!(recorder.progress_updates(), vec![0.25]);
        assert_eq!(reporter.emitted(), 1);
    }

    #[test]
    fn test_tick_without_duration_is_skipped() {
        let (mut player, _) = SimPlayer::standalone(None);
        let (tx, _rx) = crossbeam_channel::unbounded();
        let (mut view, recorder) = RecordingView::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(1));
        reporter.register(&mut player, 1, tx).unwrap();

        assert!(reporter.on_tick(Duration::from_secs(1), None, &mut view).is_none());
        assert!(reporter
            .on_tick(Duration::from_secs(2), Some(Duration::ZERO), &mut view)
            .is_none());
        assert!(recorder.progress_updates().is_empty());
        assert_eq!(reporter.emitted(), 0);
    }
}
