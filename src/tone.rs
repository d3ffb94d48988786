use crate::config::CARRIER_HZ;
use crossbeam_channel::Sender;
use rodio::Source;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Identifies one playback, so late notifications can be told apart.
pub type PlaybackId = u64;

/// Notifications sent by a running tone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The tone reached its scheduled stop time on its own.
    Ended(PlaybackId),
}

/// A frequency the generator switches to at a given offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyChange {
    /// Seconds after the first rendered sample.
    pub at: f64,
    /// The new frequency in Hertz.
    pub hz: f64,
}

/// Shared between the control thread and whichever thread renders the tone.
#[derive(Clone, Debug, Default)]
pub struct ToneControl {
    inner: Arc<ControlFlags>,
}

#[derive(Debug, Default)]
struct ControlFlags {
    halted: AtomicBool,
    finished: AtomicBool,
}

impl ToneControl {
    /// Stops the tone at the next rendered sample. Pending frequency changes are dropped.
    pub fn halt(&self) {
        self.inner.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.inner.halted.load(Ordering::SeqCst)
    }

    /// Whether the tone ran until its scheduled stop time.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    fn finish(&self) -> bool {
        !self.inner.finished.swap(true, Ordering::SeqCst)
    }
}

/// A sine oscillator whose frequency follows a schedule and which stops by itself.
///
/// The generator's clock starts at its first rendered sample; every
/// [`FrequencyChange::at`] and the stop time are measured from there.
pub struct ToneGenerator {
    id: PlaybackId,
    sample_rate: u32,
    /// Changes not yet applied, in the order they take effect.
    schedule: std::vec::IntoIter<FrequencyChange>,
    next_change: Option<FrequencyChange>,
    frequency: f64,
    /// Phase in cycles, kept within `[0, 1)`.
    phase: f64,
    position: u64,
    stop_at: u64,
    control: ToneControl,
    events: Option<Sender<PlaybackEvent>>,
}

impl ToneGenerator {
    /// Creates a generator starting at [`CARRIER_HZ`].
    ///
    /// ## Arguments
    /// * `schedule` - The frequency changes; must be ordered by [`FrequencyChange::at`].
    /// * `sample_rate` - The sampling rate in Hertz, e.g. `44100`.
    /// * `duration` - Seconds after which the generator stops on its own.
    pub fn new(
        id: PlaybackId,
        schedule: Vec<FrequencyChange>,
        sample_rate: u32,
        duration: f64,
    ) -> Self {
        debug_assert!(sample_rate > 0);
        debug_assert!(schedule.windows(2).all(|w| w[0].at <= w[1].at));
        let mut schedule = schedule.into_iter();
        let next_change = schedule.next();

        Self {
            id,
            sample_rate,
            schedule,
            next_change,
            frequency: CARRIER_HZ as f64,
            phase: 0.0,
            position: 0,
            stop_at: (duration * sample_rate as f64).round() as u64,
            control: ToneControl::default(),
            events: None,
        }
    }

    /// Sends [`PlaybackEvent::Ended`] to `events` once the stop time is reached.
    pub fn with_events(mut self, events: Sender<PlaybackEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn control(&self) -> ToneControl {
        self.control.clone()
    }

    /// The frequency of the most recently rendered sample.
    #[cfg(test)]
    fn frequency(&self) -> f64 {
        self.frequency
    }

    #[inline]
    fn elapsed(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    fn apply_due_changes(&mut self) {
        let now = self.elapsed();
        while let Some(change) = self.next_change {
            if change.at > now {
                break;
            }
            self.frequency = change.hz;
            self.next_change = self.schedule.next();
        }
    }

    fn notify_ended(&mut self) {
        if self.control.finish() {
            tracing::debug!(id = self.id, "tone reached its stop time");
            if let Some(events) = self.events.take() {
                // The receiver may already be gone when the program is shutting down.
                let _ = events.send(PlaybackEvent::Ended(self.id));
            }
        }
    }
}

impl Iterator for ToneGenerator {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.control.is_halted() {
            return None;
        }
        if self.position >= self.stop_at {
            self.notify_ended();
            return None;
        }

        self.apply_due_changes();
        let sample = (TAU * self.phase).sin();
        self.phase = (self.phase + self.frequency / self.sample_rate as f64).fract();
        self.position += 1;
        Some(sample as f32)
    }
}

impl Source for ToneGenerator {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.stop_at as f64 / self.sample_rate as f64,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const RATE: u32 = 8000;

    fn change(at: f64, hz: f64) -> FrequencyChange {
        FrequencyChange { at, hz }
    }

    #[test]
    fn stops_after_duration() {
        let tone = ToneGenerator::new(1, vec![change(0.0, 200.0)], RATE, 0.5);
        let control = tone.control();
        assert_eq!(tone.count(), 4000);
        assert!(control.is_finished());
    }

    #[test]
    fn starts_at_carrier_until_first_change() {
        let mut tone = ToneGenerator::new(1, vec![change(0.25, 300.0)], RATE, 1.0);
        for _ in 0..2000 {
            tone.next().unwrap();
            assert_eq!(tone.frequency(), 440.0);
        }
        tone.next().unwrap();
        assert_eq!(tone.frequency(), 300.0);
    }

    #[test]
    fn changes_apply_at_their_offsets() {
        let mut tone = ToneGenerator::new(
            1,
            vec![change(0.0, 100.0), change(0.25, 300.0), change(0.5, 500.0)],
            RATE,
            1.0,
        );
        let mut seen = Vec::new();
        for _ in 0..RATE {
            tone.next().unwrap();
            seen.push(tone.frequency());
        }
        assert_eq!(seen[0], 100.0);
        assert_eq!(seen[1999], 100.0);
        assert_eq!(seen[2000], 300.0);
        assert_eq!(seen[3999], 300.0);
        assert_eq!(seen[4000], 500.0);
        assert_eq!(seen[7999], 500.0);
    }

    #[test]
    fn renders_a_sine() {
        let tone = ToneGenerator::new(1, vec![change(0.0, 1000.0)], RATE, 0.01);
        let samples: Vec<f32> = tone.collect();
        // 1 kHz at 8 kHz: one cycle every eight samples.
        assert_relative_eq!(samples[0], 0.0);
        assert_relative_eq!(samples[2], 1.0, epsilon = 1e-6);
        assert_relative_eq!(samples[6], -1.0, epsilon = 1e-6);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn halt_stops_immediately_without_notification() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut tone = ToneGenerator::new(7, vec![change(0.0, 200.0)], RATE, 1.0).with_events(tx);
        let control = tone.control();
        assert!(tone.next().is_some());

        control.halt();
        assert!(tone.next().is_none());
        assert!(!control.is_finished());
        drop(tone);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn natural_end_notifies_once() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut tone = ToneGenerator::new(3, vec![change(0.0, 200.0)], RATE, 0.001).with_events(tx);
        while tone.next().is_some() {}
        assert!(tone.next().is_none());

        assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Ended(3)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn huge_frequencies_stay_finite() {
        let tone = ToneGenerator::new(1, vec![change(0.0, 1.4e102)], RATE, 0.01);
        assert!(tone.map(f32::is_finite).all(|finite| finite));
    }

    #[test]
    fn reports_its_format() {
        let tone = ToneGenerator::new(1, Vec::new(), RATE, 2.0);
        assert_eq!(tone.channels(), 1);
        assert_eq!(Source::sample_rate(&tone), RATE);
        assert_eq!(tone.total_duration(), Some(Duration::from_secs(2)));
    }
}
