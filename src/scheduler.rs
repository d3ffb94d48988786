use crate::config::{BASE_HZ, GAIN, HZ_PER_UNIT};
use crate::sampler::Sequence;
use crate::tone::{FrequencyChange, PlaybackEvent, PlaybackId, ToneControl, ToneGenerator};
use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use rodio::source::Amplify;
use rodio::Source;

/// The generator → gain chain handed to an [`Output`].
pub type GainStage = Amplify<ToneGenerator>;

/// Whether a tone is currently sounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

/// Maps a function value to the frequency the tone plays for it.
///
/// Values of typical magnitude land between 110 Hz and 990 Hz. The result is
/// not clamped, so large values produce frequencies well outside that band.
#[inline]
pub fn map_frequency(z: f64) -> f64 {
    z.abs() * HZ_PER_UNIT + BASE_HZ
}

/// One frequency change per sample, at the sample's time offset.
pub fn frequency_schedule(sequence: &Sequence) -> Vec<FrequencyChange> {
    sequence
        .iter()
        .map(|sample| FrequencyChange {
            at: sample.t,
            hz: map_frequency(sample.z),
        })
        .collect()
}

/// The frequency a schedule plays at `t` seconds; `None` before its first change.
pub fn scheduled_frequency_at(schedule: &[FrequencyChange], t: f64) -> Option<f64> {
    let applied = schedule.partition_point(|change| change.at <= t);
    applied.checked_sub(1).map(|i| schedule[i].hz)
}

/// Something a gain stage can be connected to.
pub trait Output {
    type Voice: Voice;

    /// Connects `gain` and starts pulling samples from it.
    fn connect(&mut self, gain: GainStage) -> anyhow::Result<Self::Voice>;
}

/// The output side of one connected gain stage.
pub trait Voice {
    /// Detaches the gain stage from the output.
    fn disconnect(self);
}

/// The owned generator/gain pair of one playback.
///
/// Returned by [`Scheduler::play`] and given back to [`Scheduler::stop`], or to
/// the next [`Scheduler::play`] which stops it before starting a new tone.
#[must_use = "dropping a playback leaves its tone running until it ends"]
pub struct Playback<V> {
    id: PlaybackId,
    control: ToneControl,
    voice: V,
}

impl<V> Playback<V> {
    #[inline]
    pub fn id(&self) -> PlaybackId {
        self.id
    }

    /// [`PlaybackState::Idle`] once the tone was halted or ran to its end.
    pub fn state(&self) -> PlaybackState {
        if self.control.is_halted() || self.control.is_finished() {
            PlaybackState::Idle
        } else {
            PlaybackState::Playing
        }
    }
}

/// Turns sequences into tones on an [`Output`].
pub struct Scheduler<O> {
    output: O,
    sample_rate: u32,
    next_id: PlaybackId,
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
}

impl<O: Output> Scheduler<O> {
    pub fn new(output: O, sample_rate: u32) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            output,
            sample_rate,
            next_id: 1,
            events_tx,
            events_rx,
        }
    }

    /// Receives [`PlaybackEvent::Ended`] whenever a tone reaches its stop time.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.events_rx.clone()
    }

    /// Starts a tone following `sequence` that stops by itself after `duration` seconds.
    ///
    /// A `previous` playback is stopped before anything new is built, so two
    /// tones never overlap.
    pub fn play(
        &mut self,
        previous: Option<Playback<O::Voice>>,
        sequence: &Sequence,
        duration: f64,
    ) -> anyhow::Result<Playback<O::Voice>> {
        if let Some(previous) = previous {
            self.stop(previous);
        }

        let id = self.next_id;
        self.next_id += 1;

        let tone = ToneGenerator::new(id, frequency_schedule(sequence), self.sample_rate, duration)
            .with_events(self.events_tx.clone());
        let control = tone.control();
        let voice = self
            .output
            .connect(tone.amplify(GAIN))
            .context("failed to connect the tone to the audio output")?;

        tracing::debug!(id, duration, changes = sequence.len(), "playback started");
        Ok(Playback { id, control, voice })
    }

    /// Halts the tone at once and disconnects its gain stage.
    ///
    /// Stopping a playback that already ended has no audible effect.
    pub fn stop(&mut self, playback: Playback<O::Voice>) {
        let Playback { id, control, voice } = playback;
        control.halt();
        voice.disconnect();
        tracing::debug!(id, "playback stopped");
    }
}
