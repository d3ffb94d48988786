use crate::config::Selection;
use crate::equation::EquationKind;
use crate::sampler::{sample, Sequence};
use crate::scheduler::{Output, Playback, PlaybackState, Scheduler};
use crate::tone::PlaybackEvent;
use crossbeam_channel::Receiver;
use std::time::Duration;

/// What a presentation holds: the current selection, its sequence and the playing tone.
///
/// Every presentation (command line, console) drives playback through a session.
pub struct Session<O: Output> {
    equation: EquationKind,
    duration: u32,
    sequence: Sequence,
    scheduler: Scheduler<O>,
    events: Receiver<PlaybackEvent>,
    current: Option<Playback<O::Voice>>,
}

impl<O: Output> Session<O> {
    pub fn new(scheduler: Scheduler<O>, selection: Selection) -> Self {
        let events = scheduler.events();
        Self {
            equation: selection.equation,
            duration: selection.duration,
            sequence: sample(selection.equation, selection.duration as f64),
            scheduler,
            events,
            current: None,
        }
    }

    #[inline]
    pub fn equation(&self) -> EquationKind {
        self.equation
    }

    #[inline]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The sequence for the current selection, as handed to the chart.
    #[inline]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn select_equation(&mut self, equation: EquationKind) {
        if equation != self.equation {
            self.equation = equation;
            self.resample();
        }
    }

    pub fn select_duration(&mut self, duration: u32) {
        if duration != self.duration {
            self.duration = duration;
            self.resample();
        }
    }

    fn resample(&mut self) {
        self.sequence = sample(self.equation, self.duration as f64);
        tracing::debug!(equation = %self.equation, duration = self.duration, "resampled");
    }

    /// Applies pending notifications and reports the state.
    pub fn state(&mut self) -> PlaybackState {
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
        }
        self.current_state()
    }

    fn current_state(&self) -> PlaybackState {
        if self.current.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    fn handle(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Ended(id) => {
                // Notifications from earlier playbacks are stale.
                if self.current.as_ref().is_some_and(|p| p.id() == id) {
                    tracing::info!(id, "playback finished");
                    self.current = None;
                }
            }
        }
    }

    /// Plays the current sequence, restarting if a tone is already playing.
    pub fn play(&mut self) -> anyhow::Result<()> {
        let previous = self.current.take();
        let playback =
            self.scheduler
                .play(previous, &self.sequence, self.duration as f64)?;
        tracing::info!(
            id = playback.id(),
            equation = %self.equation,
            duration = self.duration,
            "playing"
        );
        self.current = Some(playback);
        Ok(())
    }

    /// Stops the current tone; does nothing when idle.
    pub fn stop(&mut self) {
        if let Some(playback) = self.current.take() {
            self.scheduler.stop(playback);
        }
    }

    /// Plays when idle, stops when playing.
    pub fn toggle(&mut self) -> anyhow::Result<PlaybackState> {
        match self.state() {
            PlaybackState::Idle => self.play()?,
            PlaybackState::Playing => self.stop(),
        }
        Ok(self.current_state())
    }

    /// Waits up to `timeout` for the current tone to end on its own.
    pub fn wait(&mut self, timeout: Duration) -> PlaybackState {
        if self.current.is_some() {
            if let Ok(event) = self.events.recv_timeout(timeout) {
                self.handle(event);
            }
        }
        self.state()
    }
}
