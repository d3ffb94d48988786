use crate::scheduler::{GainStage, Output, Voice};
use anyhow::Context;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Plays gain stages on the default output device.
///
/// The device is opened the first time something is connected and kept for
/// the lifetime of the output.
#[derive(Default)]
pub struct RodioOutput {
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> anyhow::Result<&OutputStreamHandle> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let stream = OutputStream::try_default()
                    .context("failed to open the default audio device")?;
                tracing::info!("opened the default audio output device");
                stream
            }
        };
        let (_, handle) = self.stream.insert(stream);
        Ok(&*handle)
    }
}

impl Output for RodioOutput {
    type Voice = RodioVoice;

    fn connect(&mut self, gain: GainStage) -> anyhow::Result<RodioVoice> {
        let sink = Sink::try_new(self.handle()?).context("failed to create an audio sink")?;
        sink.append(gain);
        Ok(RodioVoice { sink })
    }
}

/// A gain stage playing through a rodio [`Sink`]. Dropping it silences the sink.
pub struct RodioVoice {
    sink: Sink,
}

impl Voice for RodioVoice {
    fn disconnect(self) {
        self.sink.stop();
    }
}

/// Collects connected gain stages so they can be rendered without a device.
#[derive(Clone, Default)]
pub struct OfflineOutput {
    connected: Rc<RefCell<Vec<GainStage>>>,
}

impl OfflineOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every gain stage connected so far, oldest first.
    pub fn take_connected(&self) -> Vec<GainStage> {
        self.connected.take()
    }

    /// Renders every connected gain stage to completion and mixes them.
    ///
    /// Stages that were stopped contribute nothing.
    pub fn render(&self) -> Vec<f32> {
        let mut mix: Vec<f32> = Vec::new();
        for stage in self.take_connected() {
            for (i, sample) in stage.enumerate() {
                match mix.get_mut(i) {
                    Some(slot) => *slot += sample,
                    None => mix.push(sample),
                }
            }
        }
        mix
    }
}

impl Output for OfflineOutput {
    type Voice = OfflineVoice;

    fn connect(&mut self, gain: GainStage) -> anyhow::Result<OfflineVoice> {
        self.connected.borrow_mut().push(gain);
        Ok(OfflineVoice)
    }
}

/// Nothing to detach; halting the tone already ends the stage.
pub struct OfflineVoice;

impl Voice for OfflineVoice {
    fn disconnect(self) {}
}

/// Writes `signal` as 16-bit mono PCM.
pub fn write_wav(signal: &[f32], sample_rate: u32, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let amplitude = i16::MAX as f32;
    for &sample in signal {
        writer.write_sample((sample.clamp(-1.0, 1.0) * amplitude) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
