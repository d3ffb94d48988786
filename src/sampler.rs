use crate::config::SAMPLE_COUNT;
use crate::equation::EquationKind;
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::ops::Deref;

/// One evaluated point of a function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Sample {
    /// Seconds since the start of the sequence.
    pub t: f64,
    /// The function value at `t`.
    pub z: f64,
}

/// The [`SAMPLE_COUNT`] samples of one equation over one duration.
///
/// Sequences are never mutated; a new selection produces a new sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    samples: Vec<Sample>,
}

/// Evaluates `kind` at [`SAMPLE_COUNT`] evenly spaced points over `[0, duration]`.
///
/// The first sample is at `t = 0`, the last at exactly `t = duration`.
pub fn sample(kind: EquationKind, duration: f64) -> Sequence {
    debug_assert!(duration > 0.0, "duration must be positive");
    let last = (SAMPLE_COUNT - 1) as f64;

    let samples = (0..SAMPLE_COUNT)
        .map(|i| {
            let t = i as f64 / last * duration;
            Sample {
                t,
                z: kind.evaluate(t),
            }
        })
        .collect();

    Sequence { samples }
}

impl Sequence {
    /// Writes the sequence as a JSON array of `{"t": .., "z": ..}` records.
    pub fn write_json<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        serde_json::to_writer(writer, self).context("failed to write chart data as JSON")
    }

    /// Writes the sequence as CSV with a `t,z` header.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        let mut write_rows = || -> std::io::Result<()> {
            writeln!(writer, "t,z")?;
            for Sample { t, z } in &self.samples {
                writeln!(writer, "{t},{z}")?;
            }
            writer.flush()
        };
        write_rows().context("failed to write chart data as CSV")
    }
}

impl Deref for Sequence {
    type Target = [Sample];

    fn deref(&self) -> &Self::Target {
        &self.samples
    }
}
