use crate::equation::EquationKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default log filter when `RUST_LOG` is not set.
pub const LOG_LEVEL: &str = "info";

/// Number of samples in every sequence, regardless of duration.
pub const SAMPLE_COUNT: usize = 400;

/// Frequency of the generator before the first scheduled change, in Hertz.
pub const CARRIER_HZ: f32 = 440.0;

/// Fixed level of the gain stage between generator and output.
pub const GAIN: f32 = 0.5;

/// Frequency produced for a value of zero, in Hertz.
pub const BASE_HZ: f64 = 110.0;

/// Hertz added per unit of `|z|`.
pub const HZ_PER_UNIT: f64 = 140.0;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_DURATION_SECS: u32 = 5;
pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 10;

#[derive(Parser)]
#[command(author, version, about = "Listen to elementary functions", long_about = None)]
pub struct Cli {
    /// Output sample rate in Hertz
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_SAMPLE_RATE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub sample_rate: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the sampled sequence for a chart
    Sample {
        #[command(flatten)]
        selection: Selection,
        #[arg(short, long, value_enum, default_value_t = ChartFormat::Json)]
        format: ChartFormat,
    },
    /// Play the tone on the default output device (Ctrl-C stops early)
    Play {
        #[command(flatten)]
        selection: Selection,
    },
    /// Render the tone into a 16-bit mono WAV file
    Render {
        #[command(flatten)]
        selection: Selection,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render the tone offline and report the dominant frequency over time
    Analyze {
        #[command(flatten)]
        selection: Selection,
        /// Number of frames to report
        #[arg(long, default_value_t = 20)]
        frames: usize,
    },
    /// Pick equations and durations from a menu and play them
    Console,
}

/// The user's choice of equation and duration.
#[derive(Args, Clone, Copy, Debug)]
pub struct Selection {
    /// Sine, Cosine, Tangent, Exponential, Logarithm, "Square Root", Quadratic or Cubic
    #[arg(short, long, default_value = "Sine", value_parser = parse_equation)]
    pub equation: EquationKind,

    /// Duration in whole seconds
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DURATION_SECS,
        value_parser = clap::value_parser!(u32).range(MIN_DURATION_SECS as i64..=MAX_DURATION_SECS as i64)
    )]
    pub duration: u32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            equation: EquationKind::default(),
            duration: DEFAULT_DURATION_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChartFormat {
    Json,
    Csv,
}

fn parse_equation(label: &str) -> Result<EquationKind, String> {
    Ok(EquationKind::parse(label).unwrap_or_else(|| {
        let fallback = EquationKind::default();
        tracing::warn!("unknown equation {label:?}, falling back to {fallback}");
        fallback
    }))
}

/// Checks a duration typed into the console.
pub fn validate_duration(duration: &u32) -> Result<(), String> {
    if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(duration) {
        Ok(())
    } else {
        Err(format!(
            "duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds"
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn duration_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["equation-tone", "play", "--duration", "0"]).is_err());
        assert!(Cli::try_parse_from(["equation-tone", "play", "--duration", "11"]).is_err());
        assert!(validate_duration(&0).is_err());
        assert!(validate_duration(&10).is_ok());
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        assert!(Cli::try_parse_from(["equation-tone", "--sample-rate", "0", "play"]).is_err());
        let args = ["equation-tone", "render", "-o", "a.wav", "--sample-rate", "0"];
        assert!(Cli::try_parse_from(args).is_err());
        let cli = Cli::try_parse_from(["equation-tone", "--sample-rate", "1", "play"]).unwrap();
        assert_eq!(cli.sample_rate, 1);
    }

    #[test]
    fn selection_defaults() {
        let cli = Cli::try_parse_from(["equation-tone", "play"]).unwrap();
        let Commands::Play { selection } = cli.command else {
            panic!("expected play");
        };
        assert_eq!(selection.equation, EquationKind::Sine);
        assert_eq!(selection.duration, DEFAULT_DURATION_SECS);
        assert_eq!(cli.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn unknown_equation_falls_back_to_sine() {
        let cli =
            Cli::try_parse_from(["equation-tone", "sample", "-e", "Gamma", "-d", "3"]).unwrap();
        let Commands::Sample { selection, format } = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(selection.equation, EquationKind::Sine);
        assert_eq!(selection.duration, 3);
        assert_eq!(format, ChartFormat::Json);
    }

    #[test]
    fn spaced_label_is_accepted() {
        let cli = Cli::try_parse_from(["equation-tone", "render", "-e", "square root", "-o", "a.wav"])
            .unwrap();
        let Commands::Render { selection, output } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(selection.equation, EquationKind::SquareRoot);
        assert_eq!(output, PathBuf::from("a.wav"));
    }
}
