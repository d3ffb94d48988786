//! Plays every equation for two seconds on the default output device.

use equation_tone::config::{Selection, DEFAULT_SAMPLE_RATE};
use equation_tone::output::RodioOutput;
use equation_tone::{EquationKind, PlaybackState, Scheduler, Session};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    equation_tone::logging::init_logging();

    let scheduler = Scheduler::new(RodioOutput::new(), DEFAULT_SAMPLE_RATE);
    let mut session = Session::new(scheduler, Selection { equation: EquationKind::Sine, duration: 2 });

    for equation in EquationKind::ALL {
        session.select_equation(equation);
        session.play()?;
        while session.wait(Duration::from_millis(100)) == PlaybackState::Playing {}
    }
    Ok(())
}
