use crate::config::validate_duration;
use crate::equation::EquationKind;
use crate::scheduler::{Output, PlaybackState};
use crate::session::Session;
use dialoguer::{Input, Select};

/// Menu-driven presentation: pick an equation and a duration, then play or stop.
///
/// Returns when the user quits; a playing tone is stopped first.
pub fn run<O: Output>(session: &mut Session<O>) -> anyhow::Result<()> {
    loop {
        let toggle = match session.state() {
            PlaybackState::Idle => "Play sound",
            PlaybackState::Playing => "Stop sound",
        };
        let items = [
            toggle.to_string(),
            format!("Equation: {}", session.equation()),
            format!("Duration: {} seconds", session.duration()),
            "Print chart data".to_string(),
            "Quit".to_string(),
        ];

        let choice = Select::new()
            .with_prompt("Equation sound generator")
            .items(&items[..])
            .default(0)
            .interact()?;

        match choice {
            0 => {
                session.toggle()?;
            }
            1 => {
                let labels: Vec<&str> = EquationKind::ALL.iter().map(|kind| kind.label()).collect();
                let current = EquationKind::ALL
                    .iter()
                    .position(|kind| *kind == session.equation())
                    .unwrap_or_default();
                let picked = Select::new()
                    .with_prompt("Equation")
                    .items(&labels[..])
                    .default(current)
                    .interact()?;
                session.select_equation(EquationKind::ALL[picked]);
            }
            2 => {
                let duration = Input::<u32>::new()
                    .with_prompt("Duration in seconds (1-10)")
                    .default(session.duration())
                    .validate_with(validate_duration)
                    .interact_text()?;
                session.select_duration(duration);
            }
            3 => {
                session.sequence().write_csv(std::io::stdout().lock())?;
            }
            _ => {
                session.stop();
                return Ok(());
            }
        }
    }
}
