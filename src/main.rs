use anyhow::Context;
use clap::Parser;
use equation_tone::analysis::PitchTracker;
use equation_tone::config::{ChartFormat, Cli, Commands, Selection, CARRIER_HZ};
use equation_tone::console;
use equation_tone::logging::init_logging;
use equation_tone::output::{write_wav, OfflineOutput, RodioOutput};
use equation_tone::scheduler::{frequency_schedule, scheduled_frequency_at};
use equation_tone::{PlaybackState, Scheduler, Session};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample { selection, format } => print_chart(selection, format),
        Commands::Play { selection } => play(selection, cli.sample_rate),
        Commands::Render { selection, output } => render(selection, cli.sample_rate, &output),
        Commands::Analyze { selection, frames } => analyze(selection, cli.sample_rate, frames),
        Commands::Console => {
            let scheduler = Scheduler::new(RodioOutput::new(), cli.sample_rate);
            let mut session = Session::new(scheduler, Selection::default());
            console::run(&mut session)
        }
    }
}

fn print_chart(selection: Selection, format: ChartFormat) -> anyhow::Result<()> {
    let sequence = equation_tone::sample(selection.equation, selection.duration as f64);
    let mut stdout = std::io::stdout().lock();
    match format {
        ChartFormat::Json => {
            sequence.write_json(&mut stdout)?;
            writeln!(stdout)?;
        }
        ChartFormat::Csv => sequence.write_csv(&mut stdout)?,
    }
    Ok(())
}

fn play(selection: Selection, sample_rate: u32) -> anyhow::Result<()> {
    let (interrupt_tx, interrupt_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })
    .context("failed to install the Ctrl-C handler")?;

    let scheduler = Scheduler::new(RodioOutput::new(), sample_rate);
    let mut session = Session::new(scheduler, selection);
    session.play()?;

    let total = Duration::from_secs(selection.duration as u64);
    let bar = ProgressBar::new(total.as_millis() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {elapsed}")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    bar.set_message(selection.equation.to_string());

    let started = Instant::now();
    loop {
        if interrupt_rx.try_recv().is_ok() {
            session.stop();
            bar.abandon_with_message("stopped");
            break;
        }
        if session.wait(TICK) == PlaybackState::Idle {
            bar.finish();
            break;
        }
        bar.set_position(started.elapsed().min(total).as_millis() as u64);
    }
    Ok(())
}

/// Plays the selection into an [`OfflineOutput`] and returns the rendered signal.
fn render_offline(
    selection: Selection,
    sample_rate: u32,
) -> anyhow::Result<(Vec<f32>, Session<OfflineOutput>)> {
    let output = OfflineOutput::new();
    let mut session = Session::new(Scheduler::new(output.clone(), sample_rate), selection);
    session.play()?;
    let signal = output.render();
    Ok((signal, session))
}

fn render(selection: Selection, sample_rate: u32, path: &Path) -> anyhow::Result<()> {
    let (signal, _) = render_offline(selection, sample_rate)?;
    write_wav(&signal, sample_rate, path)?;
    tracing::info!(
        equation = %selection.equation,
        samples = signal.len(),
        "wrote {}",
        path.display()
    );
    Ok(())
}

fn analyze(selection: Selection, sample_rate: u32, frames: usize) -> anyhow::Result<()> {
    let (signal, session) = render_offline(selection, sample_rate)?;
    let schedule = frequency_schedule(session.sequence());
    let tracked = PitchTracker::new(sample_rate).track(&signal);
    let stride = (tracked.len() / frames.max(1)).max(1);

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{:>8} {:>14} {:>14}", "t (s)", "heard (Hz)", "scheduled (Hz)")?;
    for frame in tracked.iter().step_by(stride).take(frames) {
        let scheduled = scheduled_frequency_at(&schedule, frame.t).unwrap_or(CARRIER_HZ as f64);
        writeln!(stdout, "{:>8.3} {:>14.1} {:>14.1}", frame.t, frame.hz, scheduled)?;
    }
    Ok(())
}
