use equation_tone::analysis::PitchTracker;
use equation_tone::config::{Selection, SAMPLE_COUNT};
use equation_tone::output::OfflineOutput;
use equation_tone::{map_frequency, EquationKind, PlaybackState, Scheduler, Session};
use std::time::Duration;

const RATE: u32 = 44_100;

fn offline_session(equation: EquationKind, duration: u32) -> (Session<OfflineOutput>, OfflineOutput) {
    let output = OfflineOutput::new();
    let scheduler = Scheduler::new(output.clone(), RATE);
    (Session::new(scheduler, Selection { equation, duration }), output)
}

#[test]
fn every_selection_renders_for_its_duration() {
    for equation in EquationKind::ALL {
        let (mut session, output) = offline_session(equation, 1);
        assert_eq!(session.sequence().len(), SAMPLE_COUNT);

        session.play().unwrap();
        let signal = output.render();
        assert_eq!(signal.len(), RATE as usize, "{equation}");
        assert!(signal.iter().all(|s| s.is_finite() && s.abs() <= 0.5));
        assert_eq!(session.wait(Duration::from_millis(10)), PlaybackState::Idle);
    }
}

#[test]
fn sine_peak_is_heard_near_a_quarter_period() {
    let (mut session, output) = offline_session(EquationKind::Sine, 5);
    session.play().unwrap();
    let frames = PitchTracker::new(RATE).track(&output.render());

    let frame = frames
        .iter()
        .min_by(|a, b| {
            let da = (a.t - std::f64::consts::FRAC_PI_2).abs();
            let db = (b.t - std::f64::consts::FRAC_PI_2).abs();
            da.total_cmp(&db)
        })
        .unwrap();
    // sin(t) peaks at 1, which maps to 250 Hz.
    assert!((frame.hz - map_frequency(1.0)).abs() < 6.0, "heard {} Hz", frame.hz);
}

#[test]
fn stop_then_play_again_starts_a_fresh_tone() {
    let (mut session, output) = offline_session(EquationKind::Tangent, 2);
    session.play().unwrap();
    session.stop();
    assert_eq!(session.state(), PlaybackState::Idle);

    session.select_equation(EquationKind::Exponential);
    session.play().unwrap();
    let connected = output.take_connected();
    assert_eq!(connected.len(), 2);

    let mut connected = connected.into_iter();
    assert_eq!(connected.next().unwrap().count(), 0);
    assert_eq!(connected.next().unwrap().count(), 2 * RATE as usize);
    assert_eq!(session.state(), PlaybackState::Idle);
}
