use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nalgebra::{UnitQuaternion, Vector2};
use swing_phase::{
    EngineSettings, Handedness, QuaternionExt, SwingEngine, SwingPhase, SwingSample,
};

const TICK: f64 = 0.01; // 100 Hz update tick

fn sample(yaw_deg: f32, rate: Vector2<f32>, timestamp: f64) -> SwingSample {
    SwingSample::new(
        UnitQuaternion::from_euler_degrees(0.0, 0.0, yaw_deg),
        rate,
        timestamp,
    )
}

fn still(timestamp: f64) -> SwingSample {
    sample(0.0, Vector2::zeros(), timestamp)
}

/// Converge the gate and hold still through the address dwell
fn drive_to_address(engine: &mut SwingEngine, t: &mut f64) {
    // One batch of identical samples fills the convergence window
    let start = *t;
    let batch: Vec<SwingSample> = (0..10).map(|i| still(start + i as f64 * TICK)).collect();
    *t = start + 10.0 * TICK;
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::PreAddress);

    // Hold exactly still until the dwell elapses
    let dwell_end = *t + 2.0 + 2.0 * TICK;
    while *t < dwell_end && engine.phase() != SwingPhase::Address {
        engine.advance(&[still(*t)]);
        *t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Address);
}

/// Take away, decay at the top, and invert into the downswing
fn drive_to_downswing(engine: &mut SwingEngine, t: &mut f64, yaw_sign: f32) {
    // Takeaway: yaw crosses the threshold
    engine.advance(&[sample(yaw_sign * 10.0, Vector2::zeros(), *t)]);
    *t += TICK;
    assert_eq!(engine.phase(), SwingPhase::Backswing);

    // First window: strong rates away from the ball
    for _ in 0..5 {
        let rate = Vector2::new(yaw_sign * 60.0, yaw_sign * 60.0);
        engine.advance(&[sample(yaw_sign * 40.0, rate, *t)]);
        *t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Backswing);

    // Second window: rates decaying toward zero at the top
    for _ in 0..5 {
        let rate = Vector2::new(yaw_sign * 30.0, yaw_sign * 30.0);
        engine.advance(&[sample(yaw_sign * 60.0, rate, *t)]);
        *t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Transition);

    // Third window: rates inverted, accelerating into the downswing
    for _ in 0..5 {
        let rate = Vector2::new(yaw_sign * -40.0, yaw_sign * -40.0);
        engine.advance(&[sample(yaw_sign * 50.0, rate, *t)]);
        *t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Downswing);
}

#[test]
fn test_full_cycle_visits_every_phase_once() {
    let mut engine = SwingEngine::new();
    let visited = Arc::new(Mutex::new(Vec::new()));
    for phase in SwingPhase::ALL {
        let log = visited.clone();
        engine.on_enter(phase, move |snapshot| {
            log.lock().unwrap().push(snapshot.phase);
        });
    }

    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);
    drive_to_downswing(&mut engine, &mut t, 1.0);

    // Downswing sweeps back through the ball in one batch
    let batch: Vec<SwingSample> = [40.0f32, 25.0, 8.0]
        .iter()
        .enumerate()
        .map(|(i, &yaw)| {
            sample(
                yaw,
                Vector2::new(-200.0, -200.0),
                t + i as f64 * 0.0025,
            )
        })
        .collect();
    t += TICK;
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::Impact);

    // Club exits past the ball on the follow-through side
    engine.advance(&[sample(-20.0, Vector2::new(-200.0, -200.0), t)]);
    t += TICK;
    assert_eq!(engine.phase(), SwingPhase::FollowThrough);

    // Post-impact rates decay to rest
    for _ in 0..5 {
        engine.advance(&[sample(-40.0, Vector2::new(-60.0, -60.0), t)]);
        t += TICK;
    }
    for _ in 0..5 {
        engine.advance(&[sample(-45.0, Vector2::new(-30.0, -30.0), t)]);
        t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::End);

    // End loops straight back to Start, firing the synthetic re-entry hook
    engine.advance(&[still(t)]);
    assert_eq!(engine.phase(), SwingPhase::Start);
    assert!(engine.ball_direction().is_none());

    let order = visited.lock().unwrap().clone();
    assert_eq!(
        order,
        vec![
            SwingPhase::PreAddress,
            SwingPhase::Address,
            SwingPhase::Backswing,
            SwingPhase::Transition,
            SwingPhase::Downswing,
            SwingPhase::Impact,
            SwingPhase::FollowThrough,
            SwingPhase::End,
            SwingPhase::Start,
        ]
    );
}

#[test]
fn test_left_handed_cycle_mirrors_right() {
    let settings = EngineSettings {
        handedness: Handedness::Left,
        ..Default::default()
    };
    let mut engine = SwingEngine::with_settings(settings);

    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);
    drive_to_downswing(&mut engine, &mut t, -1.0);

    let batch: Vec<SwingSample> = [-40.0f32, -25.0, -8.0]
        .iter()
        .enumerate()
        .map(|(i, &yaw)| sample(yaw, Vector2::new(200.0, 200.0), t + i as f64 * 0.0025))
        .collect();
    t += TICK;
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::Impact);

    // A left-handed follow-through exits on the positive yaw side
    engine.advance(&[sample(20.0, Vector2::new(200.0, 200.0), t)]);
    assert_eq!(engine.phase(), SwingPhase::FollowThrough);
}

#[test]
fn test_right_handed_ignores_mirrored_takeaway() {
    let mut engine = SwingEngine::new();
    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);

    // Yaw moving the left-handed way never starts a right-handed backswing
    for i in 0..20 {
        engine.advance(&[sample(-(i as f32), Vector2::zeros(), t)]);
        t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Address);
}

#[test]
fn test_waggle_restarts_address_dwell() {
    let mut engine = SwingEngine::new();
    let mut t = 0.0;

    let batch: Vec<SwingSample> = (0..10)
        .map(|i| still(i as f64 * TICK))
        .collect();
    t += 10.0 * TICK;
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::PreAddress);

    // Hold still for half the dwell, then waggle past the motion limit
    let waggle_at = t + 1.0;
    while t < waggle_at {
        engine.advance(&[still(t)]);
        t += TICK;
    }
    engine.advance(&[sample(10.0, Vector2::zeros(), t)]);
    t += TICK;
    assert_eq!(engine.phase(), SwingPhase::PreAddress);

    // Return to address; the dwell must restart from here, so the phase
    // cannot fire at the original schedule
    let original_schedule = waggle_at + 1.0 + 2.0 * TICK;
    let resettled_at = t;
    while t < original_schedule {
        engine.advance(&[still(t)]);
        t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::PreAddress);

    while t < resettled_at + 2.0 + 3.0 * TICK && engine.phase() != SwingPhase::Address {
        engine.advance(&[still(t)]);
        t += TICK;
    }
    assert_eq!(engine.phase(), SwingPhase::Address);
}

#[test]
fn test_impact_uses_first_crossing_sample_in_batch() {
    let mut engine = SwingEngine::new();
    let impact_time = Arc::new(Mutex::new(None));
    let recorded = impact_time.clone();
    engine.on_enter(SwingPhase::Impact, move |snapshot| {
        *recorded.lock().unwrap() = Some(snapshot.timestamp);
    });

    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);
    drive_to_downswing(&mut engine, &mut t, 1.0);

    // Only the middle sample is inside the impact threshold; the later ones
    // have swung wide again
    let expected = t + 2.0 * 0.0025;
    let batch: Vec<SwingSample> = [30.0f32, 20.0, 7.0, 25.0, 40.0]
        .iter()
        .enumerate()
        .map(|(i, &yaw)| sample(yaw, Vector2::new(-200.0, -200.0), t + i as f64 * 0.0025))
        .collect();
    engine.advance(&batch);

    assert_eq!(engine.phase(), SwingPhase::Impact);
    let fired_at = impact_time.lock().unwrap().expect("impact hook fired");
    assert!((fired_at - expected).abs() < 1e-9);
}

#[test]
fn test_no_double_transition_when_batch_satisfies_impact_and_follow_through() {
    let mut engine = SwingEngine::new();
    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);
    drive_to_downswing(&mut engine, &mut t, 1.0);

    // One batch passes through the ball and well beyond it
    let batch: Vec<SwingSample> = [20.0f32, 5.0, -5.0, -25.0]
        .iter()
        .enumerate()
        .map(|(i, &yaw)| sample(yaw, Vector2::new(-200.0, -200.0), t + i as f64 * 0.0025))
        .collect();
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::Impact);

    // The follow-through is only detected on a subsequent tick
    t += TICK;
    engine.advance(&[sample(-25.0, Vector2::new(-200.0, -200.0), t)]);
    assert_eq!(engine.phase(), SwingPhase::FollowThrough);
}

#[test]
fn test_address_and_backswing_timing_scenario() {
    let mut engine = SwingEngine::new();
    let entered_backswing = Arc::new(AtomicUsize::new(0));
    let counter = entered_backswing.clone();
    engine.on_enter(SwingPhase::Backswing, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Converge, then hold exactly constant for 2.001 s
    let batch: Vec<SwingSample> = (0..10)
        .map(|i| still(i as f64 * TICK))
        .collect();
    engine.advance(&batch);
    let dwell_started = 9.0 * TICK;

    for k in 1..=200 {
        engine.advance(&[still(dwell_started + k as f64 * TICK)]);
    }
    // The last sample of the window lands exactly 2.001 s after the dwell
    // began; the address dwell (2.0 s) must have fired within it
    engine.advance(&[still(dwell_started + 2.001)]);
    assert_eq!(engine.phase(), SwingPhase::Address);

    // Ramp yaw from baseline to +10 degrees over 200 ms; the backswing must
    // fire once yaw crosses the +5 degree threshold and not before
    let ramp_started = dwell_started + 2.001;
    let mut crossed_at = None;
    for k in 1..=20 {
        let yaw = k as f32 * 0.5;
        let t = ramp_started + k as f64 * TICK;
        engine.advance(&[sample(yaw, Vector2::new(20.0, 50.0), t)]);
        if engine.phase() == SwingPhase::Backswing && crossed_at.is_none() {
            crossed_at = Some(yaw);
        }
        if crossed_at.is_none() {
            assert!(yaw <= 5.0, "backswing missed the threshold crossing");
        }
    }

    let yaw_at_fire = crossed_at.expect("backswing never fired");
    assert!(yaw_at_fire > 5.0);
    assert!(yaw_at_fire < 6.0, "fired late, at {} degrees", yaw_at_fire);
    assert_eq!(entered_backswing.load(Ordering::SeqCst), 1);
}

#[test]
fn test_abort_mid_swing_allows_clean_restart() {
    let mut engine = SwingEngine::new();
    let mut t = 0.0;
    drive_to_address(&mut engine, &mut t);
    drive_to_downswing(&mut engine, &mut t, 1.0);

    engine.abort();
    assert_eq!(engine.phase(), SwingPhase::Start);
    assert!(!engine.is_converged());
    assert!(engine.ball_direction().is_none());

    // A full fresh session works after the abort
    let mut t2 = t + 1.0;
    drive_to_address(&mut engine, &mut t2);
    drive_to_downswing(&mut engine, &mut t2, 1.0);
    assert_eq!(engine.phase(), SwingPhase::Downswing);
}
