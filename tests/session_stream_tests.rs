use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector2};
use rand::prelude::*;
use rand_pcg::Pcg64;
use swing_phase::{
    FORWARD, GainRequest, QuaternionExt, SwingEngine, SwingPhase, SwingSample, sample_channel,
};

const ODR_DT: f64 = 0.005; // 200 Hz sensor
const TICK: Duration = Duration::from_millis(1);

fn still(yaw_deg: f32, timestamp: f64) -> SwingSample {
    SwingSample::new(
        UnitQuaternion::from_euler_degrees(0.0, 0.0, yaw_deg),
        Vector2::zeros(),
        timestamp,
    )
}

#[test]
fn test_queue_driven_session_reaches_address() {
    let (producer, receiver) = sample_channel(256);
    let mut engine = SwingEngine::new();

    // Sensor at 200 Hz, engine ticking every 4 samples
    let mut t = 0.0;
    while t < 2.4 {
        for _ in 0..4 {
            producer.push(still(0.0, t)).unwrap();
            t += ODR_DT;
        }
        let batch = receiver.recv_batch(TICK).unwrap();
        engine.advance(&batch);
        if engine.phase() == SwingPhase::Address {
            break;
        }
    }

    assert_eq!(engine.phase(), SwingPhase::Address);
    assert!(engine.is_converged());
}

#[test]
fn test_gain_requests_follow_session_lifecycle() {
    let (producer, receiver) = sample_channel(64);
    let mut engine = SwingEngine::new();

    // A fresh engine wants the fast-convergence gain
    assert_eq!(
        engine.take_gain_request(),
        Some(GainRequest::FastConvergence)
    );

    for i in 0..12 {
        producer.push(still(0.0, i as f64 * ODR_DT)).unwrap();
    }
    let batch = receiver.recv_batch(TICK).unwrap();
    engine.advance(&batch);

    // Convergence asks the filter to drop back to the steady-state gain
    assert!(engine.is_converged());
    assert_eq!(engine.take_gain_request(), Some(GainRequest::SteadyState));
    assert_eq!(engine.take_gain_request(), None);
}

#[test]
fn test_convergence_tolerates_sensor_noise() {
    let mut engine = SwingEngine::new();
    let mut rng = Pcg64::seed_from_u64(7);

    // A resting attitude with realistic jitter on every axis
    let mut t = 0.0;
    for _ in 0..40 {
        let noise = |rng: &mut Pcg64| rng.random_range(-0.05f32..0.05);
        let sample = SwingSample::new(
            UnitQuaternion::from_euler_degrees(
                10.0 + noise(&mut rng),
                5.0 + noise(&mut rng),
                20.0 + noise(&mut rng),
            ),
            Vector2::zeros(),
            t,
        );
        engine.advance(&[sample]);
        t += ODR_DT;
        if engine.is_converged() {
            break;
        }
    }

    assert!(engine.is_converged(), "gate rejected benign sensor noise");
}

#[test]
fn test_heading_auto_alignment_cancels_reference_bias() {
    let mut engine = SwingEngine::new();

    // The filter's internal reference is 20 degrees off the world forward
    // axis; every raw sample carries that bias.
    let mut t = 0.0;
    while t < 2.2 && engine.phase() != SwingPhase::Address {
        engine.advance(&[still(20.0, t)]);
        t += ODR_DT;
    }
    assert_eq!(engine.phase(), SwingPhase::Address);

    // The offset computed at convergence cancels the bias, so the captured
    // ball direction lands on the world forward axis.
    let ball = engine.ball_direction().expect("ball direction at address");
    assert!(
        (ball - FORWARD).norm() < 1e-3,
        "heading bias leaked into the ball direction: {:?}",
        ball
    );
    assert!(engine.heading_offset().angle() > 0.3);
}

#[test]
fn test_starved_ticks_do_not_disturb_session() {
    let (producer, receiver) = sample_channel(64);
    let mut engine = SwingEngine::new();

    for i in 0..10 {
        producer.push(still(0.0, i as f64 * ODR_DT)).unwrap();
    }
    let batch = receiver.recv_batch(TICK).unwrap();
    engine.advance(&batch);
    assert_eq!(engine.phase(), SwingPhase::PreAddress);

    // The producer stalls; the engine keeps ticking on empty batches
    for _ in 0..5 {
        let batch = receiver.recv_batch(TICK).unwrap();
        assert!(batch.is_empty());
        engine.advance(&batch);
    }
    assert_eq!(engine.phase(), SwingPhase::PreAddress);
    assert!(engine.is_converged());
}
