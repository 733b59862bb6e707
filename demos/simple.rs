use std::thread;
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector2};
use swing_phase::{QuaternionExt, SwingEngine, SwingPhase, SwingSample, sample_channel};

const ODR_DT: f64 = 0.005; // 200 Hz sensor
const TICK: Duration = Duration::from_millis(20);

/// Scripted swing standing in for the AHRS fusion filter output
fn swing_script() -> Vec<SwingSample> {
    let mut script = Vec::new();
    let mut push = |yaw: f32, rate: (f32, f32)| {
        let t = script.len() as f64 * ODR_DT;
        script.push(SwingSample::new(
            UnitQuaternion::from_euler_degrees(0.0, 0.0, yaw),
            Vector2::new(rate.0, rate.1),
            t,
        ));
    };

    // Settle and hold at address for the dwell time
    for _ in 0..450 {
        push(0.0, (0.0, 0.0));
    }
    // Backswing, decay at the top, downswing through the ball
    for i in 0..30 {
        push(i as f32 * 2.0, (60.0, 60.0));
    }
    for _ in 0..15 {
        push(60.0, (30.0, 30.0));
    }
    for i in 0..25 {
        push(60.0 - i as f32 * 4.0, (-40.0, -40.0));
    }
    for _ in 0..30 {
        push(-40.0, (-30.0, -30.0));
    }
    script
}

fn main() {
    env_logger::init();

    let (producer, receiver) = sample_channel(256);

    // Sampling task, paced like a real 200 Hz sensor
    let sampler = thread::spawn(move || {
        for (i, sample) in swing_script().into_iter().enumerate() {
            if i % 4 == 0 {
                thread::sleep(TICK);
            }
            if producer.push(sample).is_err() {
                break;
            }
        }
    });

    let mut engine = SwingEngine::new();
    for phase in SwingPhase::ALL {
        engine.on_enter(phase, |snapshot| {
            println!("{:8.3} s  entering {:?}", snapshot.timestamp, snapshot.phase);
        });
    }

    loop {
        let batch = match receiver.recv_batch(TICK) {
            Ok(batch) => batch,
            Err(_) => break, // sampler finished and the queue drained
        };
        engine.advance(&batch);

        // Forward gain requests to the fusion filter
        if let Some(request) = engine.take_gain_request() {
            println!(
                "          filter gain -> {:.1}",
                request.gain(&engine.settings().gate)
            );
        }

        if engine.phase() == SwingPhase::End {
            break;
        }
    }

    sampler.join().unwrap();
}
