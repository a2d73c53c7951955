mod common;

use common::scene::{agent, engine, straight_road};
use lumen_control::engine::{EngineParams, Lamp};
use lumen_control::{ObjectClass, ObjectTrack};
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn idle_nominal_equals_ambient_base() {
    common::init_logging();
    let params = EngineParams::default();
    for ambient in [0.0, 0.2, 0.5, 0.8, 1.0] {
        let mut eng = engine(straight_road(3, 25.0));
        let report = eng.update_with_report(&[], ambient, 1.0);
        for d in &report.decisions {
            assert_eq!(d.score, 0.0);
            assert!(
                approx_eq(d.nominal_target, params.ambient_base(ambient), 1e-12),
                "ambient={ambient} nominal={}",
                d.nominal_target
            );
        }
    }
}

#[test]
fn first_cycle_with_pedestrian_ramps_to_77_5() {
    common::init_logging();
    let mut eng = engine(vec![Lamp::new("L1", [0.0, 0.0])]);
    let walker = agent(1, ObjectClass::Pedestrian, [0.0, 0.0], [0.0, 0.0]);
    let report = eng.update_with_report(&[walker], 0.5, 1.0);
    let d = &report.decisions[0];

    let expected_nominal = 85.0 + 15.0 * (1.0f64 / 3.0).powf(0.6);
    assert!(approx_eq(d.score, 1.0, 1e-12));
    assert!(approx_eq(d.nominal_target, expected_nominal, 1e-9));
    assert!(approx_eq(d.nominal_target, 92.75, 0.02));
    assert_eq!(d.dominant_class, Some(ObjectClass::Pedestrian));
    assert_eq!(d.command, 77.5);

    let lamp = eng.lamp("L1").unwrap();
    assert_eq!(lamp.brightness, 77.5);
    assert_eq!(lamp.on_since, Some(1.0));
    assert_eq!(lamp.off_since, None);
    assert_eq!(lamp.last_command, 1.0);
}

#[test]
fn demand_decays_along_the_road() {
    let mut eng = engine(straight_road(5, 10.0));
    let walker = agent(1, ObjectClass::Pedestrian, [7.5, 0.0], [0.0, 0.0]);
    let report = eng.update_with_report(&[walker], 0.3, 1.0);
    let scores: Vec<f64> = report.decisions.iter().map(|d| d.score).collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "scores not decreasing: {scores:?}");
    }
    // 40 m is beyond the 32 m pedestrian range.
    assert_eq!(scores[4], 0.0);
    assert_eq!(report.decisions[4].dominant_class, None);
}

#[test]
fn moving_car_lights_the_lamp_ahead() {
    let mut eng = engine(straight_road(3, 10.0));
    // Car horizon is 1.4 s: predicted at y = 14 m.
    let car = agent(5, ObjectClass::Car, [7.5, 0.0], [0.0, 10.0]);
    let report = eng.update_with_report(&[car], 0.5, 1.0);
    let s = |i: usize| report.decisions[i].score;
    assert!(s(1) > s(2) && s(2) > s(0), "{:?}", report.decisions);
}

#[test]
fn non_finite_inputs_stay_in_band() {
    let params = EngineParams::default();
    let mut eng = engine(straight_road(2, 10.0));
    let wild = agent(1, ObjectClass::Truck, [f64::NAN, 3.0], [f64::INFINITY, 0.0]);
    let fast = agent(2, ObjectClass::Pedestrian, [7.5, 0.0], [0.0, 1e9]);
    for (i, ambient) in [f64::NAN, f64::INFINITY, -3.0, 0.4].into_iter().enumerate() {
        let cmds = eng.update(&[wild.clone(), fast.clone()], ambient, 1.0 + i as f64);
        for c in cmds {
            assert!(c.brightness.is_finite());
            assert!(c.brightness >= params.base_min && c.brightness <= params.base_max);
        }
    }
}

#[test]
fn dwell_prevents_early_reversal() {
    common::init_logging();
    let mut eng = engine(vec![Lamp::new("L1", [7.5, 0.0])]);
    let close = agent(1, ObjectClass::Pedestrian, [7.5, 0.0], [0.0, 0.0]);
    let farther = agent(1, ObjectClass::Pedestrian, [7.5, 20.0], [0.0, 0.0]);
    let brightness = |eng: &lumen_control::BrightnessEngine| eng.lamps()[0].brightness;

    // Ramp up from t = 1 until the target is reached.
    for t in 1..=4 {
        eng.update(&[close.clone()], 0.5, t as f64);
    }
    let peak = brightness(&eng);
    assert!(peak > 92.7);
    assert_eq!(eng.lamps()[0].on_since, Some(1.0));

    // Lower demand, same class: the 8 s pedestrian min-on holds the level.
    for t in 5..=8 {
        let report = eng.update_with_report(&[farther.clone()], 0.5, t as f64);
        assert!(report.decisions[0].nominal_target < peak);
        assert_eq!(brightness(&eng), peak, "dimmed at t={t}");
    }
    eng.update(&[farther.clone()], 0.5, 9.0);
    let dimmed = brightness(&eng);
    assert!(dimmed < peak);
    assert_eq!(eng.lamps()[0].off_since, Some(9.0));

    // And the 5 s min-off blocks brightening again.
    for t in 10..=13 {
        eng.update(&[close.clone()], 0.5, t as f64);
        assert_eq!(brightness(&eng), dimmed, "brightened at t={t}");
    }
    eng.update(&[close.clone()], 0.5, 14.0);
    assert!(brightness(&eng) > dimmed);
}

#[test]
fn lamps_without_agents_still_get_commands() {
    let mut eng = engine(straight_road(4, 200.0));
    let walker = agent(1, ObjectClass::Pedestrian, [7.5, 0.0], [0.0, 0.0]);
    let cmds = eng.update(&[walker], 0.0, 1.0);
    let ids: Vec<&str> = cmds.iter().map(|c| c.lamp_id.as_str()).collect();
    assert_eq!(ids, vec!["L1", "L2", "L3", "L4"]);
    // Dark scene, idle lamps sit at the floor.
    assert_eq!(cmds[3].brightness, 70.0);
    assert!(cmds[0].brightness > 70.0);
}

/// One scripted cycle: elapsed simulated time, raw ambient reading, agents.
#[derive(Clone, Debug)]
struct TrafficCycle {
    elapsed: f64,
    ambient: f64,
    tracks: Vec<ObjectTrack>,
}

fn class_strategy() -> impl Strategy<Value = ObjectClass> {
    (0..ObjectClass::ALL.len()).prop_map(|i| ObjectClass::ALL[i])
}

fn track_strategy() -> impl Strategy<Value = (ObjectClass, [f64; 2], [f64; 2], bool)> {
    (
        class_strategy(),
        (-5.0..20.0f64, -20.0..120.0f64),
        (-3.0..3.0f64, -30.0..30.0f64),
        any::<bool>(),
    )
        .prop_map(|(class, (x, y), (vx, vy), emitter)| (class, [x, y], [vx, vy], emitter))
}

fn cycle_strategy() -> impl Strategy<Value = TrafficCycle> {
    (
        0.001..0.6f64,
        // Out-of-range ambient readings must be absorbed.
        -0.5..1.5f64,
        prop::collection::vec(track_strategy(), 0..6),
    )
        .prop_map(|(elapsed, ambient, agents)| TrafficCycle {
            elapsed,
            ambient,
            tracks: agents
                .into_iter()
                .enumerate()
                .map(|(id, (class, pos, vel, emitter))| {
                    agent(id as u64, class, pos, vel).with_bright_emitter(emitter)
                })
                .collect(),
        })
}

proptest! {
    #[test]
    fn rate_limit_and_bounds_hold_under_random_traffic(
        cycles in prop::collection::vec(cycle_strategy(), 1..120)
    ) {
        let params = EngineParams::default();
        let rate = params.rate_limit();
        let mut eng = engine(straight_road(6, 18.0));
        let mut now = 0.0;

        for (i, cycle) in cycles.iter().enumerate() {
            now += cycle.elapsed;
            let before: Vec<(f64, f64)> = eng
                .lamps()
                .iter()
                .map(|l| (l.brightness, l.last_command))
                .collect();
            let commands = eng.update(&cycle.tracks, cycle.ambient, now);
            prop_assert_eq!(commands.len(), 6);

            for ((lamp, cmd), (prev, last)) in eng.lamps().iter().zip(&commands).zip(&before) {
                let elapsed = (now - last).max(1e-3);
                let step = (lamp.brightness - prev).abs();
                prop_assert!(
                    step <= rate * elapsed + 1e-9,
                    "cycle {} lamp {} moved {} in {}s",
                    i,
                    lamp.id,
                    step,
                    elapsed
                );
                prop_assert!(lamp.brightness >= params.base_min && lamp.brightness <= params.base_max);
                prop_assert!(cmd.brightness >= params.base_min && cmd.brightness <= params.base_max);
                prop_assert!(lamp.on_since.is_none() || lamp.off_since.is_none());
            }
        }
    }
}
