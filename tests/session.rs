//! End-to-end rolls through a seeded session

use std::cell::RefCell;
use std::rc::Rc;

use dice_tray::RollHistory;
use dice_tray::consts::SIM_DT;
use dice_tray::settings::{ResolutionProfile, Settings};
use dice_tray::sim::{
    DiceSession, DieType, ResultSource, RollRequest, RollResult, Selection, ThrowVelocity,
};

fn seeded(seed: u64) -> DiceSession {
    DiceSession::new(Settings {
        seed: Some(seed),
        ..Default::default()
    })
}

fn selection(dice: &[DieType]) -> Selection {
    let mut selection = Selection::default();
    for &die in dice {
        assert!(selection.increment(die));
    }
    selection
}

/// Advance at 60 Hz until every die has a value or `secs` of sim time pass
fn run(session: &mut DiceSession, secs: f32) -> Vec<RollResult> {
    let mut results = Vec::new();
    for _ in 0..(secs / SIM_DT) as usize {
        let published = session.advance(SIM_DT);
        let drained = session.drain_events();
        assert_eq!(published, drained.len());
        results.extend(drained);
        if session.rolling_count() == 0 {
            break;
        }
    }
    results
}

#[test]
fn test_mixed_roll_settles_with_one_result_per_logical_die() {
    let mut session = seeded(1234);
    let history = Rc::new(RefCell::new(RollHistory::new()));
    session.subscribe(Box::new(history.clone()));

    let group = session
        .request_roll(&RollRequest::new(selection(&[
            DieType::D6,
            DieType::D20,
            DieType::Percentile,
        ])))
        .expect("roll accepted");
    // The percentile die is two bodies
    assert_eq!(session.world().body_count(), 4);

    let results = run(&mut session, 60.0);
    assert_eq!(session.rolling_count(), 0, "dice still moving");
    assert_eq!(results.len(), 3, "{results:?}");
    assert!(results.iter().all(|r| r.roll_group == group));

    for die_type in [DieType::D6, DieType::D20, DieType::Percentile] {
        let matching: Vec<_> = results.iter().filter(|r| r.die_type == die_type).collect();
        assert_eq!(matching.len(), 1, "{die_type}");
        assert!((1..=die_type.sides()).contains(&matching[0].value));
    }
    let compound = results
        .iter()
        .filter(|r| matches!(r.source, ResultSource::Compound(_)))
        .count();
    assert_eq!(compound, 1);

    // Sub-dice never report on their own
    assert!(results.iter().all(|r| !r.die_type.is_compound_member()));
    assert_eq!(history.borrow().len(), 3);

    // Settled dice stay in the tray and stay quiet
    assert!(run(&mut session, 5.0).is_empty());
    assert_eq!(session.snapshots().len(), 4);
    assert!(session.snapshots().iter().all(|s| s.settled && s.value.is_some()));
}

#[test]
fn test_dice_stay_inside_the_tray() {
    let mut session = seeded(77);
    let mut sel = Selection::default();
    for _ in 0..20 {
        sel.increment(DieType::D6);
    }
    session.request_roll(&RollRequest::new(sel));
    let tray = session.settings().tray.clone();
    for _ in 0..600 {
        session.advance(SIM_DT);
        for snap in session.snapshots() {
            assert!(snap.position.is_finite());
            assert!(snap.position.x.abs() < tray.half_width() + 0.5, "{snap:?}");
            assert!(snap.position.z.abs() < tray.half_depth() + 0.5, "{snap:?}");
            assert!(snap.position.y > -0.5, "{snap:?}");
        }
    }
}

#[test]
fn test_clear_all_then_nothing_publishes() {
    let mut session = seeded(5);
    session.request_roll(&RollRequest::new(selection(&[DieType::D12, DieType::Percentile])));
    for _ in 0..20 {
        session.advance(SIM_DT);
    }
    assert_eq!(session.clear_all(), 3);
    assert_eq!(session.world().body_count(), 0);
    assert!(session.snapshots().is_empty());
    assert!(run(&mut session, 5.0).is_empty());

    // The tray is usable again afterwards
    session.request_roll(&RollRequest::new(selection(&[DieType::D4])));
    let results = run(&mut session, 30.0);
    assert_eq!(results.len(), 1);
    assert!((1..=4).contains(&results[0].value));
}

#[test]
fn test_same_seed_same_results() {
    let roll = |seed| {
        let mut session = seeded(seed);
        session.request_roll(
            &RollRequest::new(selection(&[DieType::D8, DieType::D10, DieType::Coin]))
                .with_velocity(ThrowVelocity {
                    lateral: 1.0,
                    forward: -6.0,
                }),
        );
        run(&mut session, 60.0)
            .into_iter()
            .map(|r| (r.die_type, r.value))
            .collect::<Vec<_>>()
    };
    let a = roll(99);
    assert_eq!(a.len(), 3);
    assert_eq!(a, roll(99));
}

#[test]
fn test_simplified_profile_still_resolves_everything() {
    let mut session = DiceSession::new(Settings {
        seed: Some(21),
        resolution: ResolutionProfile::Simplified,
        ..Default::default()
    });
    session.request_roll(&RollRequest::new(selection(&[
        DieType::D3,
        DieType::D5,
        DieType::D20,
    ])));
    let results = run(&mut session, 60.0);
    assert_eq!(results.len(), 3);
    for r in results {
        assert!((1..=r.die_type.sides()).contains(&r.value));
    }
}
