//! Dice Tray headless driver
//!
//! Rolls a set of dice in a simulated tray and prints the settled results.
//!
//! Usage: `dice-tray [--settings <path>] [--seed <n>] [--resolution <geometric|simplified>]
//! [--profile <name>] [die ...]`
//! where each die is an identifier such as `d6`, `d20` or `d100`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dice_tray::consts::SIM_DT;
    use dice_tray::sim::{DiceSession, DieType, RollRequest, Selection};
    use dice_tray::{Profiles, ResolutionProfile, RollHistory, Settings};

    /// Give up on dice that are still moving after this much simulated time
    const MAX_ROLL_SECS: f32 = 60.0;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut settings_path = None;
    let mut seed = None;
    let mut resolution = None;
    let mut profile = None;
    let mut dice = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => settings_path = args.next(),
            "--seed" => seed = args.next().and_then(|s| s.parse::<u64>().ok()),
            "--profile" => profile = args.next(),
            "--resolution" => {
                resolution = args.next().and_then(|s| ResolutionProfile::from_str(&s));
                if resolution.is_none() {
                    log::warn!("Unknown resolution profile, keeping the configured one");
                }
            }
            id => dice.push(DieType::from_id_or_default(id)),
        }
    }

    let mut settings = settings_path
        .map(Settings::load_or_default)
        .unwrap_or_default();
    if let Err(e) = settings.validate() {
        log::warn!("{}; using defaults", e);
        settings = Settings::default();
    }
    if seed.is_some() {
        settings.seed = seed;
    }
    if let Some(resolution) = resolution {
        settings.resolution = resolution;
    }
    if let Some(name) = profile {
        let profiles = Profiles::default();
        if !profiles.apply(&name, &mut settings) {
            log::info!("Known profiles: {}", profiles.names().join(", "));
        }
    }
    if dice.is_empty() {
        dice = vec![DieType::D6, DieType::D6];
    }

    let mut selection = Selection::default();
    for die in dice {
        if !selection.increment(die) {
            log::warn!("Roll is full, skipping {}", die);
        }
    }

    let history = Rc::new(RefCell::new(RollHistory::new()));
    let mut session = DiceSession::new(settings);
    session.subscribe(Box::new(history.clone()));

    let Some(group) = session.request_roll(&RollRequest::new(selection)) else {
        log::warn!("Nothing to roll");
        return;
    };

    let frames = (MAX_ROLL_SECS / SIM_DT) as usize;
    for _ in 0..frames {
        session.advance(SIM_DT);
        if session.rolling_count() == 0 {
            break;
        }
    }
    if session.rolling_count() > 0 {
        log::warn!(
            "{} dice still rolling after {}s",
            session.rolling_count(),
            MAX_ROLL_SECS
        );
    }

    println!("Roll {} (seed {})", group, session.seed());
    let history = history.borrow();
    let mut total = 0;
    for entry in &history.entries {
        println!("  {}", entry.chip_text());
        total += entry.value;
    }
    println!("Total: {}", total);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The wasm build is driven by the host page through the library
}
