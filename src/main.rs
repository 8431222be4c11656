//! World View of a Slime headless driver
//!
//! Plays the bundled levels with a seeded random input script, then runs a
//! small rigid-body scene. Everything interesting goes to the log.
//!
//! Usage: `wvoas [seed] [levels.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::{DVec2, IVec2};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use wvoas::GameContext;
    use wvoas::rigid::{Body, Contact, ContactListener, CollisionHandler, Lines, Mass, Shape};
    use wvoas::sim::{DrawList, GameBackend, Level, LevelEvent, TickInput};

    const LEVELS_JSON: &str = include_str!("../assets/levels.json");
    const DEFAULT_SEED: u64 = 0x5eed;
    /// One minute of frames per level before giving up
    const FRAMES_PER_LEVEL: u32 = 60 * 60;
    const PAUSE_EVERY: u32 = 600;

    pub fn run() -> wvoas::Result<()> {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SEED);
        let ctx = match args.next() {
            Some(path) => GameContext::load(path)?,
            None => GameContext::from_json(LEVELS_JSON)?,
        };

        play_levels(&ctx, seed)?;
        rigid_scene()
    }

    /// Random but sticky inputs: keys are held for a while rather than
    /// flickering every frame
    struct InputScript {
        rng: Pcg32,
        current: TickInput,
    }

    impl InputScript {
        fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed),
                current: TickInput::default(),
            }
        }

        fn next_input(&mut self) -> TickInput {
            let rng = &mut self.rng;
            let held = self.current.jump_pressed || self.current.jump_held;
            let mut input = self.current.clone();
            input.jump_held = held && rng.random_bool(0.9);
            input.jump_pressed = !held && rng.random_bool(0.03);
            if rng.random_bool(0.05) {
                input.move_left = rng.random_bool(0.3);
                input.move_right = !input.move_left && rng.random_bool(0.8);
            }
            if rng.random_bool(0.1) {
                input.window_delta = IVec2::new(rng.random_range(-4..=4), rng.random_range(-3..=3));
            }
            input.skip = rng.random_bool(0.01);
            input.reset = rng.random_bool(0.0005);
            self.current = input.clone();
            input
        }
    }

    fn play_levels(ctx: &GameContext, seed: u64) -> wvoas::Result<()> {
        let mut script = InputScript::new(seed);
        let mut list = DrawList::new();

        for index in 0..ctx.levels.len() {
            let mut game: Box<dyn GameBackend> = Box::new(Level::new(ctx, index, None)?);
            let (mut deaths, mut hits, mut won) = (0u32, 0u32, false);

            for frame in 0..FRAMES_PER_LEVEL {
                if frame % PAUSE_EVERY == PAUSE_EVERY - 1 {
                    if let Some(p) = game.as_pausable() {
                        p.pause();
                    }
                }
                let report = game.update(&script.next_input());
                game.draw(&mut list);
                if let Some(p) = game.as_pausable() {
                    p.resume();
                }

                for event in &report.events {
                    match event {
                        LevelEvent::Died(_) => deaths += 1,
                        LevelEvent::Hit(_) => hits += 1,
                        LevelEvent::Checkpoint(i) => log::info!("Level {index}: checkpoint {i}"),
                        _ => {}
                    }
                }
                if report.won() {
                    log::info!("Level {index}: won after {frame} frames");
                    won = true;
                    break;
                }
            }

            log::info!(
                "Level {index}: {} with {deaths} deaths and {hits} hits ({} draw items)",
                if won { "complete" } else { "gave up" },
                list.len()
            );
            if ctx.is_last(index) {
                log::info!("That was the last level");
            }
        }
        Ok(())
    }

    /// Counts collisions as they happen
    #[derive(Default)]
    struct Tally {
        collisions: u32,
        total_impulse: f64,
    }

    impl ContactListener for Tally {
        fn after_collision(&mut self, contact: &Contact, _bodies: (&Body, &Body), impulse: f64) {
            log::debug!("{} hit {} ({:?}), impulse {impulse:.2}", contact.body1, contact.body2, contact.direction);
            self.collisions += 1;
            self.total_impulse += impulse;
        }
    }

    fn rigid_scene() -> wvoas::Result<()> {
        let bodies = [
            (Shape::rect(-200.0, 100.0, 200.0, 120.0), Body::fixed().with_friction(0.5)),
            (Shape::vertical_line(-150.0, -100.0, 100.0), Body::fixed()),
            (Shape::vertical_line(150.0, -100.0, 100.0), Body::fixed()),
            (
                Shape::rect(-20.0, 0.0, 0.0, 20.0),
                Body::moving(Mass::Finite(1.0), DVec2::new(-7.0, 9.0))
                    .with_elasticity(0.8)
                    .with_friction(0.5),
            ),
            (
                Shape::rect(40.0, 50.0, 70.0, 80.0),
                Body::moving(Mass::Finite(3.0), DVec2::new(5.0, 0.0)).with_elasticity(1.0),
            ),
        ];
        let (mut handler, ids) = CollisionHandler::with_bodies(bodies, Tally::default(), 1e-9)?;

        for _ in 0..120 {
            handler.update();
        }

        for &id in &ids[3..] {
            let bounds = handler.shape(id)?.bounds();
            log::info!("Body {id} ended at {bounds:?} moving {}", handler.body(id)?.vel());
        }
        log::info!(
            "Rigid scene: {} collisions, total impulse {:.2}, {} contacts resting",
            handler.listener.collisions,
            handler.listener.total_impulse,
            handler.touching_contacts().count()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("World View of a Slime (headless) starting...");

    match native::run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // the library is the product on wasm; there is no driver
}
