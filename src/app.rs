use crate::config::{init_logging, Args, Settings, Variant};
use crate::input::{drain_events, KeyTracker};
use crate::model::{GameState, Rules};
use crate::render::{canvas_to_cells, rasterize, Terminal};
use crate::sim::PickOutcome;
use crate::terrain::{Terrain, TerrainParams};
use crate::view::{render_scene, Viewport};
use anyhow::Context;
use clap::Parser;
use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Longest step the simulation takes in one tick.
const MAX_DT: f64 = 0.1;

/// Everything the loop needs before the terminal is touched.
pub(crate) struct World {
    pub(crate) state: GameState,
    pub(crate) viewport: Viewport,
    pub(crate) show_hud: bool,
}

impl World {
    pub(crate) fn new(variant: Variant, seed: u64) -> anyhow::Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let (params, rules, viewport) = match variant {
            Variant::Full => (TerrainParams::default(), Rules::default(), Viewport::full()),
            Variant::Demo => (
                TerrainParams {
                    flowers: false,
                    ..TerrainParams::default()
                },
                Rules::demo(),
                Viewport::demo(),
            ),
        };
        let terrain =
            Terrain::generate(&params, &mut rng).context("could not build the mountain field")?;
        Ok(Self {
            state: GameState::new(terrain, rules),
            viewport,
            show_hud: variant == Variant::Full,
        })
    }
}

pub(crate) struct App {
    settings: Settings,
    world: World,
    term: Terminal,
    keys: KeyTracker,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("starting {:?} variant with seed {seed}", settings.variant);
        let world = World::new(settings.variant, seed)?;

        let term = Terminal::begin()?;
        let keys = KeyTracker::new(term.key_release);

        Ok(Self {
            settings,
            world,
            term,
            keys,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let tick = self.settings.tick;
        let mut last = Instant::now();

        loop {
            let tick_start = Instant::now();

            if drain_events(&mut self.keys)? {
                self.term.resize_if_needed()?;
            }
            if self.keys.quit_requested() {
                break;
            }

            let now = Instant::now();
            let dt = now.saturating_duration_since(last).as_secs_f64().min(MAX_DT);
            last = now;

            let input = self.keys.snapshot(now);
            let outcome = self.world.state.tick(dt, &input);
            self.log_pick(outcome);

            self.render_frame()?;

            spin_sleep(tick, tick_start);
        }

        self.term.end()?;
        log::info!("quit with score {}", self.world.state.score);
        Ok(())
    }

    fn log_pick(&self, outcome: PickOutcome) {
        let state = &self.world.state;
        match outcome {
            PickOutcome::Matched { mountain, species } => {
                log::info!(
                    "matched {species:?} from mountain {mountain}, score {}/{}",
                    state.score,
                    state.max_score()
                );
                if state.score == state.max_score() {
                    log::info!("every pair matched");
                }
            }
            PickOutcome::Banked {
                mountain,
                slot,
                species,
            } => log::debug!("carrying {species:?} from mountain {mountain} in slot {slot}"),
            PickOutcome::Nothing => {}
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let scene = render_scene(&self.world.state, &self.world.viewport, self.world.show_hud);
        rasterize(&scene, &mut self.term.canvas);
        canvas_to_cells(
            &self.term.canvas,
            &mut self.term.cur,
            self.settings.enable_color,
            Color::Black,
        );
        self.term.present(true)
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let settings = Settings::from(Args::parse());
    init_logging(settings.log_file.as_ref())?;
    let mut app = App::init(settings)?;
    app.run()
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
