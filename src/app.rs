use crate::config::{ensure_settings_file, load_settings, project_paths, Args, Command, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_command, Command as Key, Scene};
use crate::render::{
    canvas_to_cells, draw_center_box, draw_hud, draw_jail, draw_jail_ascii, paint_backdrop,
    Area, Hud, Pixel, SceneMap, Terminal, HELP_TEXT,
};
use crate::session::Session;
use crate::sim::{day_key, Action};
use crate::storage::Store;
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::cmp::{max, min};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn today() -> String {
    day_key(&Local::now())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

pub(crate) struct App {
    settings: Settings,
    settings_path: PathBuf,
    session: Session,
    rng: StdRng,
    term: Terminal,
    scene: Scene,
    should_quit: bool,
    started: Instant,
}

impl App {
    fn init(args: &Args) -> Result<Self> {
        let paths = project_paths(args.save.as_deref())?;
        let settings = load_settings(&paths.settings_path).with_overrides(args);
        let session = Session::new(Store::new(&paths.save_path), settings.message_ms);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            settings_path: paths.settings_path,
            session,
            rng: make_rng(args.seed),
            term,
            scene: Scene::Main,
            should_quit: false,
            started: Instant::now(),
        })
    }

    fn run(&mut self) -> Result<()> {
        let fps = self.settings.fps_cap;
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let tick_every = Duration::from_secs(self.settings.tick_secs);

        // one frame of the loading screen, then the real record
        self.render_frame()?;
        self.session.boot(now_ms())?;
        let mut next_tick = Instant::now() + tick_every;

        while !self.should_quit {
            let frame_start = Instant::now();
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_event_to_command(self.scene, &ev) {
                    self.handle(cmd)?;
                }
                if self.should_quit {
                    break;
                }
            }

            if Instant::now() >= next_tick {
                self.session.tick(now_ms())?;
                next_tick = Instant::now() + tick_every;
            }
            self.session.expire_message(now_ms());

            self.render_frame()?;
            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    fn handle(&mut self, cmd: Key) -> Result<()> {
        match cmd {
            Key::Quit => self.should_quit = true,
            Key::HelpToggle => {
                self.scene = match self.scene {
                    Scene::Help => Scene::Main,
                    Scene::Main => Scene::Help,
                };
            }
            Key::Back => self.scene = Scene::Main,
            Key::Act(action) => {
                if self.scene == Scene::Main {
                    self.session
                        .act(action, now_ms(), &today(), &mut self.rng)?;
                }
            }
        }
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let color = self.settings.enable_color;
        self.term.cur.clear(Color::Black);

        let cols = self.term.cols;
        let rows = self.term.rows;
        let panel_w = min(max(30, cols / 3), cols.saturating_sub(10));
        let area = Area {
            x: panel_w,
            y: 0,
            w: cols - panel_w,
            // bottom row is the key hint
            h: rows.saturating_sub(1),
        };
        let map = SceneMap::fit(area.subpixels());
        let phase = self.started.elapsed().as_millis() as u64;
        let mood = self.session.mood();

        if self.session.record().is_some() {
            if color {
                paint_backdrop(&mut self.term.cur, area, &map);
            }
            if self.settings.enable_braille {
                self.term.canvas.clear(Pixel::CLEAR);
                draw_jail(&mut self.term.canvas, &map, mood, phase);
                canvas_to_cells(&self.term.canvas, &mut self.term.cur, area, color);
            } else {
                draw_jail_ascii(&mut self.term.cur, area, &map, mood, phase, color);
            }
        }

        let now = now_ms();
        draw_hud(
            &mut self.term.cur,
            &Hud {
                record: self.session.record(),
                mood,
                message: self.session.message(now),
                scene: self.scene,
                enable_color: color,
                panel_w,
            },
        );

        if self.scene == Scene::Help {
            draw_center_box(&mut self.term.cur, "How to play", HELP_TEXT);
        }

        self.term.present()
    }
}

fn play(args: &Args) -> Result<()> {
    let mut app = App::init(args)?;
    let outcome = app.run();
    // restore the terminal even when the loop failed
    let restored = app.term.end();
    outcome?;
    restored?;
    ensure_settings_file(&app.settings_path).context("could not write settings file")?;
    tracing::info!("jail closed");
    Ok(())
}

/// One action (or none) against the slot, reported as a single JSON line.
fn headless<W: Write>(
    out: &mut W,
    store: Store,
    action: Option<Action>,
    now_ms: i64,
    today: &str,
    seed: Option<u64>,
) -> Result<()> {
    let path = store.path().to_path_buf();
    let mut session = Session::new(store, Settings::default().message_ms);
    session
        .boot(now_ms)
        .with_context(|| format!("could not persist {}", path.display()))?;

    let message = match action {
        Some(a) => session.act(a, now_ms, today, &mut make_rng(seed))?,
        None => None,
    };
    let report = json!({
        "record": session.record(),
        "mood": session.mood(),
        "message": message,
    });
    writeln!(out, "{report}")?;
    Ok(())
}

fn headless_cli(args: &Args, action: Option<Action>) -> Result<()> {
    let paths = project_paths(args.save.as_deref())?;
    let stdout = io::stdout();
    headless(
        &mut stdout.lock(),
        Store::new(paths.save_path),
        action,
        now_ms(),
        &today(),
        args.seed,
    )
}

pub(crate) fn run(args: Args) -> Result<()> {
    match args.command.unwrap_or(Command::Play) {
        Command::Play => play(&args),
        Command::Status => headless_cli(&args, None),
        Command::Feed => headless_cli(&args, Some(Action::Feed)),
        Command::Bribe => headless_cli(&args, Some(Action::Bribe)),
        Command::Escape => headless_cli(&args, Some(Action::Escape)),
    }
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
