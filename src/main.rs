//! Suika Pit entry point
//!
//! Browser: wires DOM input, the fixed-step loop, canvas rendering and the
//! end-of-round modal around a [`Session`]. Native: runs a headless autoplay
//! round and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlImageElement, KeyboardEvent, MouseEvent, TouchEvent};

    use suika_pit::consts::*;
    use suika_pit::persistence::{KeyValueStore, LocalStore, MemoryStore};
    use suika_pit::renderer::CanvasRenderer;
    use suika_pit::sim::{GameEvent, Outcome, Session};
    use suika_pit::{GameConfig, Settings};

    /// Game instance holding all state
    struct Game {
        session: Session,
        renderer: Option<CanvasRenderer>,
        canvas: HtmlCanvasElement,
        accumulator: f32,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        settings: Settings,
    }

    impl Game {
        /// Canvas pixels per CSS pixel (the field is drawn at pit resolution)
        fn field_x(&self, offset_x: f64) -> f32 {
            let client_w = self.canvas.client_width().max(1) as f64;
            (offset_x * self.canvas.width() as f64 / client_w) as f32
        }

        /// Run simulation steps
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                if !self.session.step() {
                    self.accumulator = 0.0;
                    break;
                }
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&self) {
            if let Some(renderer) = &self.renderer {
                renderer.render(&self.session);
            }
        }

        /// Mirror session outcomes into the DOM
        fn apply_outcomes(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            for outcome in self.session.drain_outcomes() {
                match outcome {
                    Outcome::ScoreChanged { score } => {
                        set_text(&document, "#score .num", &score.to_string());
                        set_text(&document, "#gameOverScore", &score.to_string());
                    }
                    Outcome::GameOver {
                        score,
                        high_score,
                        new_high_score,
                    } => {
                        // Draw the final frame before capturing it
                        self.render();
                        if let Some(url) = self.renderer.as_ref().and_then(|r| r.snapshot()) {
                            if let Some(img) = document
                                .get_element_by_id("screenshot")
                                .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
                            {
                                img.set_src(&url);
                            }
                        }
                        set_text(&document, "#gameOverScore", &score.to_string());
                        set_text(&document, "#highScore .num", &high_score.to_string());
                        if let Some(modal) = document.get_element_by_id("gameOverModal") {
                            let _ = modal.set_attribute("class", "modal show");
                        }
                        if new_high_score {
                            log::info!("New high score: {high_score}");
                        }
                    }
                    Outcome::Restarted => {
                        if let Some(modal) = document.get_element_by_id("gameOverModal") {
                            let _ = modal.set_attribute("class", "modal hidden");
                        }
                    }
                    Outcome::HeldSpawned { .. } | Outcome::Dropped { .. } | Outcome::Merged { .. } => {}
                }
            }

            if self.settings.show_fps {
                set_text(&document, "#fps .num", &self.fps.to_string());
            }
        }
    }

    fn set_text(document: &web_sys::Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn open_store() -> Box<dyn KeyValueStore> {
        match LocalStore::open() {
            Some(store) => Box::new(store),
            None => {
                log::warn!("LocalStorage unavailable, scores will not persist");
                Box::new(MemoryStore::default())
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Suika Pit starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let mut store = open_store();
        let config = GameConfig::load(&mut *store);
        let settings = Settings::load(&*store);
        let touch_input = settings.touch_input;

        // The field is drawn 1:1 in pit coordinates; CSS scales it
        canvas.set_width(config.pit_width as u32);
        canvas.set_height(config.pit_height as u32);

        let renderer = match CanvasRenderer::new(canvas.clone(), settings.show_ranks) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                log::error!("Canvas unavailable: {e:?}");
                None
            }
        };

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(config, store, seed);
        set_text(&document, "#highScore .num", &session.high_score().to_string());
        set_text(&document, "#score .num", "0");

        let game = Rc::new(RefCell::new(Game {
            session,
            renderer,
            canvas: canvas.clone(),
            accumulator: 0.0,
            last_time: 0.0,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
            settings,
        }));

        setup_input_handlers(&canvas, game.clone(), touch_input);
        setup_keyboard(game.clone());
        setup_restart_button(game.clone());

        request_animation_frame(game);
        log::info!("Suika Pit running (seed {seed})");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>, touch: bool) {
        // Mouse move - held ball follows x
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let x = g.field_x(event.offset_x() as f64);
                g.session.handle(GameEvent::PointerMove { x });
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up - drop
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let x = g.field_x(event.offset_x() as f64);
                g.session.handle(GameEvent::PointerUp { x });
            });
            let _ = canvas
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if !touch {
            return;
        }

        // Touch equivalents (off by default)
        let touch_x = |canvas: &HtmlCanvasElement, event: &TouchEvent| {
            let touch = event.touches().get(0).or_else(|| event.changed_touches().get(0))?;
            let rect = canvas.get_bounding_client_rect();
            Some(touch.client_x() as f64 - rect.left())
        };

        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(offset) = touch_x(&canvas_clone, &event) {
                    let mut g = game.borrow_mut();
                    let x = g.field_x(offset);
                    g.session.handle(GameEvent::PointerMove { x });
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(offset) = touch_x(&canvas_clone, &event) {
                    let mut g = game.borrow_mut();
                    let x = g.field_x(offset);
                    g.session.handle(GameEvent::PointerUp { x });
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// `F` toggles the FPS counter and persists the preference
    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.code() != "KeyF" {
                return;
            }
            let mut g = game.borrow_mut();
            let shown = g.settings.toggle_fps();
            if !shown {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    set_text(&document, "#fps .num", "-");
                }
            }
            let mut store = open_store();
            g.settings.save(&mut *store);
        });
        let _ = document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.apply_outcomes();
            g.render();
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.session.handle(GameEvent::RestartRequested);
                g.accumulator = 0.0;
                g.apply_outcomes();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Suika Pit (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    autoplay(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drop balls at seeded random positions until the round ends
#[cfg(not(target_arch = "wasm32"))]
fn autoplay(seed: u64) {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use suika_pit::GameConfig;
    use suika_pit::persistence::MemoryStore;
    use suika_pit::sim::{GameEvent, Outcome, Session};

    // Ten minutes of play at 60 Hz
    const MAX_STEPS: u64 = 60 * 60 * 10;
    // Roughly one drop per 0.75 s once a ball is held
    const DROP_EVERY: u64 = 45;

    let config = GameConfig::default();
    let margin = 40.0;
    let (min_x, max_x) = (margin, config.pit_width - margin);
    let mut session = Session::new(config, Box::new(MemoryStore::default()), seed);
    let mut rng = Pcg32::seed_from_u64(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15));

    let mut drops = 0u32;
    let mut merges = 0u32;
    for step in 0..MAX_STEPS {
        if step % DROP_EVERY == 0 && session.held().is_some() {
            let x = rng.random_range(min_x..max_x);
            session.handle(GameEvent::PointerMove { x });
            session.handle(GameEvent::PointerUp { x });
            drops += 1;
        }

        session.step();

        for outcome in session.drain_outcomes() {
            match outcome {
                Outcome::Merged { into, .. } => {
                    merges += 1;
                    log::debug!("step {step}: merged into rank {into}");
                }
                Outcome::GameOver { score, .. } => {
                    log::info!("Game over after {step} steps: {drops} drops, {merges} merges, score {score}");
                }
                _ => {}
            }
        }

        if session.is_over() {
            return;
        }
    }

    log::info!(
        "Step cap reached: {drops} drops, {merges} merges, score {}",
        session.score()
    );
}
