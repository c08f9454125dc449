use crate::cli::Args;
use crate::tone::Tone;
use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use simon_core::{Highlights, Phase, Position, StandardPhase, TrialState};
use simon_experiment::{SessionEvent, SessionStateMachine};
use simon_render::BoardRenderer;
use simon_timing::HighPrecisionTimer;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

type Session = SessionStateMachine<StandardPhase, HighPrecisionTimer, Highlights, Tone>;

/// What the last presented frame showed: `None` for an empty screen.
type Shown = Option<Highlights>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<BoardRenderer>,
    session: Session,
    output: PathBuf,
    fullscreen: bool,
    title: String,
    shown: Option<Shown>,

    cursor: Option<PhysicalPosition<f64>>,
    mouse_held: Option<Position>,
    touches: HashMap<u64, Position>,

    results_saved: bool,
    should_exit: bool,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let blocks = args.load_blocks()?;
        let engine = args.engine()?;
        info!(
            practice = blocks.practice.len(),
            main = blocks.main.len(),
            interval_ms = engine.interval_ms,
            blink_ms = engine.blink_ms,
            policy = ?engine.policy,
            "Session configured"
        );

        let timer = HighPrecisionTimer::new();
        let tone = Tone::open(args.mute);
        let session = Session::new(blocks, engine, timer, tone);

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            session,
            output: args.output,
            fullscreen: !args.windowed,
            title: String::new(),
            shown: None,
            cursor: None,
            mouse_held: None,
            touches: HashMap::new(),
            results_saved: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "Press SPACE to start or ESC to exit"
        );

        event_loop.run_app(&mut self)?;

        if !self.results_saved && !self.session.results().is_empty() {
            self.save_results()?;
        }
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut window_attributes = Window::default_attributes().with_title("Simon");
        if self.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .context("no monitor available")?;
            if let Some(rate) = monitor.refresh_rate_millihertz() {
                info!(refresh_hz = rate as f64 / 1000.0, "Monitor selected");
            }
            window_attributes = window_attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
                .with_resizable(false);
        } else {
            window_attributes = window_attributes.with_inner_size(PhysicalSize::new(900, 900));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            "Window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.renderer = Some(BoardRenderer::new(size.width, size.height)?);

        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn visible_board(&self) -> Shown {
        if self.session.current_phase().runs_trials() {
            Some(self.session.current_display().copied().unwrap_or_default())
        } else {
            None
        }
    }

    fn render(&mut self) -> Result<()> {
        let board = self.visible_board();
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        renderer.render_frame(board.as_ref(), pixels.frame_mut())?;
        pixels.render()?;
        self.shown = Some(board);
        Ok(())
    }

    fn update(&mut self) {
        for event in self.session.update() {
            self.session.handle_event(event);
        }

        if self.session.current_phase().is_debrief() && !self.results_saved {
            if let Err(e) = self.save_results() {
                error!("Failed to save results: {e:#}");
                // Don't retry every frame.
                self.results_saved = true;
            }
        }
    }

    fn save_results(&mut self) -> Result<()> {
        let file = File::create(&self.output)
            .with_context(|| format!("cannot create {}", self.output.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self.session.results())
            .with_context(|| format!("cannot write {}", self.output.display()))?;
        self.results_saved = true;

        let summary = self.session.summary();
        info!(
            path = %self.output.display(),
            trials = summary.trials,
            correct = summary.correct,
            "Results saved"
        );
        Ok(())
    }

    fn refresh_title(&mut self) {
        let phase = self.session.current_phase();
        let title = if phase.is_welcome() {
            "Simon - press SPACE to begin".to_string()
        } else if phase.is_debrief() {
            format!("Simon - finished, results in {}", self.output.display())
        } else {
            let block = if phase.is_practice() { "practice" } else { "trial" };
            let (n, total) = self.session.trial_progress().unwrap_or((0, 0));
            match self.session.current_trial_state() {
                None | Some(TrialState::Finished) => {
                    format!("Simon - {block} {n}/{total}: press SPACE for the next sequence")
                }
                Some(TrialState::AwaitingPlayback) => format!("Simon - {block} {n}/{total}: watch"),
                Some(TrialState::Capturing) => format!("Simon - {block} {n}/{total}: repeat"),
            }
        };

        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }

    fn handle_key(&mut self, event: KeyEvent, event_loop: &ActiveEventLoop) {
        if event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state.is_pressed();

        match code {
            KeyCode::Escape if pressed => self.cleanup_and_exit(event_loop),
            KeyCode::Space if pressed => {
                if self.session.current_phase().is_debrief() {
                    self.cleanup_and_exit(event_loop);
                } else {
                    self.session.handle_event(SessionEvent::SpacePressed);
                }
            }
            code => {
                if !self.session.current_phase().allows_input() {
                    return;
                }
                if let Some(position) = key_position(code) {
                    if pressed {
                        self.session.press(position);
                    } else {
                        self.session.release(position);
                    }
                }
            }
        }
    }

    /// Board hit test; nothing is hit while the board is not taking input.
    fn position_at(&self, x: f64, y: f64) -> Option<Position> {
        if !self.session.current_phase().allows_input() {
            return None;
        }
        self.renderer.as_ref()?.layout().hit_test(x as f32, y as f32)
    }

    fn handle_mouse(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                let Some(cursor) = self.cursor else { return };
                if let Some(position) = self.position_at(cursor.x, cursor.y) {
                    self.mouse_held = Some(position);
                    self.session.press(position);
                }
            }
            ElementState::Released => {
                if let Some(position) = self.mouse_held.take() {
                    self.session.release(position);
                }
            }
        }
    }

    fn handle_touch(&mut self, touch: Touch) {
        match touch.phase {
            TouchPhase::Started => {
                if let Some(position) = self.position_at(touch.location.x, touch.location.y) {
                    self.touches.insert(touch.id, position);
                    self.session.press(position);
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if let Some(position) = self.touches.remove(&touch.id) {
                    self.session.release(position);
                }
            }
            TouchPhase::Moved => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!("Failed to resize renderer: {e:#}");
            }
        }
        self.shown = None;
        debug!(width = new_size.width, height = new_size.height, "Display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.session.abort();
        info!(summary = ?self.session.summary(), "Session ended");
        self.should_exit = true;
        event_loop.exit();
    }
}

fn key_position(code: KeyCode) -> Option<Position> {
    match code {
        KeyCode::KeyQ | KeyCode::Digit1 | KeyCode::Numpad7 => Some(Position::TopLeft),
        KeyCode::KeyW | KeyCode::Digit2 | KeyCode::Numpad9 => Some(Position::TopRight),
        KeyCode::KeyA | KeyCode::Digit3 | KeyCode::Numpad1 => Some(Position::BottomLeft),
        KeyCode::KeyS | KeyCode::Digit4 | KeyCode::Numpad3 => Some(Position::BottomRight),
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("Failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("Render failed: {e:#}");
                    self.cleanup_and_exit(event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event, event_loop),
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.handle_mouse(state),
            WindowEvent::Touch(touch) => self.handle_touch(touch),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }

        self.update();
        self.refresh_title();

        if self.shown != Some(self.visible_board()) {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }

        match self.session.next_deadline() {
            Some(deadline) => event_loop
                .set_control_flow(ControlFlow::WaitUntil(self.session.timer.instant_at(deadline))),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        debug!("Application resources cleaned up");
    }
}
