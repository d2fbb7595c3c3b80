use anyhow::Context;
use eframe::egui;
use eframe::egui::{Align2, Color32, FontId, Key, Painter, Pos2, Ui};
use eframe::run_native;
use life::render::paint;
use life::{codec, Hsl, LifeEngine, Options, RenderSurface, Scheduler, SnapshotReader, SurfaceSize};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const WINDOW_WIDTH: f32 = 1280.0;
const WINDOW_HEIGHT: f32 = 720.0;
const BACKGROUND: Color32 = Color32::from_rgb(13, 13, 18);
const OVERLAY_FONT_SIZE: f32 = 25.0;
const HELP_FONT_SIZE: f32 = 20.0;
const TITLE_FADE_START: Duration = Duration::from_secs(2);
const TITLE_FADE: Duration = Duration::from_secs(3);
const HELP_DURATION: Duration = Duration::from_secs(5);
const HELP_TEXT: &str =
    "R      new run\nSpace  pause / resume\nN      single step\nC      copy pattern";

/// Requests from the UI to the step thread.
enum Command {
    Randomize,
    TogglePause,
    SingleStep,
    Resize(SurfaceSize),
}

/// Scheduler state the UI shows, copied out after every command or tick.
#[derive(Debug, Clone, Copy, Default)]
struct Status {
    paused: bool,
    fps: Option<f64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine and cadence, owned by the step thread alone.
struct Simulation {
    engine: LifeEngine,
    scheduler: Scheduler,
    status: Arc<Mutex<Status>>,
}

impl Simulation {
    /// Steps until the UI hangs up. Commands wake the thread early.
    fn run(mut self, commands: Receiver<Command>, ctx: egui::Context) {
        loop {
            match commands.recv_timeout(self.scheduler.delay(Instant::now())) {
                Ok(command) => self.apply(command, &ctx),
                Err(RecvTimeoutError::Timeout) => {
                    if self.scheduler.tick(&mut self.engine, Instant::now()).is_some() {
                        ctx.request_repaint();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
            *lock(&self.status) = Status {
                paused: self.scheduler.is_paused(),
                fps: self.scheduler.frames_per_second(),
            };
        }
    }

    fn apply(&mut self, command: Command, ctx: &egui::Context) {
        match command {
            Command::Randomize => self.engine.reset(),
            Command::TogglePause => self.scheduler.toggle_pause(),
            Command::SingleStep => self.scheduler.single_step(),
            // Takes effect with the next run.
            Command::Resize(size) => {
                if let Err(err) = self.engine.set_surface(size) {
                    log::warn!("ignoring window size: {err}");
                }
            }
        }
        ctx.request_repaint();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let options = load_options(args.next())?;
    let surface = SurfaceSize::new(WINDOW_WIDTH, WINDOW_HEIGHT);
    let mut engine = LifeEngine::new(options.clone(), surface).context("configure engine")?;
    engine.reset();
    if let Some(path) = args.next() {
        load_pattern(&mut engine, &path);
    }

    let frames = engine.subscribe();
    let status = Arc::new(Mutex::new(Status::default()));
    let simulation = Simulation {
        engine,
        scheduler: Scheduler::from_options(&options),
        status: Arc::clone(&status),
    };

    run_native(
        "Colorized Life",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT]),
            ..Default::default()
        },
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let (commands, inbox) = mpsc::channel();
            thread::spawn(move || simulation.run(inbox, ctx));

            Ok(Box::new(GuiOfLife::new(cc, commands, status, frames, options)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("run window: {err}"))
}

fn load_options(path: Option<String>) -> anyhow::Result<Options> {
    let Some(path) = path else {
        return Ok(Options::default());
    };
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("read options from {path}"))?;
    Options::from_json(&text).with_context(|| format!("parse options from {path}"))
}

/// A bad pattern is not fatal: the random grid from the reset stays.
fn load_pattern(engine: &mut LifeEngine, path: &str) {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            if engine.load_pattern(&text).is_err() {
                log::warn!("keeping random grid, {path} does not fit the window");
            }
        }
        Err(err) => log::warn!("cannot read pattern {path}: {err}"),
    }
}

fn to_color32(color: Hsl) -> Color32 {
    let [r, g, b] = color.to_rgb8();
    Color32::from_rgb(r, g, b)
}

/// Draws cells through an egui painter, offset to where the grid area starts.
struct EguiSurface<'a> {
    painter: &'a Painter,
    origin: Pos2,
    size: SurfaceSize,
}

impl RenderSurface for EguiSurface<'_> {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, background: Option<Hsl>) {
        let size = egui::vec2(self.size.width, self.size.height);
        let color = background.map(to_color32).unwrap_or(BACKGROUND);
        self.painter.rect_filled(egui::Rect::from_min_size(self.origin, size), 0.0, color);
    }

    fn fill_rect(&mut self, px: f32, py: f32, size: f32, color: Hsl) {
        let min = self.origin + egui::vec2(px, py);
        let rect = egui::Rect::from_min_size(min, egui::vec2(size, size));
        self.painter.rect_filled(rect, 0.0, to_color32(color));
    }
}

struct GuiOfLife {
    commands: Sender<Command>,
    status: Arc<Mutex<Status>>,
    frames: SnapshotReader,
    options: Options,
    opened: Instant,
    surface: Option<SurfaceSize>,
}

impl GuiOfLife {
    fn new(
        _cc: &eframe::CreationContext<'_>,
        commands: Sender<Command>,
        status: Arc<Mutex<Status>>,
        frames: SnapshotReader,
        options: Options,
    ) -> Self {
        Self {
            commands,
            status,
            frames,
            options,
            opened: Instant::now(),
            surface: None,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::warn!("simulation thread has stopped");
        }
    }

    fn status(&self) -> Status {
        *lock(&self.status)
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (reset, pause, step, copy) = ctx.input(|i| {
            (
                i.key_pressed(Key::R),
                i.key_pressed(Key::Space),
                i.key_pressed(Key::N),
                i.key_pressed(Key::C),
            )
        });
        if reset {
            self.send(Command::Randomize);
        }
        if pause {
            self.send(Command::TogglePause);
        }
        if step {
            self.send(Command::SingleStep);
        }
        if copy {
            ctx.copy_text(codec::encode(&self.frames.latest().grid));
        }
    }

    fn create_grid(&mut self, ui: &mut Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let area = response.rect;
        let size = SurfaceSize::new(area.width(), area.height());
        if self.surface != Some(size) {
            self.surface = Some(size);
            self.send(Command::Resize(size));
        }

        let frame = self.frames.latest();
        let mut surface = EguiSurface {
            painter: &painter,
            origin: area.min,
            size,
        };
        paint(
            &frame.grid,
            &mut surface,
            self.options.cell_pixel_size,
            self.options.off_grid_margin,
            self.options.background_color,
        );

        let age = frame.runtime.started_at.elapsed();
        self.draw_title(&painter, area, &frame.runtime.title(), age);
        self.draw_counters(&painter, area, frame.generation, self.status().fps);
        if self.opened.elapsed() < HELP_DURATION {
            let (anchor, align) = (area.center(), Align2::CENTER_CENTER);
            draw_text_box(&painter, anchor, align, HELP_TEXT, HELP_FONT_SIZE, Color32::WHITE);
        }
    }

    /// Run title along the bottom edge, fading out a few seconds into the run.
    fn draw_title(&self, painter: &Painter, area: egui::Rect, title: &str, age: Duration) {
        if age > TITLE_FADE_START + TITLE_FADE {
            return;
        }
        let alpha = if age > TITLE_FADE_START {
            1.0 - (age - TITLE_FADE_START).as_secs_f32() / TITLE_FADE.as_secs_f32()
        } else {
            1.0
        };
        let color = Color32::WHITE.gamma_multiply(alpha);
        let anchor = area.center_bottom();
        draw_text_box(painter, anchor, Align2::CENTER_BOTTOM, title, OVERLAY_FONT_SIZE, color);
        painter.ctx().request_repaint_after(Duration::from_millis(50));
    }

    fn draw_counters(
        &self,
        painter: &Painter,
        area: egui::Rect,
        generation: u64,
        fps: Option<f64>,
    ) {
        let mut text = generation.to_string();
        if self.options.show_fps {
            if let Some(fps) = fps {
                text = format!("{fps:.0}/s\n{text}");
            }
        }
        let (anchor, align) = (area.left_bottom(), Align2::LEFT_BOTTOM);
        draw_text_box(painter, anchor, align, &text, OVERLAY_FONT_SIZE, Color32::WHITE);
    }
}

/// Monospace text on a black box anchored at `anchor`.
fn draw_text_box(
    painter: &Painter,
    anchor: Pos2,
    align: Align2,
    text: &str,
    size: f32,
    color: Color32,
) {
    let galley = painter.layout_no_wrap(text.to_owned(), FontId::monospace(size), color);
    let rect = align.anchor_size(anchor, galley.size());
    let backdrop = Color32::BLACK.gamma_multiply(color.a() as f32 / 255.0);
    painter.rect_filled(rect.expand(5.0), 0.0, backdrop);
    painter.galley(rect.min, galley, color);
}

impl eframe::App for GuiOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let paused = self.status().paused;
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Game of Life");
                if ui.button("Randomize").clicked() {
                    self.send(Command::Randomize);
                }
                if ui.button(if paused { "Resume" } else { "Pause" }).clicked() {
                    self.send(Command::TogglePause);
                }
                if ui.button("Step").clicked() {
                    self.send(Command::SingleStep);
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.create_grid(ui));
    }
}
