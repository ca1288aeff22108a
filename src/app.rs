//! Butterfly catching mini-game window.
//!
//! Shows the mirrored camera feed cover-fitted to the window, butterflies on
//! top of it and a crown that follows the reader's head. A click on a
//! butterfly catches it; the round ends after the catch animation.

use crate::{
    capture::{CameraStream, VideoSource},
    config::Config,
    error::{Error, Result},
    face_detection::blazeface::BlazeFaceDetector,
    game::{Butterfly, ButterflyGame, ButterflyVariant, GameSettings},
    overlay::{AnchorPosition, CoordinateMapper, CrownPlacement, FrameSize},
    tracker::{CancelToken, DetectionLoop, LoopStep, OverlaySink},
    utils::{f64_to_i32, f64_to_px_clamp, percent_to_px, px_to_percent},
};
use log::{debug, info, warn};
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector, CV_8UC3},
    highgui::{self, EVENT_LBUTTONDOWN, WINDOW_AUTOSIZE, WND_PROP_VISIBLE},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const WINDOW_TITLE: &str = "Royal Butterfly Garden";

const KEY_ESC: i32 = 27;
const KEY_ENTER: i32 = 13;
const KEY_LF: i32 = 10;
const KEY_SPACE: i32 = 32;

/// Base butterfly wing span in pixels at scale 1.0
const BUTTERFLY_SIZE: f64 = 56.0;

/// How a mini-game round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// A butterfly was caught and the reader claimed the token
    Caught(ButterflyVariant),
    /// The window was closed before anything was caught
    Closed,
    /// The camera could not be opened
    PermissionDenied,
}

/// Overlay sink that keeps the latest crown anchor for drawing
struct CrownSink {
    display: FrameSize,
    alive: bool,
    anchor: Option<AnchorPosition>,
}

impl OverlaySink for CrownSink {
    fn display_size(&self) -> Option<FrameSize> {
        self.alive.then_some(self.display)
    }

    fn apply(&mut self, anchor: Option<AnchorPosition>) {
        self.anchor = anchor;
    }
}

/// The mini-game application
pub struct ButterflyGameApp {
    config: Config,
    source: VideoSource,
}

impl ButterflyGameApp {
    /// Create the mini-game for a video source
    #[must_use]
    pub const fn new(config: Config, source: VideoSource) -> Self {
        Self { config, source }
    }

    /// Run one round until a catch is claimed or the window is closed
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created or drawn
    pub fn run(&mut self) -> Result<GameOutcome> {
        info!("Starting butterfly game");
        highgui::named_window(WINDOW_TITLE, WINDOW_AUTOSIZE)?;

        let outcome = match CameraStream::open(&self.source) {
            Ok(stream) => self.play(stream),
            Err(Error::CameraPermission(reason)) => {
                warn!("Camera unavailable: {}", reason);
                self.show_permission_fallback().map(|()| GameOutcome::PermissionDenied)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = highgui::destroy_window(WINDOW_TITLE) {
            debug!("Failed to destroy window: {}", e);
        }
        outcome
    }

    fn play(&self, stream: CameraStream) -> Result<GameOutcome> {
        let display = FrameSize::new(
            f64::from(self.config.display.window_width),
            f64::from(self.config.display.window_height),
        );
        let mirror = self.config.display.mirror;

        let clicks: Arc<Mutex<Vec<(i32, i32)>>> = Arc::new(Mutex::new(Vec::new()));
        let click_queue = Arc::clone(&clicks);
        highgui::set_mouse_callback(
            WINDOW_TITLE,
            Some(Box::new(move |event: i32, x: i32, y: i32, _flags: i32| {
                if event == EVENT_LBUTTONDOWN {
                    if let Ok(mut queue) = click_queue.lock() {
                        queue.push((x, y));
                    }
                }
            })),
        )?;

        let detection = self.config.face_detection.clone();
        let load_model = move || {
            BlazeFaceDetector::new(
                &detection.model,
                detection.score_threshold,
                detection.iou_threshold,
                detection.max_faces,
            )
        };

        let cancel = CancelToken::new();
        let mut tracker = DetectionLoop::new(stream, load_model, self.config.create_filter()?, mirror, cancel.clone());
        let mut sink = CrownSink {
            display,
            alive: true,
            anchor: None,
        };

        let mut rng = rand::thread_rng();
        let mut game = ButterflyGame::new(GameSettings::from(&self.config.game), &mut rng);
        let frame_budget = Duration::from_secs_f64(1.0 / f64::from(self.config.display.target_fps.max(1)));

        let mut last_frame = Mat::default();
        let started = Instant::now();
        let mut last_tick = started;
        let mut frame_count: u64 = 0;

        let outcome = loop {
            let tick = Instant::now();

            // The window only reports visible once something has been shown
            sink.alive = frame_count == 0 || window_visible();
            match tracker.step(&mut sink) {
                LoopStep::Stopped => break GameOutcome::Closed,
                LoopStep::Continue(Some(frame)) => last_frame = frame,
                LoopStep::Continue(None) => {}
            }

            game.advance(tick.duration_since(last_tick), &mut rng);
            last_tick = tick;

            let pending: Vec<(i32, i32)> = clicks.lock().map(|mut q| q.drain(..).collect()).unwrap_or_default();
            let mut claimed = false;
            for (x, y) in pending {
                if game.is_ended() {
                    claimed = true;
                    continue;
                }
                let px = px_to_percent(x, self.config.display.window_width);
                let py = px_to_percent(y, self.config.display.window_height);
                if let Some(id) = game.tap(px, py, self.config.game.tap_radius) {
                    info!("Caught butterfly {}", id);
                }
            }

            let canvas = self.render(&last_frame, &game, sink.anchor, started.elapsed())?;
            highgui::imshow(WINDOW_TITLE, &canvas)?;

            frame_count += 1;
            if frame_count % 300 == 0 {
                debug!(
                    "{} frames shown, {} processed, model ready: {}",
                    frame_count,
                    tracker.frames_processed(),
                    tracker.model_ready()
                );
            }

            let wait_ms = frame_budget
                .checked_sub(tick.elapsed())
                .map_or(1, |d| i32::try_from(d.as_millis()).unwrap_or(1).max(1));
            let key = highgui::wait_key(wait_ms)?;
            if key == KEY_ESC || key == i32::from(b'q') {
                info!("Exit requested by user");
                break GameOutcome::Closed;
            }
            if game.is_ended() && matches!(key, KEY_ENTER | KEY_LF | KEY_SPACE) {
                claimed = true;
            }

            if claimed {
                if let Some(caught) = game.caught_butterfly() {
                    break GameOutcome::Caught(caught.variant);
                }
            }
        };

        cancel.cancel();
        drop(tracker.into_source());
        info!("Butterfly game finished: {:?}", outcome);
        Ok(outcome)
    }

    /// Compose one window frame
    fn render(&self, frame: &Mat, game: &ButterflyGame, anchor: Option<AnchorPosition>, clock: Duration) -> Result<Mat> {
        let width = self.config.display.window_width;
        let height = self.config.display.window_height;

        let mut canvas = if frame.empty() {
            Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::new(90.0, 40.0, 70.0, 0.0))?
        } else {
            self.cover_fit(frame, width, height)?
        };

        for butterfly in game.butterflies() {
            draw_butterfly(&mut canvas, butterfly, clock, width, height)?;
        }

        if let Some(anchor) = anchor {
            draw_crown(&mut canvas, &CrownPlacement::from_anchor(&anchor))?;
        }

        if game.is_ended() {
            let variant = game.caught_butterfly().map_or(ButterflyVariant::Gold, |b| b.variant);
            draw_success(&mut canvas, variant, width, height)?;
        } else {
            draw_banner(&mut canvas, "Catch a butterfly!", width)?;
        }

        Ok(canvas)
    }

    /// Crop the raw frame to what a cover fit shows, scale it to the window and mirror it
    fn cover_fit(&self, frame: &Mat, width: i32, height: i32) -> Result<Mat> {
        let video = FrameSize::new(f64::from(frame.cols()), f64::from(frame.rows()));
        let display = FrameSize::new(f64::from(width), f64::from(height));
        let mapper = CoordinateMapper::new(video, display, self.config.display.mirror)?;

        let (x, y, w, h) = mapper.visible_region();
        let scale = mapper.scale();
        let crop_x = f64_to_px_clamp(x / scale, 0, frame.cols() - 1);
        let crop_y = f64_to_px_clamp(y / scale, 0, frame.rows() - 1);
        let crop = Rect::new(
            crop_x,
            crop_y,
            f64_to_px_clamp(w / scale, 1, frame.cols() - crop_x),
            f64_to_px_clamp(h / scale, 1, frame.rows() - crop_y),
        );

        let visible = Mat::roi(frame, crop)?.try_clone()?;
        let mut resized = Mat::default();
        imgproc::resize(
            &visible,
            &mut resized,
            Size::new(width, height),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        if self.config.display.mirror {
            let mut mirrored = Mat::default();
            core::flip(&resized, &mut mirrored, 1)?;
            Ok(mirrored)
        } else {
            Ok(resized)
        }
    }

    fn show_permission_fallback(&self) -> Result<()> {
        let width = self.config.display.window_width;
        let height = self.config.display.window_height;
        let mut canvas =
            Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::new(60.0, 20.0, 40.0, 0.0))?;

        put_centered(
            &mut canvas,
            "Oh no! We need your magic camera to find the butterflies!",
            height / 2 - 10,
            width,
            0.7,
            Scalar::new(255.0, 255.0, 255.0, 0.0),
        )?;
        put_centered(
            &mut canvas,
            "Press any key to go back",
            height / 2 + 30,
            width,
            0.6,
            Scalar::new(200.0, 180.0, 255.0, 0.0),
        )?;

        highgui::imshow(WINDOW_TITLE, &canvas)?;
        highgui::wait_key(0)?;
        Ok(())
    }
}

fn window_visible() -> bool {
    highgui::get_window_property(WINDOW_TITLE, WND_PROP_VISIBLE).map_or(false, |v| v >= 1.0)
}

/// Wing colour in BGR
fn variant_color(variant: ButterflyVariant) -> Scalar {
    match variant {
        ButterflyVariant::Purple => Scalar::new(219.0, 112.0, 147.0, 0.0),
        ButterflyVariant::Blue => Scalar::new(250.0, 170.0, 60.0, 0.0),
        ButterflyVariant::Orange => Scalar::new(0.0, 140.0, 255.0, 0.0),
        ButterflyVariant::Green => Scalar::new(90.0, 200.0, 60.0, 0.0),
        ButterflyVariant::Pink => Scalar::new(180.0, 105.0, 255.0, 0.0),
        ButterflyVariant::Gold => Scalar::new(0.0, 215.0, 255.0, 0.0),
    }
}

fn draw_butterfly(canvas: &mut Mat, butterfly: &Butterfly, clock: Duration, width: i32, height: i32) -> Result<()> {
    let center = Point::new(percent_to_px(butterfly.x, width), percent_to_px(butterfly.y, height));
    let grow = if butterfly.caught { 1.5 } else { 1.0 };
    let span = BUTTERFLY_SIZE * butterfly.scale * grow;

    // Wings close and open once per flap period
    let phase = clock.as_secs_f64() / butterfly.flap_speed.max(0.05);
    let open = 0.35f64.mul_add((phase * std::f64::consts::PI).sin().abs(), 0.65);
    let wing = Size::new(f64_to_i32(span * 0.3 * open)?, f64_to_i32(span * 0.2)?);
    let color = variant_color(butterfly.variant);
    let tilt = butterfly.rotation;

    for (dx, angle) in [(-0.25, tilt - 30.0), (0.25, tilt + 30.0)] {
        let wing_center = Point::new(center.x + f64_to_i32(span * dx)?, center.y);
        imgproc::ellipse(canvas, wing_center, wing, angle, 0.0, 360.0, color, -1, LINE_AA, 0)?;
    }

    let half_body = f64_to_i32(span * 0.2)?;
    imgproc::line(
        canvas,
        Point::new(center.x, center.y - half_body),
        Point::new(center.x, center.y + half_body),
        Scalar::new(40.0, 30.0, 30.0, 0.0),
        3,
        LINE_AA,
        0,
    )?;

    if butterfly.caught {
        imgproc::circle(
            canvas,
            center,
            f64_to_i32(span * 0.7)?,
            Scalar::new(0.0, 215.0, 255.0, 0.0),
            2,
            LINE_AA,
            0,
        )?;
    }
    Ok(())
}

fn draw_crown(canvas: &mut Mat, crown: &CrownPlacement) -> Result<()> {
    let mut outline = Vector::<Point>::new();
    for (x, y) in crown.outline() {
        outline.push(Point::new(f64_to_i32(x)?, f64_to_i32(y)?));
    }
    let mut polygons = Vector::<Vector<Point>>::new();
    polygons.push(outline);

    imgproc::fill_poly(
        canvas,
        &polygons,
        Scalar::new(0.0, 200.0, 255.0, 0.0),
        LINE_AA,
        0,
        Point::new(0, 0),
    )?;
    imgproc::polylines(canvas, &polygons, true, Scalar::new(0.0, 140.0, 200.0, 0.0), 2, LINE_AA, 0)?;

    // Jewel on the middle point
    let jewel = Point::new(
        f64_to_i32(crown.left + crown.width / 2.0)?,
        f64_to_i32(crown.top + crown.height * 0.7)?,
    );
    let radius = f64_to_i32((crown.width * 0.06).max(2.0))?;
    imgproc::circle(canvas, jewel, radius, Scalar::new(180.0, 60.0, 230.0, 0.0), -1, LINE_AA, 0)?;
    Ok(())
}

fn draw_banner(canvas: &mut Mat, text: &str, width: i32) -> Result<()> {
    imgproc::rectangle(
        canvas,
        Rect::new(0, 0, width, 48),
        Scalar::new(120.0, 60.0, 150.0, 0.0),
        -1,
        LINE_8,
        0,
    )?;
    put_centered(canvas, text, 32, width, 0.9, Scalar::new(255.0, 255.0, 255.0, 0.0))
}

fn draw_success(canvas: &mut Mat, variant: ButterflyVariant, width: i32, height: i32) -> Result<()> {
    let box_w = (width * 2 / 3).max(200);
    let box_h = 160;
    let modal = Rect::new((width - box_w) / 2, (height - box_h) / 2, box_w, box_h);

    imgproc::rectangle(canvas, modal, Scalar::new(245.0, 235.0, 255.0, 0.0), -1, LINE_8, 0)?;
    imgproc::rectangle(canvas, modal, Scalar::new(180.0, 105.0, 255.0, 0.0), 3, LINE_8, 0)?;

    let ink = Scalar::new(120.0, 40.0, 120.0, 0.0);
    put_centered(canvas, "Yay! You did it!", modal.y + 50, width, 1.0, ink)?;
    put_centered(
        canvas,
        &format!("You caught a {variant} butterfly!"),
        modal.y + 95,
        width,
        0.7,
        ink,
    )?;
    put_centered(canvas, "Press Enter to collect your token", modal.y + 135, width, 0.55, ink)
}

fn put_centered(canvas: &mut Mat, text: &str, baseline_y: i32, width: i32, scale: f64, color: Scalar) -> Result<()> {
    let mut baseline = 0;
    let size = imgproc::get_text_size(text, FONT_HERSHEY_SIMPLEX, scale, 2, &mut baseline)?;
    imgproc::put_text(
        canvas,
        text,
        Point::new(((width - size.width) / 2).max(0), baseline_y),
        FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        2,
        LINE_AA,
        false,
    )?;
    Ok(())
}
