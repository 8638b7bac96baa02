use std::{cell::RefCell, collections::HashSet, f64::consts::PI, rc::Rc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use log::{error, warn};
use rand::{thread_rng, Rng};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlElement, KeyboardEvent};

use crate::{browser, sound};

const DRAW_ERROR: &str = "Drawing is throwing exceptions! Unrecoverable error.";

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
}

const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// A backgrounded tab delivers one huge frame when it comes back.
const MAX_FRAME_TIME: f64 = 250.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };

        let renderer = Renderer {
            context: browser::context()?,
        };

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();

        let mut keystate = KeyState::new();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            process_input(&mut keystate, &mut keyevent_receiver);

            let frame_time = (perf - game_loop.last_frame).min(MAX_FRAME_TIME);
            game_loop.accumulated_delta += frame_time as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&keystate);
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    error!("Game loop stopped {:#?}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(position: Point, width: f64, height: f64) -> Self {
        Rect {
            position,
            width,
            height,
        }
    }

    pub const fn new_from_x_y(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(Point { x, y }, width, height)
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn bottom(&self) -> f64 {
        self.y() + self.height
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width, rect.height);
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context
            .fill_rect(rect.x(), rect.y(), rect.width, rect.height);
    }

    pub fn fill_circle(&self, center: Point, radius: f64, color: &str) {
        self.fill_ellipse(center, radius, radius, color);
    }

    pub fn fill_ellipse(&self, center: Point, radius_x: f64, radius_y: f64, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        self.context
            .ellipse(
                center.x,
                center.y,
                radius_x.max(0.0),
                radius_y.max(0.0),
                0.0,
                0.0,
                2.0 * PI,
            )
            .expect(DRAW_ERROR);
        self.context.fill();
    }

    /// Two mirrored bezier lobes meeting at `top` and pointing down to
    /// `top.y + 2 * height`. A narrow `width` reads as a heart turned edge-on.
    pub fn fill_heart(&self, top: Point, width: f64, height: f64, color: &str) {
        let Point { x, y } = top;
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        self.context.move_to(x, y);
        self.context.bezier_curve_to(
            x - width,
            y - height,
            x - width * 2.0,
            y + height / 2.0,
            x,
            y + height * 2.0,
        );
        self.context.bezier_curve_to(
            x + width * 2.0,
            y + height / 2.0,
            x + width,
            y - height,
            x,
            y,
        );
        self.context.fill();
    }

    pub fn fill_polygon(&self, points: &[Point], color: &str) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        rest.iter()
            .for_each(|point| self.context.line_to(point.x, point.y));
        self.context.close_path();
        self.context.fill();
    }

    pub fn stroke_segments(&self, segments: &[(Point, Point)], color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context.begin_path();
        segments.iter().for_each(|(from, to)| {
            self.context.move_to(from.x, from.y);
            self.context.line_to(to.x, to.y);
        });
        self.context.stroke();
    }

    pub fn stroke_polyline(&self, points: &[Point], color: &str, line_width: f64) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        rest.iter()
            .for_each(|point| self.context.line_to(point.x, point.y));
        self.context.stroke();
    }

    pub fn fill_vertical_gradient(&self, rect: &Rect, stops: &[(f32, &str)]) {
        let gradient = self
            .context
            .create_linear_gradient(0.0, rect.y(), 0.0, rect.bottom());
        stops.iter().for_each(|(offset, color)| {
            gradient.add_color_stop(*offset, color).expect(DRAW_ERROR);
        });
        self.context.set_fill_style_canvas_gradient(&gradient);
        self.context
            .fill_rect(rect.x(), rect.y(), rect.width, rect.height);
    }

    pub fn text(&self, text: &str, position: Point, font: &str, color: &str) {
        self.context.set_font(font);
        self.context.set_text_align("center");
        self.context.set_fill_style_str(color);
        self.context
            .fill_text(text, position.x, position.y)
            .expect(DRAW_ERROR);
    }

    pub fn with_alpha(&self, alpha: f64, draw: impl FnOnce(&Renderer)) {
        let previous = self.context.global_alpha();
        self.context.set_global_alpha(alpha.clamp(0.0, 1.0));
        draw(self);
        self.context.set_global_alpha(previous);
    }

    pub fn translated(&self, origin: Point, draw: impl FnOnce(&Renderer)) {
        self.context.save();
        self.context.translate(origin.x, origin.y).expect(DRAW_ERROR);
        draw(self);
        self.context.restore();
    }
}

enum KeyPress {
    KeyUp(KeyboardEvent),
    KeyDown(KeyboardEvent),
}

fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
    let (keydown_sender, keyevent_receiver) = unbounded();
    let keyup_sender = keydown_sender.clone();

    let onkeydown = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
        let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(keycode));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let onkeyup = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
        let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(keycode));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let window = browser::window()?;
    window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
    onkeydown.forget();
    onkeyup.forget();

    Ok(keyevent_receiver)
}

fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
    loop {
        match keyevent_receiver.try_next() {
            Ok(None) => break,
            Err(_err) => break,
            Ok(Some(evt)) => match evt {
                KeyPress::KeyUp(evt) => state.set_released(&evt.code()),
                KeyPress::KeyDown(evt) => state.set_pressed(&evt.code()),
            },
        };
    }
}

#[derive(Debug, Default)]
pub struct KeyState {
    pressed_keys: HashSet<String>,
}

impl KeyState {
    pub fn new() -> Self {
        KeyState {
            pressed_keys: HashSet::new(),
        }
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.pressed_keys.contains(code)
    }

    pub fn set_pressed(&mut self, code: &str) {
        self.pressed_keys.insert(code.to_owned());
    }

    pub fn set_released(&mut self, code: &str) {
        self.pressed_keys.remove(code);
    }
}

/// A user action reported by the overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Clicked(String),
    Submitted(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Reports `UiEvent::Clicked` with the button id.
    Click(&'static str),
    /// Reports `UiEvent::Submitted` with the input's value when the button is clicked.
    Submit {
        button: &'static str,
        input: &'static str,
    },
}

/// The overlay the scripted sequences talk to.
///
/// `show` replaces whatever was on screen and returns the stream of actions for
/// the new content only; handlers bound by earlier calls are dropped with it.
pub trait Ui {
    fn show(&mut self, markup: &str, bindings: &[Binding]) -> Result<UnboundedReceiver<UiEvent>>;
    fn set_text(&mut self, element_id: &str, text: &str) -> Result<()>;
    /// Moves an element to a random spot inside the box it is positioned in.
    fn dodge(&mut self, element_id: &str) -> Result<()>;
    fn hide(&mut self) -> Result<()>;
}

#[derive(Default)]
pub struct DomUi;

impl DomUi {
    pub fn new() -> Self {
        DomUi
    }
}

impl Ui for DomUi {
    fn show(&mut self, markup: &str, bindings: &[Binding]) -> Result<UnboundedReceiver<UiEvent>> {
        browser::draw_ui(markup)?;
        let (sender, receiver) = unbounded();
        for binding in bindings {
            bind(*binding, sender.clone())?;
        }
        Ok(receiver)
    }

    fn set_text(&mut self, element_id: &str, text: &str) -> Result<()> {
        browser::set_text(element_id, text)
    }

    fn dodge(&mut self, element_id: &str) -> Result<()> {
        let element = browser::find_html_element_by_id(element_id)?;
        let (width, height) = browser::containing_size(&element)?;
        let max_x = (width - element.offset_width() as f64 - 20.0).max(0.0);
        let max_y = (height - element.offset_height() as f64 - 20.0).max(0.0);
        let mut rng = thread_rng();
        let x = rng.gen_range(0.0..=max_x);
        let y = rng.gen_range(0.0..=max_y);

        let style = element.style();
        style
            .set_property("position", "absolute")
            .and_then(|_| style.set_property("left", &format!("{}px", x)))
            .and_then(|_| style.set_property("top", &format!("{}px", y)))
            .map_err(|err| anyhow!("Could not move {} {:#?}", element_id, err))
    }

    fn hide(&mut self) -> Result<()> {
        browser::hide_ui()
    }
}

fn bind(binding: Binding, sender: UnboundedSender<UiEvent>) -> Result<()> {
    match binding {
        Binding::Click(button) => {
            let element = browser::find_html_element_by_id(button)?;
            add_click_handler(element, move || {
                let _ = sender.unbounded_send(UiEvent::Clicked(button.to_owned()));
            });
        }
        Binding::Submit { button, input } => {
            let element = browser::find_html_element_by_id(button)?;
            add_click_handler(element, move || match browser::input_value(input) {
                Ok(value) => {
                    let _ = sender.unbounded_send(UiEvent::Submitted(value));
                }
                Err(err) => warn!("Could not read answer {:#?}", err),
            });
        }
    }
    Ok(())
}

fn add_click_handler(elem: HtmlElement, on_click: impl FnMut() + 'static) {
    let on_click = browser::closure_wrap(Box::new(on_click) as Box<dyn FnMut()>);
    elem.set_onclick(Some(on_click.as_ref().unchecked_ref()));
    on_click.forget();
}

/// Background music for the scripted sequences.
pub trait Soundtrack {
    /// Starts playback; does nothing when already playing.
    fn start(&mut self);
    /// Pauses and rewinds.
    fn stop(&mut self);
}

pub struct Music {
    track: HtmlAudioElement,
    playing: bool,
}

impl Music {
    pub fn new(src: &str, volume: f64) -> Result<Self> {
        Ok(Music {
            track: sound::create_track(src, true, volume)?,
            playing: false,
        })
    }
}

impl Soundtrack for Music {
    fn start(&mut self) {
        if !self.playing {
            sound::play_track(&self.track);
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        if self.playing {
            if let Err(err) = sound::stop_track(&self.track) {
                warn!("Error stopping music {:#?}", err);
            }
            self.playing = false;
        }
    }
}
