//! The closing night scene: he walks in with a rose, lanterns rise, and a message
//! types itself out before the last choice.

use std::f64::consts::PI;

use rand::Rng;

use crate::engine::{Binding, Point, Rect, Renderer, UiEvent};

use super::Viewport;

const BOY_START_OFFSET: f64 = 450.0;
const BOY_STOP_OFFSET: f64 = 50.0;
const BOY_SPEED: f64 = 2.0;

const GIFT_FRAMES: u32 = 120;
const AMBIENT_FRAMES: u32 = 600;
const TYPE_INTERVAL: u32 = 3;

const STAR_COUNT: usize = 180;
const STAR_PARALLAX: f64 = 0.2;
const MAX_LANTERNS: usize = 220;
const LANTERNS_PER_FRAME: usize = 3;
const LANTERN_FADE: f64 = 0.0008;

pub const MESSAGE: &str = "Out of every world I could wander through,\nI would still run to you.\nHappy Valentine's Day ❤️";
const CLOSING: &str = "Forever yours ❤️";

const END_CHOICE_MARKUP: &str = r#"<div class="finale">
  <h2>Stay with me?</h2>
  <button id="forever">Forever ❤️</button>
  <button id="replay">Play again</button>
</div>"#;
const END_CHOICE_BINDINGS: [Binding; 2] = [Binding::Click("forever"), Binding::Click("replay")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalePhase {
    WalkIn,
    Gift { since: u32 },
    Ambient { since: u32 },
    Reveal { since: u32 },
}

/// Side effects the cinematic asks of its host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    StartMusic,
    OfferChoice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ending {
    Forever,
    Replay,
}

pub struct EndChoice;

impl EndChoice {
    pub fn markup() -> &'static str {
        END_CHOICE_MARKUP
    }

    pub fn bindings() -> &'static [Binding] {
        &END_CHOICE_BINDINGS
    }

    pub fn ending(event: &UiEvent) -> Option<Ending> {
        match event {
            UiEvent::Clicked(button) if button == "forever" => Some(Ending::Forever),
            UiEvent::Clicked(button) if button == "replay" => Some(Ending::Replay),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Boy {
    x: f64,
}

impl Boy {
    /// Returns true once he stands next to her.
    fn walk_towards(&mut self, girl_x: f64) -> bool {
        if self.x > girl_x + BOY_STOP_OFFSET {
            self.x = (self.x - BOY_SPEED).max(girl_x + BOY_STOP_OFFSET);
        }
        self.x <= girl_x + BOY_STOP_OFFSET
    }

    fn draw(&self, renderer: &Renderer, camera_x: f64, ground_y: f64) {
        renderer.translated(Point::new(self.x - camera_x, ground_y), |renderer| {
            let rect = Rect::new_from_x_y;
            renderer.fill_rect(&rect(-6.0, -8.0, 4.0, 8.0), "#111");
            renderer.fill_rect(&rect(2.0, -8.0, 4.0, 8.0), "#111");
            renderer.fill_rect(&rect(-8.0, -2.0, 8.0, 4.0), "#333");
            renderer.fill_rect(&rect(0.0, -2.0, 8.0, 4.0), "#333");

            renderer.fill_rect(&rect(-10.0, -32.0, 20.0, 22.0), "#1b1b1b");
            renderer.fill_heart(Point::new(0.0, -24.0), 3.0, 3.0, "#ff3b7a");

            renderer.stroke_segments(
                &[
                    (Point::new(-10.0, -26.0), Point::new(-18.0, -18.0)),
                    (Point::new(10.0, -26.0), Point::new(18.0, -20.0)),
                ],
                "#1b1b1b",
                3.0,
            );

            // the rose
            renderer.fill_circle(Point::new(20.0, -22.0), 4.0, "red");
            renderer.stroke_segments(
                &[(Point::new(18.0, -20.0), Point::new(24.0, -12.0))],
                "green",
                2.0,
            );

            renderer.fill_rect(&rect(-8.0, -48.0, 16.0, 16.0), "#ffddb3");
            renderer.fill_rect(&rect(-8.0, -52.0, 16.0, 6.0), "#2b1b0a");
            renderer.fill_rect(&rect(-4.0, -44.0, 2.0, 2.0), "#000");
            renderer.fill_rect(&rect(2.0, -44.0, 2.0, 2.0), "#000");
            renderer.fill_rect(&rect(-1.0, -41.0, 2.0, 2.0), "#000");
            renderer.stroke_segments(
                &[(Point::new(-3.0, -38.0), Point::new(3.0, -38.0))],
                "#000",
                1.0,
            );
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Star {
    position: Point,
    radius: f64,
    twinkle: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct Lantern {
    position: Point,
    velocity_y: f64,
    sway: f64,
    sway_speed: f64,
    size: f64,
    glow: f64,
    alpha: f64,
    depth: f64,
}

impl Lantern {
    fn new(girl_x: f64, ground_y: f64, rng: &mut impl Rng) -> Self {
        Lantern {
            position: Point::new(
                girl_x - 500.0 + rng.gen_range(0.0..1000.0),
                ground_y + 20.0 + rng.gen_range(0.0..40.0),
            ),
            velocity_y: rng.gen_range(0.4..1.0),
            sway: rng.gen_range(0.0..2.0 * PI),
            sway_speed: rng.gen_range(0.01..0.03),
            size: rng.gen_range(6.0..12.0),
            glow: rng.gen_range(0.6..1.0),
            alpha: 1.0,
            depth: rng.gen_range(0.6..1.2),
        }
    }

    fn update(&mut self) {
        self.position.y -= self.velocity_y * self.depth;
        self.sway += self.sway_speed;
        self.position.x += self.sway.sin() * 0.2;
        self.alpha -= LANTERN_FADE;
    }

    fn draw(&self, renderer: &Renderer, camera_x: f64) {
        let center = Point::new(self.position.x - camera_x * self.depth, self.position.y);
        renderer.with_alpha(self.alpha * 0.6 * self.glow, |renderer| {
            renderer.fill_circle(center, self.size * 2.5, "rgba(255,180,80,0.4)");
        });
        renderer.with_alpha(self.alpha, |renderer| {
            renderer.fill_ellipse(center, self.size, self.size * 1.3, "rgb(255,200,120)");
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cinematic {
    timer: u32,
    phase: FinalePhase,
    boy: Boy,
    stars: Vec<Star>,
    lanterns: Vec<Lantern>,
    lanterns_spawned: usize,
    typed: usize,
    choice_offered: bool,
}

impl Cinematic {
    pub fn new(girl_x: f64, viewport: &Viewport, rng: &mut impl Rng) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                position: Point::new(
                    rng.gen::<f64>() * viewport.world_width,
                    rng.gen::<f64>() * viewport.height * 0.6,
                ),
                radius: rng.gen_range(0.2..2.0),
                twinkle: rng.gen_range(0.0..2.0 * PI),
            })
            .collect();
        Cinematic {
            timer: 0,
            phase: FinalePhase::WalkIn,
            boy: Boy {
                x: girl_x + BOY_START_OFFSET,
            },
            stars,
            lanterns: vec![],
            lanterns_spawned: 0,
            typed: 0,
            choice_offered: false,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> FinalePhase {
        self.phase
    }

    #[cfg(test)]
    pub fn typed(&self) -> usize {
        self.typed
    }

    pub fn message_len() -> usize {
        MESSAGE.chars().count()
    }

    pub fn typed_text(&self) -> &'static str {
        match MESSAGE.char_indices().nth(self.typed) {
            Some((end, _)) => &MESSAGE[..end],
            None => MESSAGE,
        }
    }

    pub fn update(&mut self, girl_x: f64, viewport: &Viewport, rng: &mut impl Rng) -> Option<Cue> {
        self.timer += 1;
        self.stars.iter_mut().for_each(|star| star.twinkle += 0.02);

        let cue = match self.phase {
            FinalePhase::WalkIn => {
                if self.boy.walk_towards(girl_x) {
                    self.phase = FinalePhase::Gift { since: self.timer };
                }
                None
            }
            FinalePhase::Gift { since } => {
                if self.timer - since >= GIFT_FRAMES {
                    self.phase = FinalePhase::Ambient { since: self.timer };
                    Some(Cue::StartMusic)
                } else {
                    None
                }
            }
            FinalePhase::Ambient { since } => {
                if self.timer - since >= AMBIENT_FRAMES {
                    self.phase = FinalePhase::Reveal { since: self.timer };
                }
                None
            }
            FinalePhase::Reveal { since } => self.type_message(self.timer - since),
        };

        if matches!(
            self.phase,
            FinalePhase::Ambient { .. } | FinalePhase::Reveal { .. }
        ) {
            let ground_y = viewport.ground_y();
            let batch = LANTERNS_PER_FRAME.min(MAX_LANTERNS - self.lanterns_spawned);
            for _ in 0..batch {
                self.lanterns.push(Lantern::new(girl_x, ground_y, rng));
            }
            self.lanterns_spawned += batch;
        }
        self.lanterns.iter_mut().for_each(Lantern::update);
        self.lanterns.retain(|lantern| lantern.alpha > 0.0);

        cue
    }

    fn type_message(&mut self, elapsed: u32) -> Option<Cue> {
        let length = Cinematic::message_len();
        let reached = ((elapsed / TYPE_INTERVAL) as usize).min(length);
        self.typed = self.typed.max(reached);
        debug_assert!(self.typed <= length);

        if self.typed == length && !self.choice_offered {
            self.choice_offered = true;
            Some(Cue::OfferChoice)
        } else {
            None
        }
    }

    pub fn draw_sky(&self, renderer: &Renderer, viewport: &Viewport, camera_x: f64) {
        renderer.fill_vertical_gradient(
            &Rect::new_from_x_y(0.0, 0.0, viewport.width, viewport.height),
            &[(0.0, "#020111"), (0.5, "#050b2e"), (1.0, "#0b1b3f")],
        );
        self.stars.iter().for_each(|star| {
            let twinkle = star.twinkle.sin() * 0.5 + 0.5;
            renderer.with_alpha(0.4 + twinkle * 0.6, |renderer| {
                renderer.fill_circle(
                    Point::new(star.position.x - camera_x * STAR_PARALLAX, star.position.y),
                    star.radius,
                    "#fff",
                );
            });
        });
    }

    pub fn draw_actors(&self, renderer: &Renderer, camera_x: f64, ground_y: f64) {
        if matches!(self.phase, FinalePhase::WalkIn | FinalePhase::Gift { .. }) {
            self.boy.draw(renderer, camera_x, ground_y);
        }
        self.lanterns
            .iter()
            .for_each(|lantern| lantern.draw(renderer, camera_x));
    }

    pub fn draw_message(&self, renderer: &Renderer, viewport: &Viewport) {
        self.typed_text()
            .lines()
            .enumerate()
            .for_each(|(row, line)| {
                renderer.text(
                    line,
                    Point::new(viewport.width / 2.0, viewport.height * 0.25 + row as f64 * 36.0),
                    "28px Georgia",
                    "#ffe9f0",
                );
            });
    }

    pub fn draw_closing(&self, renderer: &Renderer, viewport: &Viewport) {
        renderer.text(
            CLOSING,
            Point::new(viewport.width / 2.0, viewport.height * 0.25),
            "bold 34px Georgia",
            "#ffe9f0",
        );
    }
}
