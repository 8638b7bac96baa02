//! Decorative actors. None of them collide with anything; cats are the only ones
//! that care where the girl is.

use std::f64::consts::PI;

use rand::Rng;

use crate::engine::{Point, Rect, Renderer};

use super::Viewport;

const TREE_COUNT: usize = 30;
const TREE_START: f64 = 300.0;
const TREE_SPACING: f64 = 220.0;
const LEAF_CHANCE: f64 = 0.03;
const LEAF_FALL_SPEED: f64 = 0.6;
const LEAF_FADE: f64 = 0.01;
const LEAF_RADIUS: f64 = 4.0;

const CLOUD_COUNT: usize = 12;
const CLOUD_PARALLAX: f64 = 0.5;
const CLOUD_REACH: f64 = 60.0;

const BIRD_COUNT: usize = 6;
const BIRD_PARALLAX: f64 = 0.8;
const BIRD_WRAP: f64 = 40.0;

const CAT_POSITIONS: [f64; 4] = [600.0, 900.0, 1200.0, 1500.0];
const CAT_COLORS: [&str; 5] = ["#f2c89b", "#d1a679", "#999", "#222", "#f5f5f5"];

#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    position: Point,
    velocity_y: f64,
    alpha: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    x: f64,
    height: f64,
    width: f64,
    sway: f64,
    sway_speed: f64,
    sway_amount: f64,
    crown_radius: f64,
    leaves: Vec<Leaf>,
}

impl Tree {
    pub fn new(x: f64, rng: &mut impl Rng) -> Self {
        Tree {
            x,
            height: rng.gen_range(80.0..130.0),
            width: rng.gen_range(16.0..22.0),
            sway: rng.gen_range(0.0..2.0 * PI),
            sway_speed: rng.gen_range(0.004..0.01),
            sway_amount: rng.gen_range(2.0..6.0),
            crown_radius: rng.gen_range(40.0..60.0),
            leaves: vec![],
        }
    }

    pub fn update(&mut self, ground_y: f64, rng: &mut impl Rng) {
        self.sway += self.sway_speed;

        if rng.gen_bool(LEAF_CHANCE) {
            self.leaves.push(Leaf {
                position: Point::new(self.x + rng.gen_range(-20.0..20.0), ground_y - self.height),
                velocity_y: LEAF_FALL_SPEED,
                alpha: 1.0,
            });
        }

        self.leaves.iter_mut().for_each(|leaf| {
            leaf.position.y += leaf.velocity_y;
            leaf.alpha -= LEAF_FADE;
        });
        self.leaves.retain(|leaf| leaf.alpha > 0.0);
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64, ground_y: f64) {
        let sway_offset = self.sway.sin() * self.sway_amount;
        renderer.translated(
            Point::new(self.x - camera_x + sway_offset, ground_y),
            |renderer| {
                renderer.fill_rect(
                    &Rect::new_from_x_y(-self.width / 2.0, -self.height, self.width, self.height),
                    "#5b3a1e",
                );
                renderer.fill_circle(Point::new(0.0, -self.height), self.crown_radius, "#1f8f3a");
            },
        );

        self.leaves.iter().for_each(|leaf| {
            renderer.with_alpha(leaf.alpha, |renderer| {
                renderer.fill_circle(
                    Point::new(leaf.position.x - camera_x, leaf.position.y),
                    LEAF_RADIUS,
                    "rgb(40,160,80)",
                );
            });
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    position: Point,
    speed: f64,
    scale: f64,
}

impl Cloud {
    pub fn new(viewport: &Viewport, rng: &mut impl Rng) -> Self {
        let highest = (viewport.height * 0.3).max(60.0);
        Cloud {
            position: Point::new(
                rng.gen_range(0.0..viewport.world_width),
                rng.gen_range(30.0..highest),
            ),
            speed: rng.gen_range(0.1..0.4),
            scale: rng.gen_range(0.7..1.4),
        }
    }

    pub fn update(&mut self, world_width: f64) {
        self.position.x += self.speed;
        let reach = CLOUD_REACH * self.scale;
        if self.position.x - reach > world_width {
            self.position.x = -reach;
        }
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64) {
        let s = self.scale;
        renderer.translated(
            Point::new(self.position.x - camera_x * CLOUD_PARALLAX, self.position.y),
            |renderer| {
                renderer.with_alpha(0.85, |renderer| {
                    renderer.fill_circle(Point::new(-30.0 * s, 0.0), 22.0 * s, "#fff");
                    renderer.fill_circle(Point::new(0.0, -12.0 * s), 28.0 * s, "#fff");
                    renderer.fill_circle(Point::new(30.0 * s, 0.0), 22.0 * s, "#fff");
                    renderer.fill_rect(
                        &Rect::new_from_x_y(-30.0 * s, 0.0, 60.0 * s, 22.0 * s),
                        "#fff",
                    );
                });
            },
        );
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bird {
    x: f64,
    base_y: f64,
    speed: f64,
    flap: f64,
    bob: f64,
}

impl Bird {
    pub fn new(viewport: &Viewport, rng: &mut impl Rng) -> Self {
        let lowest = (viewport.height * 0.45).max(100.0);
        Bird {
            x: rng.gen_range(0.0..viewport.world_width),
            base_y: rng.gen_range(60.0..lowest),
            speed: rng.gen_range(0.8..1.8),
            flap: rng.gen_range(0.0..2.0 * PI),
            bob: rng.gen_range(0.0..2.0 * PI),
        }
    }

    pub fn y(&self) -> f64 {
        self.base_y + self.bob.sin() * 6.0
    }

    pub fn update(&mut self, world_width: f64) {
        self.x += self.speed;
        self.flap += 0.25;
        self.bob += 0.03;
        if self.x - BIRD_WRAP > world_width {
            self.x = -BIRD_WRAP;
        }
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64) {
        let wing = -4.0 * self.flap.sin();
        renderer.translated(
            Point::new(self.x - camera_x * BIRD_PARALLAX, self.y()),
            |renderer| {
                renderer.stroke_polyline(
                    &[
                        Point::new(-8.0, wing),
                        Point::new(0.0, 0.0),
                        Point::new(8.0, wing),
                    ],
                    "#333",
                    2.0,
                );
            },
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Playful,
    Lazy,
    Sleepy,
}

impl Mood {
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => Mood::Playful,
            1 => Mood::Lazy,
            _ => Mood::Sleepy,
        }
    }

    /// Fraction of the distance to the girl closed each frame.
    pub fn follow_speed(self) -> f64 {
        match self {
            Mood::Playful => 0.018,
            Mood::Lazy => 0.008,
            Mood::Sleepy => 0.004,
        }
    }

    fn tail_wave(self) -> f64 {
        match self {
            Mood::Playful => 6.0,
            Mood::Lazy | Mood::Sleepy => 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cat {
    x: f64,
    anim: f64,
    tail_anim: f64,
    mood: Mood,
    color: &'static str,
}

impl Cat {
    pub fn new(x: f64, mood: Mood, color: &'static str) -> Self {
        Cat {
            x,
            anim: 0.0,
            tail_anim: 0.0,
            mood,
            color,
        }
    }

    pub fn random(x: f64, rng: &mut impl Rng) -> Self {
        let mood = Mood::random(rng);
        let color = CAT_COLORS[rng.gen_range(0..CAT_COLORS.len())];
        Cat {
            anim: rng.gen_range(0.0..2.0 * PI),
            tail_anim: rng.gen_range(0.0..2.0 * PI),
            ..Cat::new(x, mood, color)
        }
    }

    pub fn update(&mut self, girl_x: f64) {
        self.x += (girl_x - self.x) * self.mood.follow_speed();
        self.anim += 0.12;
        self.tail_anim += 0.2;
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64, ground_y: f64) {
        renderer.translated(Point::new(self.x - camera_x, ground_y), |renderer| {
            let rect = Rect::new_from_x_y;
            renderer.fill_rect(&rect(-16.0, -18.0, 32.0, 12.0), self.color);
            renderer.stroke_segments(
                &[-10.0, 0.0, 10.0].map(|x| (Point::new(x, -18.0), Point::new(x, -6.0))),
                "rgba(0,0,0,0.25)",
                2.0,
            );

            renderer.fill_rect(&rect(-10.0, -32.0, 20.0, 14.0), self.color);
            renderer.fill_polygon(
                &[
                    Point::new(-10.0, -32.0),
                    Point::new(-4.0, -40.0),
                    Point::new(0.0, -32.0),
                ],
                self.color,
            );
            renderer.fill_polygon(
                &[
                    Point::new(10.0, -32.0),
                    Point::new(4.0, -40.0),
                    Point::new(0.0, -32.0),
                ],
                self.color,
            );

            renderer.fill_rect(&rect(-5.0, -28.0, 3.0, 3.0), "#000");
            renderer.fill_rect(&rect(2.0, -28.0, 3.0, 3.0), "#000");
            renderer.fill_rect(&rect(-1.0, -24.0, 2.0, 2.0), "#ff6b6b");

            renderer.stroke_segments(
                &[
                    (Point::new(-1.0, -22.0), Point::new(-4.0, -20.0)),
                    (Point::new(-1.0, -22.0), Point::new(2.0, -20.0)),
                    (Point::new(-8.0, -24.0), Point::new(-18.0, -26.0)),
                    (Point::new(-8.0, -22.0), Point::new(-18.0, -22.0)),
                    (Point::new(8.0, -24.0), Point::new(18.0, -26.0)),
                    (Point::new(8.0, -22.0), Point::new(18.0, -22.0)),
                ],
                "#000",
                1.0,
            );

            // A lazy step: legs lift a little out of phase.
            let step = self.anim.sin();
            [-12.0, -2.0, 6.0, 12.0]
                .iter()
                .enumerate()
                .for_each(|(index, x)| {
                    let lift = if index % 2 == 0 { step } else { -step };
                    renderer.fill_rect(&rect(*x, -6.0 + lift.max(0.0), 4.0, 6.0), self.color);
                });

            let tail: Vec<Point> = std::iter::once(Point::new(16.0, -12.0))
                .chain((0..5u8).map(|i| {
                    let i = f64::from(i);
                    Point::new(
                        16.0 + i * 6.0,
                        -12.0 + (self.tail_anim + i).sin() * self.mood.tail_wave(),
                    )
                }))
                .collect();
            renderer.stroke_polyline(&tail, self.color, 3.0);
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scenery {
    trees: Vec<Tree>,
    clouds: Vec<Cloud>,
    birds: Vec<Bird>,
    cats: Vec<Cat>,
}

impl Scenery {
    pub fn new(viewport: &Viewport, rng: &mut impl Rng) -> Self {
        let trees = (0..TREE_COUNT)
            .map(|i| Tree::new(TREE_START + i as f64 * TREE_SPACING, rng))
            .collect();
        let clouds = (0..CLOUD_COUNT).map(|_| Cloud::new(viewport, rng)).collect();
        let birds = (0..BIRD_COUNT).map(|_| Bird::new(viewport, rng)).collect();
        let cats = CAT_POSITIONS.iter().map(|x| Cat::random(*x, rng)).collect();
        Scenery {
            trees,
            clouds,
            birds,
            cats,
        }
    }

    pub fn update(&mut self, girl_x: f64, viewport: &Viewport, rng: &mut impl Rng) {
        let ground_y = viewport.ground_y();
        self.trees
            .iter_mut()
            .for_each(|tree| tree.update(ground_y, rng));
        self.clouds
            .iter_mut()
            .for_each(|cloud| cloud.update(viewport.world_width));
        self.birds
            .iter_mut()
            .for_each(|bird| bird.update(viewport.world_width));
        self.cats.iter_mut().for_each(|cat| cat.update(girl_x));
    }

    /// Clouds and birds; only drawn under a daytime sky.
    pub fn draw_sky(&self, renderer: &Renderer, camera_x: f64) {
        self.clouds
            .iter()
            .for_each(|cloud| cloud.draw(renderer, camera_x));
        self.birds
            .iter()
            .for_each(|bird| bird.draw(renderer, camera_x));
    }

    pub fn draw_ground_level(&self, renderer: &Renderer, camera_x: f64, ground_y: f64) {
        self.trees
            .iter()
            .for_each(|tree| tree.draw(renderer, camera_x, ground_y));
        self.cats
            .iter()
            .for_each(|cat| cat.draw(renderer, camera_x, ground_y));
    }
}
