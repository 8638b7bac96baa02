use std::f64::consts::PI;

use rand::Rng;

use crate::engine::{Point, Renderer};

use super::girl::Girl;

const FIRST_HEART: f64 = 500.0;
const HEART_SPACING: f64 = 300.0;
const HOVER_HEIGHT: f64 = 150.0;
const FLOAT_RANGE: f64 = 10.0;
const REACH_X: f64 = 30.0;
const REACH_Y: f64 = 40.0;

const HEART_SIZE: f64 = 16.0;
const GLOW_RADIUS: f64 = 26.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Heart {
    x: f64,
    base_y: f64,
    rot: f64,
    rot_speed: f64,
    float_t: f64,
    shine: f64,
    glow: f64,
}

impl Heart {
    pub fn new(x: f64, base_y: f64, rng: &mut impl Rng) -> Self {
        Heart {
            x,
            base_y,
            rot: rng.gen_range(0.0..2.0 * PI),
            rot_speed: rng.gen_range(0.04..0.06),
            float_t: rng.gen_range(0.0..2.0 * PI),
            shine: rng.gen_range(0.0..2.0 * PI),
            glow: rng.gen_range(0.6..1.0),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.base_y + self.float_t.sin() * FLOAT_RANGE)
    }

    fn update(&mut self) {
        self.rot += self.rot_speed;
        self.float_t += 0.03;
        self.shine += 0.05;
    }

    /// Only a jumping girl can grab a heart, and only when her body overlaps it.
    fn is_reached_by(&self, girl: &Girl) -> bool {
        let heart = self.position();
        let body = girl.center();
        !girl.grounded()
            && (heart.x - body.x).abs() < REACH_X
            && (heart.y - body.y).abs() < REACH_Y
    }

    fn draw(&self, renderer: &Renderer, camera_x: f64) {
        let position = self.position();
        // Squashing the width fakes a coin-style spin.
        let turn = self.rot.cos().abs();
        renderer.translated(Point::new(position.x - camera_x, position.y), |renderer| {
            renderer.with_alpha(0.25 * self.glow, |renderer| {
                renderer.fill_circle(Point::default(), GLOW_RADIUS, "rgb(255,80,120)");
            });
            renderer.with_alpha(0.4, |renderer| {
                renderer.fill_circle(
                    Point::new(-6.0 * turn, -6.0),
                    4.0 + self.shine.sin() * 2.0,
                    "rgba(255,255,255,0.8)",
                );
            });
            renderer.fill_heart(
                Point::new(0.0, 6.0),
                HEART_SIZE * turn,
                HEART_SIZE,
                "#ff2b6d",
            );
        });
    }
}

/// The hearts still waiting to be picked up on the current level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeartField {
    hearts: Vec<Heart>,
}

impl HeartField {
    pub fn spawn(count: usize, ground_y: f64, rng: &mut impl Rng) -> Self {
        let hearts = (0..count)
            .map(|i| {
                Heart::new(
                    FIRST_HEART + i as f64 * HEART_SPACING,
                    ground_y - HOVER_HEIGHT,
                    rng,
                )
            })
            .collect();
        HeartField { hearts }
    }

    #[cfg(test)]
    pub fn from_hearts(hearts: Vec<Heart>) -> Self {
        HeartField { hearts }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.hearts.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.hearts.is_empty()
    }

    pub fn update(&mut self) {
        self.hearts.iter_mut().for_each(Heart::update);
    }

    /// Removes at most `limit` hearts the girl is touching and returns how many
    /// were taken. Each heart is tested once.
    pub fn collect(&mut self, girl: &Girl, limit: usize) -> usize {
        let mut taken = 0;
        self.hearts.retain(|heart| {
            if taken < limit && heart.is_reached_by(girl) {
                taken += 1;
                false
            } else {
                true
            }
        });
        taken
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64) {
        self.hearts
            .iter()
            .for_each(|heart| heart.draw(renderer, camera_x));
    }
}
