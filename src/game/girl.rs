use crate::engine::{KeyState, Point, Rect, Renderer};

use super::Viewport;

const GRAVITY: f64 = 0.9;
const WALKING_SPEED: f64 = 5.0;
const STARTING_POINT: f64 = 150.0;
const ANIMATION_STEP: f64 = 0.15;
const HALF_HEIGHT: f64 = 24.0;

const HAIR: &str = "#5a2d0c";
const SKIN: &str = "#ffddb3";
const DRESS: &str = "#ff4d8d";
const INK: &str = "#000";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl Controls {
    pub fn from_keys(keystate: &KeyState) -> Self {
        Controls {
            left: keystate.is_pressed("ArrowLeft"),
            right: keystate.is_pressed("ArrowRight"),
            jump: keystate.is_pressed("Space") || keystate.is_pressed("ArrowUp"),
        }
    }
}

/// The player character. `position` is where her feet touch the ground.
#[derive(Clone, Debug, PartialEq)]
pub struct Girl {
    position: Point,
    velocity_y: f64,
    grounded: bool,
    anim: f64,
}

impl Girl {
    pub fn new(ground_y: f64) -> Self {
        Girl {
            position: Point::new(STARTING_POINT, ground_y),
            velocity_y: 0.0,
            grounded: true,
            anim: 0.0,
        }
    }

    pub fn reset(girl: Self, ground_y: f64) -> Self {
        Girl {
            anim: girl.anim,
            ..Girl::new(ground_y)
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Middle of the body, used for pickups.
    pub fn center(&self) -> Point {
        Point::new(self.position.x, self.position.y - HALF_HEIGHT)
    }

    #[cfg(test)]
    pub fn velocity_y(&self) -> f64 {
        self.velocity_y
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn update(&mut self, controls: Controls, jump_power: f64, ground_y: f64) {
        if controls.left {
            self.position.x -= WALKING_SPEED;
        }
        if controls.right {
            self.position.x += WALKING_SPEED;
        }

        if controls.jump && self.grounded {
            self.velocity_y = jump_power;
            self.grounded = false;
        }

        self.velocity_y += GRAVITY;
        self.position.y += self.velocity_y;

        if self.position.y >= ground_y {
            self.settle(ground_y);
        }

        self.anim += ANIMATION_STEP;
    }

    /// Puts her back on the ground at rest.
    pub fn settle(&mut self, ground_y: f64) {
        self.position.y = ground_y;
        self.velocity_y = 0.0;
        self.grounded = true;
    }

    pub fn draw(&self, renderer: &Renderer, camera_x: f64) {
        let swing = self.anim.sin();
        renderer.translated(
            Point::new(self.position.x - camera_x, self.position.y),
            |renderer| {
                renderer.fill_rect(&Rect::new_from_x_y(-10.0, -48.0, 20.0, 6.0), HAIR);
                renderer.fill_rect(&Rect::new_from_x_y(-8.0, -42.0, 16.0, 14.0), SKIN);
                renderer.fill_rect(&Rect::new_from_x_y(-4.0, -38.0, 2.0, 2.0), INK);
                renderer.fill_rect(&Rect::new_from_x_y(2.0, -38.0, 2.0, 2.0), INK);
                renderer.fill_rect(&Rect::new_from_x_y(-7.0, -26.0, 14.0, 20.0), DRESS);
                renderer.stroke_segments(
                    &[
                        (Point::new(-7.0, -22.0), Point::new(-14.0, -18.0 + swing * 4.0)),
                        (Point::new(7.0, -22.0), Point::new(14.0, -18.0 - swing * 4.0)),
                    ],
                    INK,
                    1.0,
                );
                renderer.fill_rect(
                    &Rect::new_from_x_y(-6.0, -6.0 + swing * 2.0, 4.0, 8.0),
                    SKIN,
                );
                renderer.fill_rect(
                    &Rect::new_from_x_y(2.0, -6.0 - swing * 2.0, 4.0, 8.0),
                    SKIN,
                );
            },
        );
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    x: f64,
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0.0 }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    /// Centers `target_x` in the viewport without showing anything past the
    /// world's edges.
    pub fn follow(&mut self, target_x: f64, viewport: &Viewport) {
        self.x = (target_x - viewport.width / 2.0)
            .min(viewport.max_camera())
            .max(0.0);
    }
}
