use std::f64::consts::PI;

use rand::Rng;

use crate::engine::{Point, Rect, Renderer};

use super::{progress::Level, Viewport};

pub const CELEBRATION_FRAMES: u32 = 240;
const CAT_COLORS: [&str; 5] = ["#f2c89b", "#d1a679", "#999", "#222", "#f5f5f5"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CelebrationKind {
    Hearts,
    Cats,
}

impl CelebrationKind {
    /// The interstitial shown after finishing `level`. The last level ends in the
    /// finale instead.
    pub fn after(level: Level) -> Option<Self> {
        match level {
            Level::One => Some(CelebrationKind::Hearts),
            Level::Two => Some(CelebrationKind::Cats),
            Level::Three => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CelebrationKind::Hearts => "LEVEL 1 COMPLETE ❤️",
            CelebrationKind::Cats => "LEVEL 2 COMPLETE 🐱",
        }
    }

    fn particle_count(self) -> usize {
        match self {
            CelebrationKind::Hearts => 120,
            CelebrationKind::Cats => 70,
        }
    }

    /// How far past the top edge a particle drifts before it re-enters below.
    fn margin(self) -> f64 {
        match self {
            CelebrationKind::Hearts => 50.0,
            CelebrationKind::Cats => 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Confetti {
    position: Point,
    velocity_y: f64,
    spin: f64,
    spin_speed: f64,
    size: f64,
    color: &'static str,
}

impl Confetti {
    fn new(kind: CelebrationKind, viewport: &Viewport, rng: &mut impl Rng) -> Self {
        let position = Point::new(
            rng.gen::<f64>() * viewport.width,
            rng.gen::<f64>() * viewport.height,
        );
        let spin = rng.gen_range(0.0..2.0 * PI);
        match kind {
            CelebrationKind::Hearts => Confetti {
                position,
                velocity_y: rng.gen_range(1.0..3.0),
                spin,
                spin_speed: rng.gen_range(0.08..0.13),
                size: rng.gen_range(10.0..28.0),
                color: "#ff2b6d",
            },
            CelebrationKind::Cats => Confetti {
                position,
                velocity_y: rng.gen_range(0.6..2.2),
                spin,
                spin_speed: 0.08,
                size: rng.gen_range(12.0..28.0),
                color: CAT_COLORS[rng.gen_range(0..CAT_COLORS.len())],
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Celebration {
    kind: CelebrationKind,
    timer: u32,
    particles: Vec<Confetti>,
}

impl Celebration {
    pub fn new(kind: CelebrationKind, viewport: &Viewport, rng: &mut impl Rng) -> Self {
        Celebration {
            kind,
            timer: CELEBRATION_FRAMES,
            particles: (0..kind.particle_count())
                .map(|_| Confetti::new(kind, viewport, rng))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn kind(&self) -> CelebrationKind {
        self.kind
    }

    /// Advances one frame. Returns true once the celebration is over.
    pub fn update(&mut self, viewport: &Viewport, rng: &mut impl Rng) -> bool {
        let margin = self.kind.margin();
        self.particles.iter_mut().for_each(|particle| {
            particle.position.y -= particle.velocity_y;
            particle.spin += particle.spin_speed;
            if particle.position.y < -margin {
                particle.position.y = viewport.height + margin;
                particle.position.x = rng.gen::<f64>() * viewport.width;
            }
        });

        self.timer = self.timer.saturating_sub(1);
        self.timer == 0
    }

    pub fn draw(&self, renderer: &Renderer, viewport: &Viewport) {
        renderer.fill_rect(
            &Rect::new_from_x_y(0.0, 0.0, viewport.width, viewport.height),
            "rgba(0,0,0,0.6)",
        );

        self.particles.iter().for_each(|particle| match self.kind {
            CelebrationKind::Hearts => {
                let width = particle.size * particle.spin.cos().abs();
                renderer.fill_heart(
                    Point::new(particle.position.x, particle.position.y + 4.0),
                    width,
                    particle.size,
                    particle.color,
                );
            }
            CelebrationKind::Cats => {
                let sway = particle.spin.sin() * 4.0;
                renderer.translated(
                    Point::new(particle.position.x + sway, particle.position.y),
                    |renderer| {
                        renderer.fill_rect(&Rect::new_from_x_y(-10.0, -10.0, 20.0, 10.0), particle.color);
                        renderer.fill_rect(&Rect::new_from_x_y(-7.0, -22.0, 14.0, 12.0), particle.color);
                    },
                );
            }
        });

        renderer.text(
            self.kind.title(),
            Point::new(viewport.width / 2.0, viewport.height / 2.0),
            "bold 30px Arial",
            "#fff",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn viewport() -> Viewport {
        Viewport {
            width: 800.0,
            height: 600.0,
            world_width: 6000.0,
        }
    }

    #[test]
    fn celebration_follows_the_finished_level() {
        assert_eq!(CelebrationKind::after(Level::One), Some(CelebrationKind::Hearts));
        assert_eq!(CelebrationKind::after(Level::Two), Some(CelebrationKind::Cats));
        assert_eq!(CelebrationKind::after(Level::Three), None);
    }

    #[test]
    fn runs_for_a_fixed_number_of_frames() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut celebration = Celebration::new(CelebrationKind::Hearts, &viewport(), &mut rng);

        for _ in 1..CELEBRATION_FRAMES {
            assert!(!celebration.update(&viewport(), &mut rng));
        }

        assert!(celebration.update(&viewport(), &mut rng));
        assert_eq!(celebration.timer, 0);
    }

    #[test]
    fn a_collapsed_viewport_still_celebrates() {
        let viewport = Viewport {
            width: 0.0,
            height: 0.0,
            world_width: 6000.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut celebration = Celebration::new(CelebrationKind::Hearts, &viewport, &mut rng);

        for _ in 0..CELEBRATION_FRAMES {
            celebration.update(&viewport, &mut rng);
        }

        assert!(celebration
            .particles
            .iter()
            .all(|particle| particle.position.x == 0.0));
    }

    #[test]
    fn particles_rise_and_reenter_from_below() {
        let viewport = viewport();
        let mut rng = StdRng::seed_from_u64(10);
        let mut celebration = Celebration::new(CelebrationKind::Cats, &viewport, &mut rng);
        assert_eq!(celebration.particles.len(), 70);

        for _ in 0..CELEBRATION_FRAMES {
            celebration.update(&viewport, &mut rng);
            for particle in &celebration.particles {
                assert!(particle.position.y >= -40.0 - 2.2);
                assert!(particle.position.y <= viewport.height + 40.0);
            }
        }
    }
}
