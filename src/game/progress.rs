#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    One,
    Two,
    Three,
}

impl Level {
    pub fn number(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }

    /// Hearts needed to finish the level.
    pub fn target(self) -> usize {
        match self {
            Level::One => 10,
            Level::Two => 12,
            Level::Three => 13,
        }
    }

    pub fn jump_power(self) -> f64 {
        match self {
            Level::One => -22.0,
            Level::Two => -26.0,
            Level::Three => -30.0,
        }
    }

    pub fn next(self) -> Option<Level> {
        match self {
            Level::One => Some(Level::Two),
            Level::Two => Some(Level::Three),
            Level::Three => None,
        }
    }

    fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    level: Level,
    collected: usize,
    completed: [bool; 3],
}

impl Progress {
    pub fn new() -> Self {
        Progress {
            level: Level::One,
            collected: 0,
            completed: [false; 3],
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn target(&self) -> usize {
        self.level.target()
    }

    pub fn remaining(&self) -> usize {
        self.target() - self.collected
    }

    pub fn is_completed(&self, level: Level) -> bool {
        self.completed[level.index()]
    }

    /// Counts one heart. Returns false once the level's target is reached.
    pub fn collect(&mut self) -> bool {
        if self.collected >= self.target() {
            return false;
        }
        self.collected += 1;
        debug_assert!(self.collected <= self.target());
        true
    }

    /// Fires once per level, on the first call after the target is reached.
    pub fn claim_completion(&mut self) -> bool {
        let index = self.level.index();
        if self.collected == self.target() && !self.completed[index] {
            self.completed[index] = true;
            true
        } else {
            false
        }
    }

    /// Moves to the next level with an empty count. The last level stays put.
    pub fn advance(&mut self) {
        debug_assert!(self.is_completed(self.level));
        if let Some(next) = self.level.next() {
            self.level = next;
            self.collected = 0;
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}
