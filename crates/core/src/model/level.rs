use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelError {
    #[error("level must be between {min} and {max}, got {value}")]
    OutOfRange { value: u8, min: u8, max: u8 },
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// Difficulty tier of an exercise, from 1 (beginner) to 5 (expert).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a level, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::OutOfRange` for values outside the supported tiers.
    pub fn new(value: u8) -> Result<Self, LevelError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LevelError::OutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    #[must_use]
    pub fn first() -> Self {
        Self(Self::MIN)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// The tier after this one, or `None` at the top tier.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    /// Iterates every level in ascending order.
    pub fn all() -> impl Iterator<Item = Level> {
        (Self::MIN..=Self::MAX).map(Level)
    }

    fn index(self) -> usize {
        usize::from(self.0 - Self::MIN)
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── LEVEL TABLE ───────────────────────────────────────────────────────────────
//

/// Static description of one tier as shown on the level selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: Level,
    pub name: &'static str,
    pub description: &'static str,
    pub points_required: u32,
}

/// Where a point total sits on the milestone ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilestoneProgress {
    /// Points still missing to reach the next milestone (0 past the last one).
    pub points_to_next: u32,
    /// Progress inside the current milestone band, in percent (0..=100).
    pub percent: f64,
}

/// Unlock thresholds and milestone ladder for all tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    levels: [LevelInfo; 5],
    milestones: Vec<u32>,
}

impl LevelTable {
    /// The tier configuration shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            levels: [
                LevelInfo {
                    level: Level(1),
                    name: "Principiante",
                    description: "Saludos y frases básicas",
                    points_required: 0,
                },
                LevelInfo {
                    level: Level(2),
                    name: "Básico",
                    description: "Verbos y gramática simple",
                    points_required: 500,
                },
                LevelInfo {
                    level: Level(3),
                    name: "Intermedio",
                    description: "Subjuntivo y expresiones",
                    points_required: 1500,
                },
                LevelInfo {
                    level: Level(4),
                    name: "Avanzado",
                    description: "Estructuras complejas",
                    points_required: 3000,
                },
                LevelInfo {
                    level: Level(5),
                    name: "Experto",
                    description: "Dominio del idioma",
                    points_required: 5000,
                },
            ],
            milestones: vec![0, 500, 1500, 3000, 5000, 8000],
        }
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelInfo] {
        &self.levels
    }

    #[must_use]
    pub fn info(&self, level: Level) -> &LevelInfo {
        &self.levels[level.index()]
    }

    #[must_use]
    pub fn points_required(&self, level: Level) -> u32 {
        self.info(level).points_required
    }

    /// A level is selectable once the user's total reaches its threshold.
    #[must_use]
    pub fn is_unlocked(&self, level: Level, total_points: u32) -> bool {
        total_points >= self.points_required(level)
    }

    /// All levels currently selectable for the given point total.
    #[must_use]
    pub fn unlocked_levels(&self, total_points: u32) -> Vec<Level> {
        self.levels
            .iter()
            .filter(|info| total_points >= info.points_required)
            .map(|info| info.level)
            .collect()
    }

    /// Distance to the next milestone and progress inside the current band.
    #[must_use]
    pub fn milestone_progress(&self, total_points: u32) -> MilestoneProgress {
        let next = self
            .milestones
            .iter()
            .position(|&threshold| total_points < threshold);

        match next {
            Some(idx) if idx > 0 => {
                let floor = self.milestones[idx - 1];
                let ceiling = self.milestones[idx];
                let span = f64::from(ceiling - floor);
                let percent = (f64::from(total_points - floor) / span * 100.0).clamp(0.0, 100.0);
                MilestoneProgress {
                    points_to_next: ceiling - total_points,
                    percent,
                }
            }
            // The ladder starts at 0, so only the past-the-end case is left.
            _ => MilestoneProgress {
                points_to_next: 0,
                percent: 100.0,
            },
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
