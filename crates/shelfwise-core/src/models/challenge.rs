use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ShelfError};

/// A yearly (or otherwise named) reading goal, e.g. "Read 24 books in 2024".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingChallenge {
    pub id: String,
    pub name: String,
    pub target: u32,
    #[serde(default)]
    pub current: u32,
    /// `current / target * 100`, two decimals. May exceed 100.
    #[serde(default)]
    pub percentage: f64,
}

impl ReadingChallenge {
    pub fn new(name: impl Into<String>, target: u32) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShelfError::ValidationError("challenge name is empty".into()));
        }
        if target == 0 {
            return Err(ShelfError::ValidationError(
                "challenge target must be at least 1".into(),
            ));
        }
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            name,
            target,
            current: 0,
            percentage: 0.0,
        })
    }

    pub fn set_progress(&mut self, current: u32) {
        self.current = current;
        self.recompute_percentage();
    }

    pub fn recompute_percentage(&mut self) {
        self.percentage = challenge_percentage(self.current, self.target);
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

pub fn challenge_percentage(current: u32, target: u32) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (f64::from(current) / f64::from(target) * 100.0 * 100.0).round() / 100.0
}
