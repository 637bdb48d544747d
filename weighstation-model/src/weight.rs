use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Last reading taken from the scale
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightSample {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub connected: bool,
}

impl WeightSample {
    /// A connected reading. Rejects negative and non-finite values.
    pub fn connected(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(ModelError::InvalidWeight(value));
        }
        Ok(Self {
            value,
            timestamp: Utc::now(),
            connected: true,
        })
    }

    /// Marks a previously good reading as stale after the sensor dropped out.
    pub fn disconnected(self) -> Self {
        Self {
            connected: false,
            ..self
        }
    }

    /// Weight rounded to whole units, as shown on the digital display.
    pub fn display_value(&self) -> i64 {
        self.value.round() as i64
    }
}
