use std::f64::consts::PI;
use std::str::FromStr;

use crate::config::ConfigError;

const SIN_STEP: f64 = PI / 10.0;

/// Source of synthetic values for a virtual module
#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    /// Always the same value
    Constant(f64),
    /// Uniformly distributed values in `[min, max]`
    Random { min: f64, max: f64 },
    /// A sine wave sampled in fixed steps and scaled into `[min, max]`
    Sin { min: f64, max: f64, angle: f64 },
}

impl Generator {
    /// Create the generator named by `spec`.
    ///
    /// `spec` is either `random`, `sin` or a numeric constant. The first two
    /// need a non-empty range.
    pub fn new(spec: &str, min: Option<f64>, max: Option<f64>) -> Result<Self, ConfigError> {
        let spec = spec.trim();
        match spec {
            "random" => {
                let (min, max) = range(spec, min, max)?;
                Ok(Self::Random { min, max })
            }
            "sin" => {
                let (min, max) = range(spec, min, max)?;
                Ok(Self::Sin {
                    min,
                    max,
                    angle: 0.0,
                })
            }
            other => f64::from_str(other)
                .ok()
                .filter(|value| value.is_finite())
                .map(Self::Constant)
                .ok_or_else(|| ConfigError::UnknownGenerator(other.to_string())),
        }
    }

    pub fn next_value(&mut self) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Random { min, max } => rand::random_range(*min..=*max),
            Self::Sin { min, max, angle } => {
                let value = *min + (*max - *min) * (angle.sin() + 1.0) / 2.0;
                *angle = (*angle + SIN_STEP) % (2.0 * PI);
                value
            }
        }
    }
}

fn range(spec: &str, min: Option<f64>, max: Option<f64>) -> Result<(f64, f64), ConfigError> {
    let min = min.unwrap_or(f64::NAN);
    let max = max.unwrap_or(f64::NAN);

    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(ConfigError::InvalidRange {
            generator: spec.to_string(),
            min,
            max,
        });
    }

    Ok((min, max))
}
