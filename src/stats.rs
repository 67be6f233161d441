//! Statistics over a column of metric values.

use std::str::FromStr;

use crate::error::CalculationError;

/// Supported statistics. Names parse case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Min,
    Max,
    Sum,
    Avg,
}

impl FromStr for Statistic {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "sum" => Ok(Statistic::Sum),
            "avg" => Ok(Statistic::Avg),
            _ => Err(CalculationError::UnknownStatistic(s.to_string())),
        }
    }
}

impl Statistic {
    /// Apply to a non-empty slice. Returns `None` on empty input.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        // ---
        if values.is_empty() {
            return None;
        }

        let value = match self {
            Statistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::Sum => values.iter().sum(),
            // running mean, stays finite wherever the inputs are
            Statistic::Avg => values
                .iter()
                .enumerate()
                .fold(0.0, |mean, (i, x)| mean + (x - mean) / (i + 1) as f64),
        };
        Some(value)
    }
}

/// Compute the named statistic over `values`.
///
/// Fails on empty input before the name is looked at, on any name other
/// than `min`, `max`, `sum` or `avg`, and when the result is not finite.
pub fn calculate(values: &[f64], statistic: &str) -> Result<f64, CalculationError> {
    // ---
    if values.is_empty() {
        return Err(CalculationError::Empty {
            statistic: statistic.to_string(),
        });
    }

    let stat: Statistic = statistic.parse()?;
    let value = stat.apply(values).ok_or_else(|| CalculationError::Empty {
        statistic: statistic.to_string(),
    })?;

    if !value.is_finite() {
        return Err(CalculationError::NonFinite {
            statistic: statistic.to_string(),
            value,
        });
    }
    Ok(value)
}
