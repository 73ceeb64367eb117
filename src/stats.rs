//! Summary statistics over feature columns.
//!
//! Columns come from [`crate::report::FeatureTable`] and may contain
//! sentinel values for frames where a feature could not be computed; those
//! are skipped.

use crate::constants::SENTINEL;
use serde::Serialize;

/// Statistical summary of one feature column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStatistics {
    /// Number of usable values
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Range (max - min)
    pub range: f64,
}

impl ColumnStatistics {
    /// Summarise the non-sentinel values of a column
    ///
    /// Returns `None` when no usable value remains.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let data: Vec<f64> = values
            .into_iter()
            .filter(|v| v.is_finite() && *v != SENTINEL)
            .collect();
        if data.is_empty() {
            return None;
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: data.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_calculation() {
        let stats = ColumnStatistics::from_values([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range, 4.0);
        assert!((stats.std_dev - std::f64::consts::SQRT_2).abs() < 1e-10);
    }

    #[test]
    fn test_sentinels_skipped() {
        let stats = ColumnStatistics::from_values([SENTINEL, 2.0, SENTINEL, 4.0]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 3.0);
    }

    #[test]
    fn test_all_sentinels() {
        assert!(ColumnStatistics::from_values([SENTINEL, SENTINEL]).is_none());
        assert!(ColumnStatistics::from_values(Vec::new()).is_none());
    }
}
