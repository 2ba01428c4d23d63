//! Histogram and kernel density estimate for one dataset column
//!
//! Numeric columns get equal-width bins and a Gaussian KDE curve scaled to
//! counts so both can share one axis. Categorical columns get one bar per
//! distinct label.

use crate::dataset::ColumnValues;
use serde::Serialize;

/// Upper bound on automatic bin count
pub const MAX_BINS: usize = 500;

/// KDE evaluation points
pub const KDE_GRID_POINTS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KdePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Distribution summary ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    Numeric {
        bins: Vec<Bin>,
        /// Empty when the data cannot support a density estimate
        kde: Vec<KdePoint>,
        n: usize,
    },
    Categorical {
        counts: Vec<CategoryCount>,
        n: usize,
    },
}

impl Distribution {
    pub fn from_values(values: &ColumnValues) -> Self {
        match values {
            ColumnValues::Numeric(v) => numeric_distribution(v),
            ColumnValues::Categorical(v) => categorical_distribution(v),
        }
    }

    /// Number of values summarized
    pub fn len(&self) -> usize {
        match self {
            Distribution::Numeric { n, .. } | Distribution::Categorical { n, .. } => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn numeric_distribution(values: &[f64]) -> Distribution {
    let bins = histogram_bins(values);
    let kde = match bins.first() {
        Some(bin) => {
            let width = bin.end - bin.start;
            gaussian_kde(values, KDE_GRID_POINTS)
                .into_iter()
                .map(|p| KdePoint {
                    x: p.x,
                    // density integrates to 1; counts integrate to n * width
                    y: p.y * values.len() as f64 * width,
                })
                .collect()
        }
        None => Vec::new(),
    };

    Distribution::Numeric {
        bins,
        kde,
        n: values.len(),
    }
}

fn categorical_distribution(values: &[String]) -> Distribution {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|c| &c.label == value) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                label: value.clone(),
                count: 1,
            }),
        }
    }

    Distribution::Categorical {
        counts,
        n: values.len(),
    }
}

/// Number of equal-width bins for `values`
///
/// Uses the finer of the Sturges and Freedman-Diaconis widths; falls back
/// to Sturges when the interquartile range is zero. Never asks for bins
/// narrower than the floating-point resolution of the data.
pub fn auto_bin_count(values: &[f64]) -> usize {
    let n = values.len();
    if n == 0 {
        return 0;
    }

    let (min, max) = min_max(values);
    if min == max {
        return 1;
    }
    let range = max - min;
    if !range.is_finite() {
        // Both rules are scale-invariant; halving keeps the span representable
        let halved: Vec<f64> = values.iter().map(|v| v / 2.0).collect();
        return auto_bin_count(&halved);
    }

    let sturges_width = range / ((n as f64).log2() + 1.0);

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
    let fd_width = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);

    let width = if fd_width > 0.0 {
        fd_width.min(sturges_width)
    } else {
        sturges_width
    };

    let resolution = (min.abs().max(max.abs()) * f64::EPSILON).max(f64::MIN_POSITIVE);
    let representable = (range / resolution).floor() as usize;

    ((range / width).ceil() as usize)
        .min(representable)
        .clamp(1, MAX_BINS)
}

/// Equal-width bins covering the data range
///
/// The last bin is closed on the right so the maximum is counted. A
/// constant column gets one bin of width 1 centred on the value, widened
/// when the value is too large for a unit step to register.
pub fn histogram_bins(values: &[f64]) -> Vec<Bin> {
    let count = auto_bin_count(values);
    if count == 0 {
        return Vec::new();
    }

    let (mut min, mut max) = min_max(values);
    if min == max {
        let pad = (min.abs() * f64::EPSILON).max(0.5);
        min = (min - pad).max(f64::MIN);
        max = (max + pad).min(f64::MAX);
    }

    // Edges by interpolation so that no intermediate overflows
    let edge = |i: usize| {
        if i == 0 {
            min
        } else if i == count {
            max
        } else {
            let t = i as f64 / count as f64;
            min * (1.0 - t) + max * t
        }
    };

    let mut bins: Vec<Bin> = (0..count)
        .map(|i| Bin {
            start: edge(i),
            end: edge(i + 1),
            count: 0,
        })
        .collect();

    let width = max / count as f64 - min / count as f64;
    for value in values {
        let offset = value / width - min / width;
        let index = if offset.is_finite() {
            (offset.floor().max(0.0) as usize).min(count - 1)
        } else {
            0
        };
        bins[index].count += 1;
    }

    bins
}

/// Gaussian KDE with Scott's bandwidth, evaluated over the data range
///
/// Returns no points with fewer than two values or zero variance.
pub fn gaussian_kde(values: &[f64], grid_points: usize) -> Vec<KdePoint> {
    let n = values.len();
    if n < 2 || grid_points < 2 {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return Vec::new();
    }

    let bandwidth = std * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let (min, max) = min_max(values);
    let step = (max - min) / (grid_points - 1) as f64;

    (0..grid_points)
        .map(|i| {
            let x = min + step * i as f64;
            let y = values
                .iter()
                .map(|v| {
                    let u = (x - v) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm;
            KdePoint { x, y }
        })
        .collect()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_count_every_value() {
        let values: Vec<f64> = (0..100).map(|i| (i % 37) as f64).collect();
        let bins = histogram_bins(&values);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 100);
        assert_eq!(bins.first().unwrap().start, 0.0);
        assert_eq!(bins.last().unwrap().end, 36.0);
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        let bins = histogram_bins(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(bins.last().unwrap().count >= 1);
    }

    #[test]
    fn test_constant_column_single_bin() {
        let bins = histogram_bins(&[5.0, 5.0, 5.0]);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].start, 4.5);
        assert_eq!(bins[0].end, 5.5);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_huge_constant_column_has_positive_width() {
        let bins = histogram_bins(&[1e300, 1e300]);
        assert_eq!(bins.len(), 1);
        assert!(bins[0].start < bins[0].end);
        assert_eq!(bins[0].count, 2);

        let bins = histogram_bins(&[f64::MAX]);
        assert!(bins[0].start < bins[0].end);
        assert!(bins[0].end.is_finite());
    }

    #[test]
    fn test_range_wider_than_f64_max() {
        let bins = histogram_bins(&[-1e308, 1e308]);
        assert!(!bins.is_empty());
        for bin in &bins {
            assert!(bin.start.is_finite() && bin.end.is_finite(), "{:?}", bin);
            assert!(bin.start < bin.end);
        }
        assert_eq!(bins.first().unwrap().start, -1e308);
        assert_eq!(bins.last().unwrap().end, 1e308);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_subnormal_range_does_not_split_below_resolution() {
        let mut values = vec![0.0; 50];
        values.push(5e-324);
        let bins = histogram_bins(&values);
        assert_eq!(bins.len(), 1);
        assert!(bins[0].start < bins[0].end);
        assert_eq!(bins[0].count, 51);
    }

    #[test]
    fn test_extreme_column_still_summarizes() {
        let dist = Distribution::from_values(&ColumnValues::Numeric(vec![-1e308, 0.0, 1e308]));
        match dist {
            Distribution::Numeric { bins, kde, n } => {
                assert_eq!(n, 3);
                assert!(bins.iter().all(|b| !b.start.is_nan() && !b.end.is_nan()));
                // Variance overflows, so no density curve
                assert!(kde.is_empty());
            }
            other => panic!("expected numeric, got {:?}", other),
        }
    }

    #[test]
    fn test_auto_bin_count_empty() {
        assert_eq!(auto_bin_count(&[]), 0);
        assert!(histogram_bins(&[]).is_empty());
    }

    #[test]
    fn test_sturges_fallback_when_iqr_zero() {
        // IQR is zero, so only Sturges applies: ceil(log2(8) + 1) = 4
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0];
        assert_eq!(auto_bin_count(&values), 4);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 7919) % 101) as f64).collect();
        let points = gaussian_kde(&values, 400);
        let area: f64 = points
            .windows(2)
            .map(|w| (w[1].x - w[0].x) * (w[0].y + w[1].y) / 2.0)
            .sum();
        // Evaluated over the data range only, so some mass sits outside
        assert!(area > 0.85 && area <= 1.0, "area was {}", area);
    }

    #[test]
    fn test_kde_skipped_for_degenerate_input() {
        assert!(gaussian_kde(&[3.0], 200).is_empty());
        assert!(gaussian_kde(&[2.0, 2.0, 2.0], 200).is_empty());
    }

    #[test]
    fn test_categorical_counts_keep_first_appearance_order() {
        let values: Vec<String> = ["No", "Yes", "No", "No"].iter().map(|s| s.to_string()).collect();
        let dist = Distribution::from_values(&ColumnValues::Categorical(values));
        match dist {
            Distribution::Categorical { counts, n } => {
                assert_eq!(n, 4);
                assert_eq!(counts[0], CategoryCount { label: "No".to_string(), count: 3 });
                assert_eq!(counts[1], CategoryCount { label: "Yes".to_string(), count: 1 });
            }
            other => panic!("expected categorical, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_distribution_scales_kde_to_counts() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        match Distribution::from_values(&ColumnValues::Numeric(values)) {
            Distribution::Numeric { bins, kde, n } => {
                assert_eq!(n, 50);
                assert_eq!(kde.len(), KDE_GRID_POINTS);
                let peak = kde.iter().map(|p| p.y).fold(0.0, f64::max);
                let tallest = bins.iter().map(|b| b.count).max().unwrap() as f64;
                // Uniform data: the curve sits at roughly bar height
                assert!(peak > tallest * 0.5 && peak < tallest * 2.0);
            }
            other => panic!("expected numeric, got {:?}", other),
        }
    }
}
