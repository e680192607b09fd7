//! Historical pattern analysis over gas readings.
//!
//! Elementary statistics over short chronological series: OLS trend,
//! Pearson correlation, z-score/IQR anomaly counts, spike detection, an
//! exponentially smoothed one-step forecast, and percentile summaries.
//!
//! Input is chronological (oldest first); callers holding newest-first
//! query results must reverse before analysis.

use serde::Serialize;
use thiserror::Error;

use crate::models::GasEvent;

/// Minimum number of readings for a meaningful analysis.
pub const MIN_READINGS: usize = 5;

/// Errors from pattern analysis.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Insufficient data for pattern analysis (minimum 5 readings required, got {0})")]
    InsufficientData(usize),
}

/// Trend direction of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Stable,
    Increasing,
    Decreasing,
    Fluctuating,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Fluctuating => "fluctuating",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Summary statistics for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, Serialize)]
pub struct Percentiles {
    #[serde(rename = "25th")]
    pub p25: f64,
    #[serde(rename = "75th")]
    pub p75: f64,
    #[serde(rename = "90th")]
    pub p90: f64,
    #[serde(rename = "95th")]
    pub p95: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    pub mq2_trend: Trend,
    pub mq135_trend: Trend,
    pub correlation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyDetection {
    pub mq2_anomalies: usize,
    pub mq135_anomalies: usize,
    pub sudden_spikes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Predictions {
    pub mq2_forecast: f64,
    pub mq135_forecast: f64,
    pub risk_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticalSummary {
    pub mq2_stats: ChannelStats,
    pub mq135_stats: ChannelStats,
}

/// Full pattern-analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub trend_analysis: TrendAnalysis,
    pub anomaly_detection: AnomalyDetection,
    pub predictions: Predictions,
    pub statistical_summary: StatisticalSummary,
    pub recommendations: Vec<String>,
}

/// Analyze gas-level history for trends, anomalies and forecasts.
pub fn detect_gas_patterns(history: &[GasEvent]) -> Result<PatternReport, PatternError> {
    if history.len() < MIN_READINGS {
        return Err(PatternError::InsufficientData(history.len()));
    }

    let mq2: Vec<f64> = history.iter().map(|e| e.mq2_level).collect();
    let mq135: Vec<f64> = history.iter().map(|e| e.mq135_level).collect();

    let trend_analysis = TrendAnalysis {
        mq2_trend: calculate_trend(&mq2),
        mq135_trend: calculate_trend(&mq135),
        correlation: correlation(&mq2, &mq135),
    };

    let anomaly_detection = AnomalyDetection {
        mq2_anomalies: count_anomalies(&mq2),
        mq135_anomalies: count_anomalies(&mq135),
        sudden_spikes: count_sudden_spikes(history),
    };

    let predictions = Predictions {
        mq2_forecast: forecast(&mq2),
        mq135_forecast: forecast(&mq135),
        risk_probability: risk_probability(history),
    };

    let statistical_summary = StatisticalSummary {
        mq2_stats: channel_stats(&mq2),
        mq135_stats: channel_stats(&mq135),
    };

    let mut recommendations = Vec::new();
    if trend_analysis.mq2_trend == Trend::Increasing {
        recommendations
            .push("MQ2 levels trending upward - investigate combustible gas sources".to_string());
    }
    if trend_analysis.mq135_trend == Trend::Increasing {
        recommendations
            .push("Air quality deteriorating - check ventilation and pollution sources".to_string());
    }
    if anomaly_detection.sudden_spikes > 2 {
        recommendations
            .push("Multiple sudden spikes detected - check for intermittent gas leaks".to_string());
    }
    if predictions.risk_probability > 0.7 {
        recommendations.push(
            "High probability of dangerous gas levels - implement preventive measures".to_string(),
        );
    }
    if trend_analysis.correlation.abs() > 0.7 {
        if trend_analysis.correlation > 0.0 {
            recommendations.push(
                "Strong positive correlation between gas sensors - common source likely"
                    .to_string(),
            );
        } else {
            recommendations.push(
                "Strong negative correlation detected - investigate opposing factors".to_string(),
            );
        }
    }

    Ok(PatternReport {
        trend_analysis,
        anomaly_detection,
        predictions,
        statistical_summary,
        recommendations,
    })
}

/// Classify the trend of a series via OLS slope plus a recent-vs-earlier
/// percentage change over the last third of the data.
pub fn calculate_trend(values: &[f64]) -> Trend {
    if values.len() < 3 {
        return Trend::InsufficientData;
    }

    let n = values.len();
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return Trend::Stable;
    }
    let slope = numerator / denominator;

    let recent_third = n / 3;
    let (recent_avg, earlier_avg) = if recent_third > 0 {
        let recent = &values[n - recent_third..];
        let earlier = &values[..n - recent_third];
        (
            recent.iter().sum::<f64>() / recent.len() as f64,
            earlier.iter().sum::<f64>() / earlier.len() as f64,
        )
    } else {
        (values[n - 1], values[0])
    };

    let recent_change = if earlier_avg > 0.0 {
        (recent_avg - earlier_avg) / earlier_avg * 100.0
    } else {
        0.0
    };

    if slope.abs() < 0.1 && recent_change.abs() < 5.0 {
        Trend::Stable
    } else if slope > 0.2 || recent_change > 10.0 {
        Trend::Increasing
    } else if slope < -0.2 || recent_change < -10.0 {
        Trend::Decreasing
    } else {
        Trend::Fluctuating
    }
}

/// Pearson correlation coefficient between two equal-length series.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_a = 0.0;
    let mut sum_sq_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        numerator += (x - mean_a) * (y - mean_b);
        sum_sq_a += (x - mean_a).powi(2);
        sum_sq_b += (y - mean_b).powi(2);
    }

    let denominator = (sum_sq_a * sum_sq_b).sqrt();
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Count outliers: the larger of the |z| > 2 count and the 1.5*IQR count.
fn count_anomalies(values: &[f64]) -> usize {
    if values.len() < 5 {
        return 0;
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    let z_anomalies = if std_dev > 0.0 {
        values
            .iter()
            .filter(|&&v| ((v - mean) / std_dev).abs() > 2.0)
            .count()
    } else {
        0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    let iqr_anomalies = values.iter().filter(|&&v| v < lower || v > upper).count();

    z_anomalies.max(iqr_anomalies)
}

/// Count consecutive-sample increases above 50% on either channel.
fn count_sudden_spikes(history: &[GasEvent]) -> usize {
    let mut spikes = 0;
    for pair in history.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);

        let mq2_increase = if prev.mq2_level > 0.0 {
            (curr.mq2_level - prev.mq2_level) / prev.mq2_level
        } else {
            0.0
        };
        let mq135_increase = if prev.mq135_level > 0.0 {
            (curr.mq135_level - prev.mq135_level) / prev.mq135_level
        } else {
            0.0
        };

        if mq2_increase > 0.5 || mq135_increase > 0.5 {
            spikes += 1;
        }
    }
    spikes
}

/// One-step forecast: exponential smoothing (alpha 0.3) plus a linear
/// trend adjustment over the last five points, clamped to non-negative.
fn forecast(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if values.len() < 3 {
        return values[values.len() - 1];
    }

    const ALPHA: f64 = 0.3;
    let mut smoothed = values[0];
    for &value in &values[1..] {
        smoothed = ALPHA * value + (1.0 - ALPHA) * smoothed;
    }

    if values.len() >= 5 {
        let recent_trend = (values[values.len() - 1] - values[values.len() - 5]) / 4.0;
        smoothed += recent_trend;
    }

    smoothed.max(0.0)
}

/// Fraction of readings above the MQ2 caution or MQ135 moderate cutoffs.
fn risk_probability(history: &[GasEvent]) -> f64 {
    if history.len() < 3 {
        return 0.0;
    }
    let danger_count = history
        .iter()
        .filter(|e| e.mq2_level > 80.0 || e.mq135_level > 300.0)
        .count();
    danger_count as f64 / history.len() as f64
}

/// Percentile by linear interpolation over a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let k = (sorted.len() - 1) as f64 * p;
    let f = k.floor() as usize;
    let c = k - f as f64;
    if f + 1 < sorted.len() {
        sorted[f] * (1.0 - c) + sorted[f + 1] * c
    } else {
        sorted[f]
    }
}

/// Descriptive statistics for one channel.
pub fn channel_stats(values: &[f64]) -> ChannelStats {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let min = sorted[0];
    let max = sorted[n - 1];
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    ChannelStats {
        count: n,
        mean,
        median: sorted[n / 2],
        min,
        max,
        range: max - min,
        std_dev: variance.sqrt(),
        percentiles: Percentiles {
            p25: percentile(&sorted, 0.25),
            p75: percentile(&sorted, 0.75),
            p90: percentile(&sorted, 0.90),
            p95: percentile(&sorted, 0.95),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::GasAlertLevel;

    fn events(levels: &[(f64, f64)]) -> Vec<GasEvent> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &(mq2, mq135))| GasEvent {
                id: i as i64 + 1,
                timestamp: Utc::now(),
                mq2_level: mq2,
                mq135_level: mq135,
                latitude: 0.0,
                longitude: 0.0,
                alert_triggered: false,
                alert_type: GasAlertLevel::Normal,
                methane_ppm: 0.0,
                hydrogen_ppm: 0.0,
                lpg_ppm: 0.0,
                smoke_ppm: 0.0,
                alcohol_ppm: 0.0,
            })
            .collect()
    }

    #[test]
    fn too_few_readings_is_an_error() {
        let history = events(&[(10.0, 10.0); 4]);
        assert!(matches!(
            detect_gas_patterns(&history),
            Err(PatternError::InsufficientData(4))
        ));
    }

    #[test]
    fn constant_series_is_stable() {
        assert_eq!(calculate_trend(&[42.0; 8]), Trend::Stable);
    }

    #[test]
    fn rising_series_is_increasing() {
        assert_eq!(
            calculate_trend(&[10.0, 20.0, 30.0, 40.0, 50.0]),
            Trend::Increasing
        );
    }

    #[test]
    fn falling_series_is_decreasing() {
        assert_eq!(
            calculate_trend(&[50.0, 40.0, 30.0, 20.0, 10.0]),
            Trend::Decreasing
        );
    }

    #[test]
    fn increasing_mq2_produces_recommendation() {
        let history = events(&[
            (10.0, 100.0),
            (20.0, 100.0),
            (30.0, 100.0),
            (40.0, 100.0),
            (50.0, 100.0),
        ]);
        let report = detect_gas_patterns(&history).unwrap();
        assert_eq!(report.trend_analysis.mq2_trend, Trend::Increasing);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("MQ2 levels trending upward")));
    }

    #[test]
    fn perfectly_correlated_channels() {
        let history = events(&[
            (10.0, 100.0),
            (20.0, 200.0),
            (30.0, 300.0),
            (40.0, 400.0),
            (50.0, 500.0),
        ]);
        let report = detect_gas_patterns(&history).unwrap();
        assert!((report.trend_analysis.correlation - 1.0).abs() < 1e-9);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("positive correlation")));
    }

    #[test]
    fn spike_counting() {
        // 10 -> 20 is a 100% jump, 20 -> 25 is not
        let history = events(&[
            (10.0, 0.0),
            (20.0, 0.0),
            (25.0, 0.0),
            (60.0, 0.0),
            (55.0, 0.0),
        ]);
        let report = detect_gas_patterns(&history).unwrap();
        assert_eq!(report.anomaly_detection.sudden_spikes, 2);
    }

    #[test]
    fn risk_probability_counts_dangerous_readings() {
        let history = events(&[
            (90.0, 0.0),
            (10.0, 310.0),
            (10.0, 10.0),
            (10.0, 10.0),
            (85.0, 10.0),
        ]);
        let report = detect_gas_patterns(&history).unwrap();
        assert!((report.predictions.risk_probability - 0.6).abs() < 1e-9);
    }

    #[test]
    fn forecast_tracks_constant_series() {
        assert!((forecast(&[30.0; 10]) - 30.0).abs() < 1e-9);
        assert_eq!(forecast(&[]), 0.0);
        assert_eq!(forecast(&[5.0, 7.0]), 7.0);
    }

    #[test]
    fn stats_on_known_series() {
        let stats = channel_stats(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(stats.count, 5);
        assert!((stats.mean - 30.0).abs() < 1e-9);
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 50.0);
        assert_eq!(stats.range, 40.0);
        assert!((stats.percentiles.p25 - 20.0).abs() < 1e-9);
        assert!((stats.percentiles.p75 - 40.0).abs() < 1e-9);
    }

    #[test]
    fn anomaly_detection_flags_outlier() {
        let mut values = vec![10.0; 11];
        values.push(500.0);
        assert!(count_anomalies(&values) >= 1);
        assert_eq!(count_anomalies(&[10.0; 12]), 0);
    }
}
