use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::results::{records_for, ResultRecord};

/// One test on the history chart: seconds since the user's first test, and its WPM
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub t: f64,
    pub wpm: f64,
}

impl HistoryPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<HistoryPoint> for (f64, f64) {
    fn from(p: HistoryPoint) -> Self {
        (p.t, p.wpm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub tests: usize,
    pub best_wpm: u32,
    pub latest_wpm: u32,
    pub mean_wpm: f64,
    pub std_dev: f64,
}

/// Axis ranges for the history chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_max: f64,
    pub y_max: f64,
}

/// A single user's completed tests, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserHistory {
    username: String,
    records: Vec<ResultRecord>,
}

impl UserHistory {
    pub fn from_records(all: &[ResultRecord], username: &str) -> Self {
        let records = records_for(all, username)
            .into_iter()
            .sorted_by_key(|r| r.timestamp)
            .collect();

        Self {
            username: username.to_string(),
            records,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<DateTime<Local>> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_date(&self) -> Option<DateTime<Local>> {
        self.records.last().map(|r| r.timestamp)
    }

    pub fn points(&self) -> Vec<HistoryPoint> {
        let Some(origin) = self.first_date() else {
            return Vec::new();
        };

        self.records
            .iter()
            .map(|r| {
                let t = (r.timestamp - origin).num_milliseconds() as f64 / 1000.0;
                HistoryPoint::new(t, r.wpm as f64)
            })
            .collect()
    }

    pub fn chart_bounds(&self) -> ChartBounds {
        compute_chart_bounds(&self.points())
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        let wpms: Vec<f64> = self.records.iter().map(|r| r.wpm as f64).collect();
        let mean_wpm = mean(&wpms)?;

        Some(HistorySummary {
            tests: self.records.len(),
            best_wpm: self.records.iter().map(|r| r.wpm).max().unwrap_or(0),
            latest_wpm: self.records.last().map(|r| r.wpm).unwrap_or(0),
            mean_wpm,
            std_dev: std_dev(&wpms).unwrap_or(0.0),
        })
    }
}

/// X spans the points (at least 1s so a lone test still has a range), Y tops at the best WPM
pub fn compute_chart_bounds(points: &[HistoryPoint]) -> ChartBounds {
    let y_max = points.iter().map(|p| p.wpm).fold(0.0, f64::max);
    let x_max = points.last().map(|p| p.t).unwrap_or(1.0).max(1.0);

    ChartBounds {
        x_max,
        y_max: y_max.round().max(1.0),
    }
}

/// Format a numeric axis label
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn sample_records() -> Vec<ResultRecord> {
        vec![
            ResultRecord::new("ada", at(10), 50, 6.0),
            ResultRecord::new("bob", at(0), 90, 4.0),
            ResultRecord::new("ada", at(0), 40, 7.5),
            ResultRecord::new("ada", at(5), 45, 6.5),
        ]
    }

    #[test]
    fn test_from_records_filters_and_sorts() {
        let history = UserHistory::from_records(&sample_records(), "ada");
        assert_eq!(history.username(), "ada");
        assert_eq!(history.len(), 3);
        let wpms: Vec<u32> = history.records().iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![40, 45, 50]);
        assert_eq!(history.first_date(), Some(at(0)));
        assert_eq!(history.last_date(), Some(at(10)));
    }

    #[test]
    fn test_from_records_matches_exact_name_only() {
        let mut records = sample_records();
        records.push(ResultRecord::new("Ada", at(1), 99, 3.0));
        records.push(ResultRecord::new("ada ", at(2), 98, 3.0));
        let history = UserHistory::from_records(&records, "ada");
        assert_eq!(history.len(), 3);
        assert!(history.records().iter().all(|r| r.username == "ada"));
        assert_eq!(history.summary().unwrap().best_wpm, 50);
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let history = UserHistory::from_records(&sample_records(), "carol");
        assert!(history.is_empty());
        assert!(history.points().is_empty());
        assert!(history.summary().is_none());
    }

    #[test]
    fn test_points_are_relative_to_first_test() {
        let history = UserHistory::from_records(&sample_records(), "ada");
        let points = history.points();
        assert_eq!(
            points,
            vec![
                HistoryPoint::new(0.0, 40.0),
                HistoryPoint::new(300.0, 45.0),
                HistoryPoint::new(600.0, 50.0),
            ]
        );
        let tuple: (f64, f64) = points[1].into();
        assert_eq!(tuple, (300.0, 45.0));
    }

    #[test]
    fn test_chart_bounds() {
        let history = UserHistory::from_records(&sample_records(), "ada");
        assert_eq!(
            history.chart_bounds(),
            ChartBounds {
                x_max: 600.0,
                y_max: 50.0
            }
        );
    }

    #[test]
    fn test_chart_bounds_single_point() {
        let bounds = compute_chart_bounds(&[HistoryPoint::new(0.0, 33.4)]);
        assert_eq!(bounds.x_max, 1.0);
        assert_eq!(bounds.y_max, 33.0);
    }

    #[test]
    fn test_chart_bounds_empty() {
        let bounds = compute_chart_bounds(&[]);
        assert_eq!(bounds.x_max, 1.0);
        assert_eq!(bounds.y_max, 1.0);
    }

    #[test]
    fn test_summary() {
        let history = UserHistory::from_records(&sample_records(), "ada");
        let summary = history.summary().unwrap();
        assert_eq!(summary.tests, 3);
        assert_eq!(summary.best_wpm, 50);
        assert_eq!(summary.latest_wpm, 50);
        assert_eq!(summary.mean_wpm, 45.0);
        assert!((summary.std_dev - 4.08248290463863).abs() < 1e-10);
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[42.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
        assert_eq!(std_dev(&[15., 7., 55.]), Some(20.997354330698162));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
