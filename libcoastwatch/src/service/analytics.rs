//! Summary statistics over the report feed

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::error::CoastwatchError;
use crate::types::{FeedItem, ReportStatus, Severity};

/// Time window the statistics cover, counted back from now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
            Period::Year => "1y",
            Period::All => "all",
        }
    }

    /// Earliest creation time inside the window, `None` for all time
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
            Period::Year => 365,
            Period::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

impl FromStr for Period {
    type Err = CoastwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Period::Week),
            "30d" => Ok(Period::Month),
            "90d" => Ok(Period::Quarter),
            "1y" => Ok(Period::Year),
            "all" => Ok(Period::All),
            other => Err(CoastwatchError::InvalidInput(format!(
                "Unknown period '{}'. Use 7d, 30d, 90d, 1y or all.",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub label: String,
    pub count: usize,
    /// Share of all reports in the window, rounded to a whole percent
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    /// e.g. "Sep 2025"
    pub month: String,
    pub reports: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub period: Period,
    pub total: usize,
    pub high_priority: usize,
    pub resolved: usize,
    /// Resolved share in percent; 0 when there are no reports
    pub resolution_rate: u32,
    pub top_types: Vec<TypeCount>,
    pub monthly: Vec<MonthlyTrend>,
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

impl Analytics {
    pub fn compute(items: &[FeedItem], period: Period, now: DateTime<Utc>) -> Self {
        let cutoff = period.cutoff(now);
        let in_window: Vec<&FeedItem> = items
            .iter()
            .filter(|item| cutoff.map_or(true, |c| item.created_at >= c))
            .collect();

        let total = in_window.len();
        let high_priority = in_window
            .iter()
            .filter(|item| item.severity == Severity::High)
            .count();
        let resolved = in_window
            .iter()
            .filter(|item| item.status == ReportStatus::Resolved)
            .count();

        let mut by_type: HashMap<&str, usize> = HashMap::new();
        for item in &in_window {
            *by_type.entry(item.type_label.as_str()).or_default() += 1;
        }
        let mut top_types: Vec<TypeCount> = by_type
            .into_iter()
            .map(|(label, count)| TypeCount {
                label: label.to_string(),
                count,
                percent: percent(count, total),
            })
            .collect();
        top_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        // (year, month) keys keep the trend chronological
        let mut by_month: BTreeMap<(i32, u32), (String, usize, usize)> = BTreeMap::new();
        for item in &in_window {
            let key = (item.created_at.year(), item.created_at.month());
            let entry = by_month
                .entry(key)
                .or_insert_with(|| (item.created_at.format("%b %Y").to_string(), 0, 0));
            entry.1 += 1;
            if item.status == ReportStatus::Resolved {
                entry.2 += 1;
            }
        }
        let monthly = by_month
            .into_values()
            .map(|(month, reports, resolved)| MonthlyTrend {
                month,
                reports,
                resolved,
            })
            .collect();

        Self {
            period,
            total,
            high_priority,
            resolved,
            resolution_rate: percent(resolved, total),
            top_types,
            monthly,
        }
    }
}
