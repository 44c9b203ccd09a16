//! Per-category cache usage accounting.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::telemetry;

use super::settings::CacheCategory;

/// How many request timestamps each category remembers.
const TIMESTAMP_HISTORY: usize = 250;

/// How long an identifier's request count is kept after its last request.
const IDENTIFIER_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Default)]
struct CategoryCounters {
    requests: u64,
    misses: u64,
    timestamps: VecDeque<Instant>,
    identifiers: HashMap<String, (u64, Instant)>,
}

impl CategoryCounters {
    fn record(&mut self, identifier: &str, miss: bool, now: Instant) {
        self.requests += 1;
        if miss {
            self.misses += 1;
        }
        if self.timestamps.len() == TIMESTAMP_HISTORY {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);

        self.identifiers
            .retain(|_, (_, seen)| now.duration_since(*seen) < IDENTIFIER_TTL);
        let entry = self
            .identifiers
            .entry(identifier.to_string())
            .or_insert((0, now));
        entry.0 += 1;
        entry.1 = now;
    }

    fn snapshot(&self) -> CategorySnapshot {
        let miss_percent = if self.requests == 0 {
            0.0
        } else {
            round2(self.misses as f64 / self.requests as f64 * 100.0)
        };

        let identifier_average_hit = if self.identifiers.is_empty() {
            0.0
        } else {
            let total: u64 = self.identifiers.values().map(|(n, _)| n).sum();
            round2(total as f64 / self.identifiers.len() as f64)
        };

        let average_time_between_hits = if self.timestamps.len() < 2 {
            0.0
        } else {
            let gaps: Vec<f64> = self
                .timestamps
                .iter()
                .zip(self.timestamps.iter().skip(1))
                .map(|(a, b)| b.duration_since(*a).as_secs_f64())
                .collect();
            round2(gaps.iter().sum::<f64>() / gaps.len() as f64)
        };

        CategorySnapshot {
            requests: self.requests,
            misses: self.misses,
            miss_percent,
            identifier_average_hit,
            average_time_between_hits,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Usage of one cache category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    pub requests: u64,
    pub misses: u64,
    /// Share of requests that missed, in percent.
    pub miss_percent: f64,
    /// Mean number of requests per distinct identifier.
    pub identifier_average_hit: f64,
    /// Mean seconds between consecutive requests.
    pub average_time_between_hits: f64,
}

/// Usage of every cache category plus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub categories: BTreeMap<CacheCategory, CategorySnapshot>,
    pub total_requests: u64,
    pub total_misses: u64,
    pub miss_percent: f64,
}

impl CacheStatsSnapshot {
    pub fn category(&self, category: CacheCategory) -> CategorySnapshot {
        self.categories.get(&category).cloned().unwrap_or_default()
    }
}

/// Thread-safe hit/miss accounting for a resource cache.
///
/// Counters are also mirrored to the `metrics` facade.
#[derive(Debug, Default)]
pub struct CacheStats {
    inner: Mutex<HashMap<CacheCategory, CategoryCounters>>,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self, category: CacheCategory, identifier: &str) {
        self.record(category, identifier, false);
    }

    pub fn miss(&self, category: CacheCategory, identifier: &str) {
        self.record(category, identifier, true);
    }

    fn record(&self, category: CacheCategory, identifier: &str, miss: bool) {
        metrics::counter!(telemetry::CACHE_REQUESTS_TOTAL, "category" => category.as_str())
            .increment(1);
        if miss {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "category" => category.as_str())
                .increment(1);
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .entry(category)
            .or_default()
            .record(identifier, miss, Instant::now());
    }

    /// Clear all counters.
    pub fn reset(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut snapshot = CacheStatsSnapshot::default();
        for category in CacheCategory::ALL {
            let cat = inner
                .get(&category)
                .map(CategoryCounters::snapshot)
                .unwrap_or_default();
            snapshot.total_requests += cat.requests;
            snapshot.total_misses += cat.misses;
            snapshot.categories.insert(category, cat);
        }
        if snapshot.total_requests > 0 {
            snapshot.miss_percent =
                round2(snapshot.total_misses as f64 / snapshot.total_requests as f64 * 100.0);
        }
        snapshot
    }
}
