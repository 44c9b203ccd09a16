//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `modsieve_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `category`: cache category (e.g. "submission", "authorActivities")
//! - `kind`: rule kind (e.g. "regex", "author")
//! - `outcome`: rule outcome: "triggered", "passed" or "skipped"
//! - `status`: check status: "triggered", "passed", "cached" or "skipped"

/// Total cache lookups, hits and misses alike.
///
/// Labels: `category`.
pub const CACHE_REQUESTS_TOTAL: &str = "modsieve_cache_requests_total";

/// Total cache misses (lookups that went to the platform or content source).
///
/// Labels: `category`.
pub const CACHE_MISSES_TOTAL: &str = "modsieve_cache_misses_total";

/// Total rule evaluations.
///
/// Labels: `kind`, `outcome`.
pub const RULE_RUNS_TOTAL: &str = "modsieve_rule_runs_total";

/// Total check evaluations.
///
/// Labels: `status`.
pub const CHECK_RUNS_TOTAL: &str = "modsieve_check_runs_total";
