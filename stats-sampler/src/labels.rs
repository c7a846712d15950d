//! Metric names and tags

// ----------------
// | METRIC NAMES |
// ----------------

/// Metric counting samples recorded with every sub-metric present
pub const NUM_STATS_SAMPLES_RECORDED_METRIC: &str = "num_stats_samples_recorded";
/// Metric counting samples recorded with some sub-metric missing
pub const NUM_STATS_SAMPLES_DEGRADED_METRIC: &str = "num_stats_samples_degraded";
/// Metric counting ticks skipped because the container state was not ready
pub const NUM_STATS_SAMPLES_NOT_READY_METRIC: &str = "num_stats_samples_not_ready";
/// Metric counting ticks skipped because the supplier failed
pub const NUM_STATS_SAMPLE_FAILURES_METRIC: &str = "num_stats_sample_failures";
/// Metric describing the number of containers currently sampled
pub const NUM_TRACKED_CONTAINERS_METRIC: &str = "num_tracked_containers";

// ---------------
// | METRIC TAGS |
// ---------------

/// Metric tag for the docker ID of the sampled container
pub const CONTAINER_ID_METRIC_TAG: &str = "container_id";
