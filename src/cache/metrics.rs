use metrics::counter;

pub const METRIC_CACHE_HIT_TOTAL: &str = "chronicle_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "chronicle_cache_miss_total";
pub const METRIC_CACHE_WRITE_TOTAL: &str = "chronicle_cache_write_total";
pub const METRIC_CACHE_ERROR_TOTAL: &str = "chronicle_cache_error_total";

pub(crate) fn record_hit(lookup: &'static str) {
    counter!(METRIC_CACHE_HIT_TOTAL, "lookup" => lookup).increment(1);
}

pub(crate) fn record_miss() {
    counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
}

pub(crate) fn record_write() {
    counter!(METRIC_CACHE_WRITE_TOTAL).increment(1);
}

pub(crate) fn record_error(op: &'static str) {
    counter!(METRIC_CACHE_ERROR_TOTAL, "op" => op).increment(1);
}
