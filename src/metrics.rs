use std::sync::LazyLock;

use prometheus::*;

use crate::descriptor::DescriptorFamily;
use crate::distance::Metric;

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "sig_search_count",
        "count of the similarity searches",
        &["family", "metric"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "sig_search_duration",
        "duration of the per-image search in seconds",
        &["family", "metric"]
    )
    .unwrap()
});

static METRIC_IDENTIFY_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "sig_identify_count",
        "count of the face identifications by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_DEGRADED_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "sig_degraded_count",
        "count of the extractions replaced by zero vectors",
        &["family"]
    )
    .unwrap()
});

pub fn inc_search(family: DescriptorFamily, metric: Metric, duration: f32) {
    let labels = [family.key(), metric.name()];
    METRIC_SEARCH_COUNT.with_label_values(&labels).inc();
    METRIC_SEARCH_DURATION.with_label_values(&labels).observe(duration as f64);
}

pub fn inc_identify(matched: bool) {
    let outcome = if matched { "match" } else { "no_match" };
    METRIC_IDENTIFY_COUNT.with_label_values(&[outcome]).inc();
}

pub fn inc_degraded(family: DescriptorFamily) {
    METRIC_DEGRADED_COUNT.with_label_values(&[family.key()]).inc();
}

/// 以 prometheus 文本格式导出所有指标
pub fn gather_text() -> Result<String> {
    TextEncoder::new().encode_to_string(&gather())
}
