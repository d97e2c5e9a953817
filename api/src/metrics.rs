use once_cell::sync::Lazy;
use prometheus::{opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, TextEncoder};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}

const BODY_SIZE_BUCKETS: [f64; 8] = [
    256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0, 8388608.0,
];

pub static BIND_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("bind_requests_total", "Request bodies bound and validated", &["format"]);
pub static BIND_REJECTIONS_TOTAL: Lazy<IntCounterVec> = counter_vec!(
    "bind_rejections_total",
    "Request bodies rejected during binding or validation",
    &["format", "kind"]
);
pub static BIND_BODY_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("bind_body_size_bytes", "Size of bound request bodies")
            .buckets(BODY_SIZE_BUCKETS.to_vec()),
        &["format"],
    )
    .unwrap()
});

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(BIND_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(BIND_REJECTIONS_TOTAL.clone()))?;
    r.register(Box::new(BIND_BODY_SIZE.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_body(format: &str, size: usize) {
    BIND_REQUESTS_TOTAL.with_label_values(&[format]).inc();
    BIND_BODY_SIZE.with_label_values(&[format]).observe(size as f64);
}

pub fn observe_rejection(format: &str, kind: &str) {
    BIND_REJECTIONS_TOTAL.with_label_values(&[format, kind]).inc();
}
