use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub lifecycle_transitions_total: IntCounterVec,
    pub active_requests: IntGauge,
    pub location_samples_total: IntCounter,
    pub nearby_search_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let lifecycle_transitions_total = IntCounterVec::new(
            Opts::new(
                "lifecycle_transitions_total",
                "Request lifecycle transitions by kind and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid lifecycle_transitions_total metric");

        let active_requests = IntGauge::new(
            "active_requests",
            "Assistance requests not yet in a terminal status",
        )
        .expect("valid active_requests metric");

        let location_samples_total = IntCounter::new(
            "location_samples_total",
            "Provider location samples ingested",
        )
        .expect("valid location_samples_total metric");

        let nearby_search_seconds = Histogram::with_opts(HistogramOpts::new(
            "nearby_search_seconds",
            "Latency of nearby-provider searches in seconds",
        ))
        .expect("valid nearby_search_seconds metric");

        registry
            .register(Box::new(lifecycle_transitions_total.clone()))
            .expect("register lifecycle_transitions_total");
        registry
            .register(Box::new(active_requests.clone()))
            .expect("register active_requests");
        registry
            .register(Box::new(location_samples_total.clone()))
            .expect("register location_samples_total");
        registry
            .register(Box::new(nearby_search_seconds.clone()))
            .expect("register nearby_search_seconds");

        Self {
            registry,
            lifecycle_transitions_total,
            active_requests,
            location_samples_total,
            nearby_search_seconds,
        }
    }

    pub fn transition(&self, transition: &str, outcome: &str) {
        self.lifecycle_transitions_total
            .with_label_values(&[transition, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
