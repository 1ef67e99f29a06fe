use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct ReconcileMetrics {
    reconciles: Family<Labels, Counter>,
    backend_clients: Gauge,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct Labels {
    kind: String,
    outcome: &'static str,
}

impl ReconcileMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Family::<Labels, Counter>::default();
        reg.register(
            "reconciles",
            "Total number of reconciliations by resource kind and outcome",
            reconciles.clone(),
        );

        let backend_clients = Gauge::default();
        reg.register(
            "backend_clients",
            "Number of cached clients for non-default backends",
            backend_clients.clone(),
        );

        Self {
            reconciles,
            backend_clients,
        }
    }

    pub(crate) fn record(&self, kind: &str, outcome: &'static str) {
        self.reconciles
            .get_or_create(&Labels {
                kind: kind.to_string(),
                outcome,
            })
            .inc();
    }

    pub(crate) fn set_backend_clients(&self, n: usize) {
        self.backend_clients.set(n as i64);
    }
}
