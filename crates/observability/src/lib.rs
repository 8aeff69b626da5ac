use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    consultations_total: AtomicU64,
    high_severity_total: AtomicU64,
    searches_total: AtomicU64,
    bookings_confirmed_total: AtomicU64,
    bookings_refused_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub consultations_total: u64,
    pub high_severity_total: u64,
    pub searches_total: u64,
    pub bookings_confirmed_total: u64,
    pub bookings_refused_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consultation(&self, severity: &'static str) {
        self.consultations_total.fetch_add(1, Ordering::Relaxed);
        if severity == "High" {
            self.high_severity_total.fetch_add(1, Ordering::Relaxed);
        }
        counter!("herdcare_consultations_total", "severity" => severity).increment(1);
    }

    pub fn record_search(&self, matched: usize) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        counter!("herdcare_searches_total").increment(1);
        counter!("herdcare_search_matches_total").increment(matched as u64);
    }

    pub fn record_booking_confirmed(&self) {
        self.bookings_confirmed_total.fetch_add(1, Ordering::Relaxed);
        counter!("herdcare_bookings_total", "outcome" => "confirmed").increment(1);
    }

    pub fn record_booking_refused(&self, reason: &'static str) {
        self.bookings_refused_total.fetch_add(1, Ordering::Relaxed);
        counter!("herdcare_bookings_total", "outcome" => "refused", "reason" => reason)
            .increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            consultations_total: self.consultations_total.load(Ordering::Relaxed),
            high_severity_total: self.high_severity_total.load(Ordering::Relaxed),
            searches_total: self.searches_total.load(Ordering::Relaxed),
            bookings_confirmed_total: self.bookings_confirmed_total.load(Ordering::Relaxed),
            bookings_refused_total: self.bookings_refused_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,herd_desk=info,herd_api=info,tower_http=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
