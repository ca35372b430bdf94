//! Prometheus-kompatible Metriken fuer das Signaling-Relay
//!
//! Registrierte Metriken:
//! - `ghostly_connected_clients` – Gauge: Aktuell verbundene Clients
//! - `ghostly_rooms_active` – Gauge: Existierende Raeume
//! - `ghostly_messages_routed_total` – Counter: Weitergeleitete Nachrichten (type)
//! - `ghostly_messages_dropped_total` – Counter: Verworfene Nachrichten (grund)
//! - `ghostly_auth_total` – Counter: Authentifizierungsversuche (ergebnis)
//!
//! Jede Instanz hat ihre eigene Registry, damit mehrere Relays (z.B. in
//! Tests) sich nicht gegenseitig beeinflussen.

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Label-Werte
// ---------------------------------------------------------------------------

/// Gruende fuer verworfene Nachrichten (`grund`-Label)
pub mod grund {
    pub const UNGUELTIG: &str = "ungueltig";
    pub const UNBEKANNTER_TYP: &str = "unbekannter_typ";
    pub const NICHT_AUTHENTIFIZIERT: &str = "nicht_authentifiziert";
    pub const ZIEL_UNBEKANNT: &str = "ziel_unbekannt";
    pub const NICHT_ZUSTELLBAR: &str = "nicht_zustellbar";
    pub const BINAER: &str = "binaer";
}

/// Alle Relay-Prometheus-Metriken
#[derive(Clone)]
pub struct RelayMetrics {
    pub registry: Arc<Registry>,

    pub connected_clients: IntGauge,
    pub rooms_active: IntGauge,
    pub messages_routed_total: IntCounterVec,
    pub messages_dropped_total: IntCounterVec,
    pub auth_total: IntCounterVec,
}

impl RelayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connected_clients = IntGauge::with_opts(Opts::new(
            "ghostly_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let rooms_active = IntGauge::with_opts(Opts::new(
            "ghostly_rooms_active",
            "Anzahl existierender Raeume",
        ))?;
        registry.register(Box::new(rooms_active.clone()))?;

        let messages_routed_total = IntCounterVec::new(
            Opts::new(
                "ghostly_messages_routed_total",
                "Weitergeleitete Signaling-Nachrichten",
            ),
            &["type"],
        )?;
        registry.register(Box::new(messages_routed_total.clone()))?;

        let messages_dropped_total = IntCounterVec::new(
            Opts::new(
                "ghostly_messages_dropped_total",
                "Verworfene Nachrichten nach Grund",
            ),
            &["grund"],
        )?;
        registry.register(Box::new(messages_dropped_total.clone()))?;

        let auth_total = IntCounterVec::new(
            Opts::new("ghostly_auth_total", "Authentifizierungsversuche"),
            &["ergebnis"],
        )?;
        registry.register(Box::new(auth_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            rooms_active,
            messages_routed_total,
            messages_dropped_total,
            auth_total,
        })
    }

    pub fn weitergeleitet(&self, typ: &str) {
        self.messages_routed_total.with_label_values(&[typ]).inc();
    }

    pub fn verworfen(&self, grund: &str) {
        self.messages_dropped_total.with_label_values(&[grund]).inc();
    }

    pub fn authentifizierung(&self, verifiziert: bool) {
        let ergebnis = if verifiziert { "erfolg" } else { "fehlschlag" };
        self.auth_total.with_label_values(&[ergebnis]).inc();
    }

    /// Setzt beide Gauges auf den aktuellen Registry-Stand
    pub fn bestand_setzen(&self, clients: usize, raeume: usize) {
        self.connected_clients.set(clients as i64);
        self.rooms_active.set(raeume as i64);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RelayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<RelayMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = RelayMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn zwei_instanzen_sind_unabhaengig() {
        let a = RelayMetrics::neu().unwrap();
        let b = RelayMetrics::neu().unwrap();
        a.bestand_setzen(3, 1);
        assert_eq!(a.connected_clients.get(), 3);
        assert_eq!(b.connected_clients.get(), 0);
    }

    #[test]
    fn zaehler_mit_labels() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.weitergeleitet("offer");
        metriken.weitergeleitet("offer");
        metriken.verworfen(grund::ZIEL_UNBEKANNT);
        metriken.authentifizierung(false);

        assert_eq!(
            metriken
                .messages_routed_total
                .with_label_values(&["offer"])
                .get(),
            2
        );
        assert_eq!(
            metriken
                .messages_dropped_total
                .with_label_values(&[grund::ZIEL_UNBEKANNT])
                .get(),
            1
        );
        assert_eq!(
            metriken.auth_total.with_label_values(&["fehlschlag"]).get(),
            1
        );
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.bestand_setzen(5, 2);
        metriken.weitergeleitet("answer");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("ghostly_connected_clients 5"));
        assert!(output.contains("ghostly_rooms_active 2"));
        assert!(output.contains(r#"ghostly_messages_routed_total{type="answer"} 1"#));
        assert!(output.contains("# HELP"));
    }

    #[tokio::test]
    async fn metrics_endpunkt_liefert_text() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.bestand_setzen(1, 0);
        let antwort = metrics_router(metriken)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
    }
}
