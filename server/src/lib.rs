//! ghostly-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Token-Verifier, Relay, WebSocket-Server und
//! Observability-Server.

pub mod config;

use anyhow::{Context, Result};
use config::{AuthEinstellungen, AuthModus, ServerConfig};
use ghostly_auth::{AblehnenderVerifier, JwtVerifier, StatischerVerifier, TokenVerifier};
use ghostly_observability::{observability_server_starten, HealthState, RelayMetrics};
use ghostly_signaling::{stats_router, Relay, SignalingServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Erstellt den Token-Verifier fuer den konfigurierten Modus
pub fn verifier_erstellen(auth: &AuthEinstellungen) -> Result<Arc<dyn TokenVerifier>> {
    let verifier: Arc<dyn TokenVerifier> = match auth.modus {
        AuthModus::Keiner => Arc::new(AblehnenderVerifier),
        AuthModus::Statisch => Arc::new(StatischerVerifier::neu(&auth.tokens)),
        AuthModus::Jwt => {
            let geheimnis = auth.jwt_secret.as_deref().unwrap_or_default();
            Arc::new(
                JwtVerifier::neu(geheimnis.as_bytes(), auth.jwt_issuer.clone())
                    .context("JWT-Verifier konnte nicht erstellt werden")?,
            )
        }
    };
    Ok(verifier)
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Verifier und Metriken erstellen
    /// 2. WebSocket-Signaling-Server starten
    /// 3. Observability-Server starten (falls aktiviert)
    /// 4. Auf Ctrl-C warten, dann geordnet herunterfahren
    pub async fn starten(self) -> Result<()> {
        let cfg = self.config;
        let signaling_addr: SocketAddr = cfg
            .signaling_bind_adresse()
            .parse()
            .context("Ungueltige Signaling-Bind-Adresse")?;

        let verifier = verifier_erstellen(&cfg.auth)?;
        let metriken = RelayMetrics::neu()?;
        let health = HealthState::neu();
        let relay = Arc::new(Relay::neu(
            cfg.relay_config(),
            Arc::clone(&verifier),
            Some(metriken.clone()),
        ));

        tracing::info!(
            server_name = %cfg.server.name,
            adresse = %signaling_addr,
            verifier = verifier.name(),
            auth_erforderlich = cfg.auth.erforderlich,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let signaling = SignalingServer::neu(Arc::clone(&relay))
            .mit_ws_pfad(cfg.netzwerk.ws_pfad.clone())
            .mit_max_clients(cfg.server.max_clients);
        let mut signaling_task =
            tokio::spawn(signaling.starten(signaling_addr, shutdown_rx.clone()));

        let observability_task = if cfg.observability.aktiviert {
            let addr: SocketAddr = cfg
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Bind-Adresse")?;
            Some(tokio::spawn(observability_server_starten(
                addr,
                metriken,
                health.clone(),
                stats_router(Arc::clone(&relay)),
                shutdown_rx,
            )))
        } else {
            None
        };

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            }
            ergebnis = &mut signaling_task => {
                // Der Signaling-Server endet nur bei einem Fehler von selbst
                health.bereit_setzen(false);
                let _ = shutdown_tx.send(true);
                ergebnis.context("Signaling-Task abgebrochen")??;
                return Ok(());
            }
        }

        health.bereit_setzen(false);
        let _ = shutdown_tx.send(true);

        signaling_task
            .await
            .context("Signaling-Task abgebrochen")??;
        if let Some(task) = observability_task {
            if let Err(e) = task.await.context("Observability-Task abgebrochen")? {
                tracing::warn!(fehler = %e, "Observability-Server mit Fehler beendet");
            }
        }

        tracing::info!("Server beendet");
        Ok(())
    }
}
