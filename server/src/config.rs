//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use ghostly_observability::logging::{log_format_gueltig, log_level_gueltig};
use ghostly_protocol::DEFAULT_MAX_NACHRICHT_BYTES;
use ghostly_signaling::RelayConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub netzwerk: NetzwerkEinstellungen,
    /// Verhalten des Relays (Queues, Groessen, Diagnose)
    pub relay: RelayEinstellungen,
    pub auth: AuthEinstellungen,
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health, Stats)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Ghostly Signaling".into(),
            max_clients: ghostly_signaling::server::DEFAULT_MAX_CLIENTS,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer WebSocket und `/stats`
    pub port: u16,
    /// Pfad fuer WebSocket-Upgrades
    pub ws_pfad: String,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8080,
            ws_pfad: ghostly_signaling::server::DEFAULT_WS_PFAD.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Kapazitaet der Sende-Queue pro Client
    pub sende_queue: usize,
    /// Maximale Groesse eines Text-Frames in Bytes
    pub max_nachricht_bytes: usize,
    /// `error{reason:"target-not-found"}` an den Absender
    pub ziel_diagnose: bool,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        Self {
            sende_queue: ghostly_signaling::transport::DEFAULT_SENDE_QUEUE,
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
            ziel_diagnose: false,
        }
    }
}

/// Art der Token-Pruefung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthModus {
    /// Kein Credential-Dienst, jedes Token wird abgelehnt
    #[default]
    Keiner,
    /// Feste Token-Liste
    Statisch,
    /// HS256-JWT
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// Routing erst nach erfolgreicher Authentifizierung
    pub erforderlich: bool,
    pub modus: AuthModus,
    /// Erlaubte Tokens fuer `modus = "statisch"`
    pub tokens: Vec<String>,
    /// HMAC-Geheimnis fuer `modus = "jwt"`
    pub jwt_secret: Option<String>,
    /// Erwarteter `iss`-Claim (optional)
    pub jwt_issuer: Option<String>,
    pub verifizierungs_timeout_ms: u64,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            erforderlich: false,
            modus: AuthModus::Keiner,
            tokens: vec![],
            jwt_secret: None,
            jwt_issuer: None,
            verifizierungs_timeout_ms: 5000,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

// ---------------------------------------------------------------------------
// Validierung
// ---------------------------------------------------------------------------

/// Inhaltlich ungueltige Konfiguration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFehler {
    #[error("ws_pfad muss mit '/' beginnen: '{0}'")]
    WsPfadOhneSchraegstrich(String),

    #[error("ws_pfad '/stats' ist fuer die Statistik reserviert")]
    WsPfadReserviert,

    #[error("{feld} muss groesser als 0 sein")]
    NullWert { feld: &'static str },

    #[error("Ungueltiges Log-Level: '{0}'")]
    LogLevel(String),

    #[error("Ungueltiges Log-Format: '{0}'")]
    LogFormat(String),

    #[error("auth.modus = \"statisch\" ohne Tokens")]
    KeineTokens,

    #[error("auth.modus = \"jwt\" ohne jwt_secret")]
    KeinJwtSecret,
}

/// Herkunft der geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    Datei,
    /// Datei fehlt, alle Werte sind Standardwerte
    Standardwerte,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    ///
    /// Loggt nicht selbst, da das Logging erst mit der geladenen
    /// Konfiguration initialisiert wird.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, ConfigQuelle)> {
        let (config, quelle) = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                (config, ConfigQuelle::Datei)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), ConfigQuelle::Standardwerte)
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.validieren()?;
        Ok((config, quelle))
    }

    pub fn validieren(&self) -> Result<(), ConfigFehler> {
        let pfad = &self.netzwerk.ws_pfad;
        if !pfad.starts_with('/') {
            return Err(ConfigFehler::WsPfadOhneSchraegstrich(pfad.clone()));
        }
        if pfad == "/stats" {
            return Err(ConfigFehler::WsPfadReserviert);
        }
        if self.server.max_clients == 0 {
            return Err(ConfigFehler::NullWert {
                feld: "server.max_clients",
            });
        }
        if self.relay.sende_queue == 0 {
            return Err(ConfigFehler::NullWert {
                feld: "relay.sende_queue",
            });
        }
        if self.relay.max_nachricht_bytes == 0 {
            return Err(ConfigFehler::NullWert {
                feld: "relay.max_nachricht_bytes",
            });
        }
        if !log_level_gueltig(&self.logging.level) {
            return Err(ConfigFehler::LogLevel(self.logging.level.clone()));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(ConfigFehler::LogFormat(self.logging.format.clone()));
        }
        match self.auth.modus {
            AuthModus::Statisch if self.auth.tokens.is_empty() => Err(ConfigFehler::KeineTokens),
            AuthModus::Jwt if self.auth.jwt_secret.as_deref().map_or(true, str::is_empty) => {
                Err(ConfigFehler::KeinJwtSecret)
            }
            _ => Ok(()),
        }
    }

    /// Bind-Adresse fuer WebSocket und `/stats`
    pub fn signaling_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }

    /// Bibliotheks-Konfiguration fuer das Relay
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            sende_queue: self.relay.sende_queue,
            max_nachricht_bytes: self.relay.max_nachricht_bytes,
            ziel_diagnose: self.relay.ziel_diagnose,
            auth_erforderlich: self.auth.erforderlich,
            verifizierungs_timeout: Duration::from_millis(self.auth.verifizierungs_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_clients, 512);
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.netzwerk.ws_pfad, "/");
        assert_eq!(cfg.auth.modus, AuthModus::Keiner);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.validieren(), Ok(()));
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.signaling_bind_adresse(), "0.0.0.0:8080");
        assert_eq!(cfg.observability_bind_adresse(), "0.0.0.0:9300");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Testrelay"
            max_clients = 100

            [relay]
            ziel_diagnose = true

            [auth]
            erforderlich = true
            modus = "statisch"
            tokens = ["abc"]
            verifizierungs_timeout_ms = 250
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Testrelay");
        assert_eq!(cfg.server.max_clients, 100);
        assert_eq!(cfg.auth.modus, AuthModus::Statisch);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.validieren(), Ok(()));

        let relay = cfg.relay_config();
        assert!(relay.ziel_diagnose);
        assert!(relay.auth_erforderlich);
        assert_eq!(relay.verifizierungs_timeout, Duration::from_millis(250));
        assert_eq!(relay.sende_queue, 256);
    }

    #[test]
    fn ws_pfad_wird_geprueft() {
        let mut cfg = ServerConfig::default();
        cfg.netzwerk.ws_pfad = "signal".into();
        assert!(matches!(
            cfg.validieren(),
            Err(ConfigFehler::WsPfadOhneSchraegstrich(_))
        ));
        cfg.netzwerk.ws_pfad = "/stats".into();
        assert_eq!(cfg.validieren(), Err(ConfigFehler::WsPfadReserviert));
    }

    #[test]
    fn auth_modus_braucht_geheimnisse() {
        let mut cfg = ServerConfig::default();
        cfg.auth.modus = AuthModus::Statisch;
        assert_eq!(cfg.validieren(), Err(ConfigFehler::KeineTokens));

        cfg.auth.modus = AuthModus::Jwt;
        cfg.auth.jwt_secret = Some(String::new());
        assert_eq!(cfg.validieren(), Err(ConfigFehler::KeinJwtSecret));
        cfg.auth.jwt_secret = Some("geheim".into());
        assert_eq!(cfg.validieren(), Ok(()));
    }

    #[test]
    fn ungueltiges_log_level() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "laut".into();
        assert!(matches!(cfg.validieren(), Err(ConfigFehler::LogLevel(_))));
    }

    #[test]
    fn vorhandene_datei_wird_gelesen() {
        let pfad = std::env::temp_dir().join(format!("ghostly-test-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[netzwerk]\nport = 9000\n").unwrap();
        let ergebnis = ServerConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).unwrap();

        let (cfg, quelle) = ergebnis.unwrap();
        assert_eq!(quelle, ConfigQuelle::Datei);
        assert_eq!(cfg.netzwerk.port, 9000);
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let (cfg, quelle) = ServerConfig::laden("/nicht/vorhanden/ghostly.toml").unwrap();
        assert_eq!(quelle, ConfigQuelle::Standardwerte);
        assert_eq!(cfg.netzwerk.port, 8080);
    }
}
