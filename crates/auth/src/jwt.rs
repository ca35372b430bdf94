//! JWT-Verifikation (HS256)
//!
//! Geprueft werden:
//! - `alg` muss `HS256` sein
//! - HMAC-SHA256-Signatur mit dem gemeinsamen Geheimnis
//! - `exp` / `nbf` gegen die aktuelle Zeit, ohne Toleranz
//! - `iss` falls ein Aussteller konfiguriert ist (dann Pflicht)

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::verifier::TokenVerifier;

/// Claims die der Verifier auswertet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Prueft HS256-signierte JWTs mit einem gemeinsamen Geheimnis
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    aussteller: Option<String>,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("aussteller", &self.aussteller)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Erstellt einen Verifier; ein leeres Geheimnis ist ein Konfigurationsfehler
    pub fn neu(geheimnis: &[u8], aussteller: Option<String>) -> AuthResult<Self> {
        if geheimnis.is_empty() {
            return Err(AuthError::Konfiguration("JWT-Geheimnis ist leer".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        match aussteller {
            Some(ref iss) => {
                validation.set_issuer(&[iss]);
                validation.set_required_spec_claims(&["iss"]);
            }
            // exp ist optional
            None => validation.set_required_spec_claims::<&str>(&[]),
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(geheimnis),
            encoding_key: EncodingKey::from_secret(geheimnis),
            validation,
            aussteller,
        })
    }

    /// Prueft ein Token vollstaendig und gibt die Claims zurueck
    pub fn pruefen(&self, token: &str) -> AuthResult<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|daten| daten.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::SignaturUngueltig,
                ErrorKind::ExpiredSignature => AuthError::TokenAbgelaufen,
                ErrorKind::ImmatureSignature => AuthError::TokenNochNichtGueltig,
                ErrorKind::InvalidIssuer => AuthError::FalscherAussteller,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => {
                    AuthError::FalscherAussteller
                }
                ErrorKind::InvalidAlgorithm => {
                    AuthError::AlgorithmusNichtUnterstuetzt(e.to_string())
                }
                _ => AuthError::format(e.to_string()),
            })
    }

    /// Signiert Claims mit dem konfigurierten Geheimnis
    pub fn signieren(&self, claims: &JwtClaims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::format(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verifizieren(&self, token: &str) -> AuthResult<bool> {
        match self.pruefen(token) {
            Ok(claims) => {
                tracing::debug!(sub = ?claims.sub, "JWT akzeptiert");
                Ok(true)
            }
            Err(e) => {
                tracing::debug!(fehler = %e, "JWT abgelehnt");
                Ok(false)
            }
        }
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use chrono::Utc;

    fn verifier() -> JwtVerifier {
        JwtVerifier::neu(b"test-geheimnis", None).unwrap()
    }

    fn claims_in(sekunden: i64) -> JwtClaims {
        JwtClaims {
            sub: Some("did:example:alice".into()),
            exp: Some(Utc::now().timestamp() + sekunden),
            ..Default::default()
        }
    }

    #[test]
    fn gueltiges_token() {
        let v = verifier();
        let token = v.signieren(&claims_in(60)).unwrap();
        let claims = v.pruefen(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("did:example:alice"));
    }

    #[test]
    fn token_ohne_exp_wird_akzeptiert() {
        let v = verifier();
        let token = v
            .signieren(&JwtClaims {
                sub: Some("bob".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(v.pruefen(&token).is_ok());
    }

    #[test]
    fn fremdes_geheimnis_abgelehnt() {
        let fremd = JwtVerifier::neu(b"anderes-geheimnis", None).unwrap();
        let token = fremd.signieren(&claims_in(60)).unwrap();
        assert!(matches!(
            verifier().pruefen(&token),
            Err(AuthError::SignaturUngueltig)
        ));
    }

    #[test]
    fn manipulierte_nutzlast_abgelehnt() {
        let v = verifier();
        let token = v.signieren(&claims_in(60)).unwrap();
        let teile: Vec<&str> = token.split('.').collect();
        let falsch = URL_SAFE_NO_PAD.encode(br#"{"sub":"mallory"}"#);
        let manipuliert = format!("{}.{}.{}", teile[0], falsch, teile[2]);
        assert!(matches!(
            v.pruefen(&manipuliert),
            Err(AuthError::SignaturUngueltig)
        ));
    }

    #[test]
    fn abgelaufenes_token() {
        let v = verifier();
        let token = v.signieren(&claims_in(-10)).unwrap();
        assert!(matches!(v.pruefen(&token), Err(AuthError::TokenAbgelaufen)));
    }

    #[test]
    fn nbf_in_der_zukunft() {
        let v = verifier();
        let claims = JwtClaims {
            nbf: Some(Utc::now().timestamp() + 3600),
            ..Default::default()
        };
        let token = v.signieren(&claims).unwrap();
        assert!(matches!(
            v.pruefen(&token),
            Err(AuthError::TokenNochNichtGueltig)
        ));
    }

    #[test]
    fn aussteller_wird_geprueft() {
        let v = JwtVerifier::neu(b"test-geheimnis", Some("ghostly".into())).unwrap();
        let ohne = v.signieren(&claims_in(60)).unwrap();
        assert!(matches!(v.pruefen(&ohne), Err(AuthError::FalscherAussteller)));

        let fremd = v
            .signieren(&JwtClaims {
                iss: Some("jemand".into()),
                ..claims_in(60)
            })
            .unwrap();
        assert!(matches!(v.pruefen(&fremd), Err(AuthError::FalscherAussteller)));

        let mit = v
            .signieren(&JwtClaims {
                iss: Some("ghostly".into()),
                ..claims_in(60)
            })
            .unwrap();
        assert!(v.pruefen(&mit).is_ok());
    }

    #[test]
    fn falsches_format() {
        let v = verifier();
        assert!(matches!(v.pruefen("abc"), Err(AuthError::TokenFormat(_))));
        assert!(matches!(v.pruefen("a.b.c.d"), Err(AuthError::TokenFormat(_))));
        assert!(matches!(v.pruefen("!!.??.##"), Err(AuthError::TokenFormat(_))));
    }

    #[test]
    fn anderer_algorithmus_abgelehnt() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims_in(60),
            &EncodingKey::from_secret(b"test-geheimnis"),
        )
        .unwrap();
        assert!(matches!(
            verifier().pruefen(&token),
            Err(AuthError::AlgorithmusNichtUnterstuetzt(_))
        ));
    }

    #[test]
    fn unsigniertes_token_abgelehnt() {
        let kopf = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let nutzlast = URL_SAFE_NO_PAD.encode(br#"{"covenant":"x"}"#);
        let token = format!("{kopf}.{nutzlast}.");
        assert!(verifier().pruefen(&token).is_err());
    }

    #[test]
    fn leeres_geheimnis_ist_konfigurationsfehler() {
        assert!(matches!(
            JwtVerifier::neu(b"", None),
            Err(AuthError::Konfiguration(_))
        ));
    }

    #[tokio::test]
    async fn trait_liefert_bool() {
        let v = verifier();
        let token = v.signieren(&claims_in(60)).unwrap();
        assert!(v.verifizieren(&token).await.unwrap());
        assert!(!v.verifizieren("kaputt").await.unwrap());
    }
}
