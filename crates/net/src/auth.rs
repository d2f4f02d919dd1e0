//! Handshake authentication (spec §4.11, §4.12): shared-secret equality or
//! OAuth2 JWT validation. Grounded on the teacher's `http-request` OAuth2
//! token handling for the general shape, enriched with `jsonwebtoken` from
//! the pack since the teacher only forwards tokens and never validates
//! them itself.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use replidb_core::CoreError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub nbf: Option<usize>,
}

pub enum Authenticator {
    SharedSecret { secret: String },
    Jwt { issuer: String, audience: String, decoding_key: DecodingKey, algorithm: Algorithm },
}

impl Authenticator {
    pub fn shared_secret(secret: impl Into<String>) -> Self {
        Self::SharedSecret { secret: secret.into() }
    }

    pub fn jwt_hmac(issuer: impl Into<String>, audience: impl Into<String>, hmac_secret: &[u8]) -> Self {
        Self::Jwt {
            issuer: issuer.into(),
            audience: audience.into(),
            decoding_key: DecodingKey::from_secret(hmac_secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Validates a handshake credential (spec §4.11 step 1). Returns
    /// `Ok(())` on success, `Err(AuthError)` otherwise — never retried
    /// (spec §7).
    pub fn authenticate(&self, credential: &str) -> Result<(), CoreError> {
        match self {
            Authenticator::SharedSecret { secret } => {
                let provided = credential.as_bytes();
                let expected = secret.as_bytes();
                let equal = provided.len() == expected.len() && provided.ct_eq(expected).into();
                if equal {
                    Ok(())
                } else {
                    Err(CoreError::Auth("shared secret mismatch".into()))
                }
            }
            Authenticator::Jwt { issuer, audience, decoding_key, algorithm } => {
                let mut validation = Validation::new(*algorithm);
                validation.set_issuer(&[issuer.as_str()]);
                validation.set_audience(&[audience.as_str()]);
                decode::<JwtClaims>(credential, decoding_key, &validation)
                    .map(|_| ())
                    .map_err(|e| CoreError::Auth(format!("jwt validation failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn shared_secret_accepts_matching_credential() {
        let auth = Authenticator::shared_secret("topsecret");
        assert!(auth.authenticate("topsecret").is_ok());
    }

    #[test]
    fn shared_secret_rejects_mismatched_credential() {
        let auth = Authenticator::shared_secret("topsecret");
        assert!(auth.authenticate("wrong").is_err());
    }

    #[test]
    fn jwt_accepts_well_formed_unexpired_token() {
        let secret = b"hmac-signing-key";
        let claims = JwtClaims {
            sub: "node-b".into(),
            iss: "https://issuer.example".into(),
            aud: "replidb".into(),
            exp: 9_999_999_999,
            nbf: None,
        };
        let token = encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap();

        let auth = Authenticator::jwt_hmac("https://issuer.example", "replidb", secret);
        assert!(auth.authenticate(&token).is_ok());
    }

    #[test]
    fn jwt_rejects_expired_token() {
        let secret = b"hmac-signing-key";
        let claims =
            JwtClaims { sub: "node-b".into(), iss: "https://issuer.example".into(), aud: "replidb".into(), exp: 1, nbf: None };
        let token = encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap();

        let auth = Authenticator::jwt_hmac("https://issuer.example", "replidb", secret);
        assert!(auth.authenticate(&token).is_err());
    }
}
