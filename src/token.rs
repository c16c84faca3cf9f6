// HS256 bearer tokens, expiry checked against an explicit clock

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AuthError, SigningError};

pub type SubjectId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(with = "subject_string")]
    pub sub: SubjectId,
    pub iat: u64,
    pub exp: u64,
}

// `sub` is a string on the wire, a number everywhere else
mod subject_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::SubjectId;

    pub fn serialize<S: Serializer>(id: &SubjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SubjectId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// Seconds since the unix epoch
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: SubjectId) -> Result<String, SigningError> {
        self.issue_at(subject, unix_now())
    }

    pub fn issue_at(&self, subject: SubjectId, now: u64) -> Result<String, SigningError> {
        let claims = Claims {
            sub: subject,
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against our own clock in `validate_at`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn validate(&self, header: Option<&str>) -> Result<SubjectId, AuthError> {
        self.validate_at(header, unix_now())
    }

    pub fn validate_at(&self, header: Option<&str>, now: u64) -> Result<SubjectId, AuthError> {
        let header = header.ok_or(AuthError::Missing)?;
        let token = bearer_token(header).ok_or(AuthError::Malformed)?;

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AuthError::BadSignature)?
            .claims;

        if now >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims.sub)
    }
}

// `Bearer <token>`: one space, then a single non-empty word
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return None;
    }
    Some(token)
}
