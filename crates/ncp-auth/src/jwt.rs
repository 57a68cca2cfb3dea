use std::collections::HashMap;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use ncp_core::models::user::{AdminLevel, Identity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

pub const ADMIN_REQUIRED: &str = "Admin access required";
pub const SUPER_ADMIN_REQUIRED: &str = "Super admin access required";
pub const ACCOUNT_SUSPENDED: &str = "Account suspended";

/// Claims carried by a Cognito ID token. Admin flags are custom
/// attributes, which Cognito serialises as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub token_use: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub username: Option<String>,
    #[serde(default, rename = "custom:is_admin")]
    pub is_admin: Option<String>,
    #[serde(default, rename = "custom:admin_level")]
    pub admin_level: Option<String>,
    #[serde(default, rename = "custom:is_suspended")]
    pub is_suspended: Option<String>,
}

pub fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

impl TokenClaims {
    pub fn identity(&self) -> Identity {
        let is_admin = flag(self.is_admin.as_deref());
        Identity {
            sub: self.sub.clone(),
            email: self.email.clone(),
            is_admin,
            admin_level: if is_admin {
                self.admin_level
                    .as_deref()
                    .and_then(|level| level.parse::<AdminLevel>().ok())
            } else {
                None
            },
            is_suspended: flag(self.is_suspended.as_deref()),
        }
    }
}

enum Keys {
    /// Cognito RS256 keys by `kid`.
    Jwks(HashMap<String, DecodingKey>),
    /// Shared secret for local development.
    Secret(DecodingKey),
}

/// Validates bearer tokens and turns them into an [`Identity`].
pub struct JwtVerifier {
    keys: Keys,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.keys {
            Keys::Jwks(keys) => format!("jwks({} keys)", keys.len()),
            Keys::Secret(_) => "hs256".to_string(),
        };
        f.debug_struct("JwtVerifier").field("keys", &mode).finish()
    }
}

pub fn cognito_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

impl JwtVerifier {
    /// Verify Cognito tokens against the pool's published key set.
    pub fn from_jwks(jwks: &JwkSet, region: &str, user_pool_id: &str) -> Result<Self, AuthError> {
        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            keys.insert(kid, DecodingKey::from_jwk(jwk)?);
        }
        if keys.is_empty() {
            return Err(AuthError::Jwks("key set contains no usable keys".to_string()));
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[cognito_issuer(region, user_pool_id)]);
        validation.validate_aud = false;

        Ok(Self {
            keys: Keys::Jwks(keys),
            validation,
        })
    }

    /// Download the pool's key set and build a verifier from it.
    pub async fn fetch(region: &str, user_pool_id: &str) -> Result<Self, AuthError> {
        let url = format!("{}/.well-known/jwks.json", cognito_issuer(region, user_pool_id));
        debug!(%url, "fetching signing keys");
        let jwks: JwkSet = reqwest::get(&url)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::Jwks(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Jwks(e.to_string()))?;
        Self::from_jwks(&jwks, region, user_pool_id)
    }

    /// HS256 tokens signed with `secret`. Issuer is not checked.
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            keys: Keys::Secret(DecodingKey::from_secret(secret)),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let key = match &self.keys {
            Keys::Secret(key) => key,
            Keys::Jwks(keys) => {
                let header = decode_header(token)?;
                let kid = header
                    .kid
                    .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;
                keys.get(&kid)
                    .ok_or_else(|| AuthError::InvalidToken(format!("unknown key id: {kid}")))?
            }
        };

        let claims = decode::<TokenClaims>(token, key, &self.validation)?.claims;

        match claims.token_use.as_deref() {
            None | Some("access") | Some("id") => {}
            Some(other) => {
                return Err(AuthError::InvalidToken(format!("unexpected token_use: {other}")));
            }
        }

        Ok(claims)
    }

    /// Verify an `Authorization` header value (`Bearer <token>`).
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = authorization.map(str::trim).filter(|h| !h.is_empty()).ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .unwrap_or(header)
            .trim();
        Ok(self.verify(token)?.identity())
    }
}

/// Gate for `/api/admin/*`.
pub fn require_admin(identity: &Identity) -> Result<(), AuthError> {
    if identity.is_suspended {
        return Err(AuthError::Forbidden(ACCOUNT_SUSPENDED.to_string()));
    }
    if !identity.can_access_admin() {
        return Err(AuthError::Forbidden(ADMIN_REQUIRED.to_string()));
    }
    Ok(())
}

/// Gate for role changes.
pub fn require_super_admin(identity: &Identity) -> Result<(), AuthError> {
    require_admin(identity)?;
    if !identity.is_super_admin() {
        return Err(AuthError::Forbidden(SUPER_ADMIN_REQUIRED.to_string()));
    }
    Ok(())
}
