use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

/// Claims issued by the session service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}

/// Authenticated caller, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Validate an HS256 bearer token against `JWT_SECRET`.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Bearer-token authentication middleware.
///
/// Every protected request must carry `Authorization: Bearer <jwt>`.
/// The decoded claims become an [`AuthContext`] extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return reject(StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header");
    };

    match decode_token(token, &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthContext::from(claims));
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "JWT validation failed");
            reject(StatusCode::UNAUTHORIZED, "Invalid token")
        }
    }
}

/// Admin gate. Must run after [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<AuthContext>() {
        Some(auth) if auth.is_admin() => next.run(req).await,
        Some(auth) => {
            tracing::warn!(user_id = %auth.user_id, "Non-admin user attempted to access admin endpoint");
            reject(StatusCode::FORBIDDEN, "Admin role required")
        }
        None => reject(StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Option<&str>) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: Some("f@example.com".into()),
            role: role.map(String::from),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_roundtrip_and_role() {
        let claims = decode_token(&token("s3cret", Some("admin")), "s3cret").unwrap();
        assert!(AuthContext::from(claims).is_admin());

        let claims = decode_token(&token("s3cret", None), "s3cret").unwrap();
        assert!(!AuthContext::from(claims).is_admin());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        assert!(decode_token(&token("s3cret", None), "other").is_err());
    }
}
