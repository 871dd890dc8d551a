use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Secret the hosted auth provider signs session tokens with
static SESSION_SECRET: OnceLock<Vec<u8>> = OnceLock::new();

/// Minimum secret length (256 bits)
const MIN_SECRET_LENGTH: usize = 32;

/// Claims carried by the provider's session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Authenticated user attached to the request after verification
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Initialize the session-token secret from the environment
///
/// # Security
/// Requires the `AUTH_JWT_SECRET` environment variable — the same secret the
/// hosted auth provider signs its tokens with. If it is missing or too
/// short, the application **panics** rather than run with verification
/// disabled. This is intentional fail-secure behavior.
///
/// # Panics
/// Panics if `AUTH_JWT_SECRET` is unset, empty, or shorter than 32 bytes.
pub fn init_session_secret() {
    let secret = std::env::var("AUTH_JWT_SECRET").expect(
        "SECURITY ERROR: AUTH_JWT_SECRET environment variable is not set. \
         Set it to the JWT secret of your auth provider so session tokens \
         can be verified.",
    );

    if secret.len() < MIN_SECRET_LENGTH {
        panic!(
            "SECURITY ERROR: AUTH_JWT_SECRET must be at least {} characters long, found {}. \
             Generate a secure secret with: openssl rand -base64 32",
            MIN_SECRET_LENGTH,
            secret.len()
        );
    }

    SESSION_SECRET
        .set(secret.into_bytes())
        .expect("Session secret already initialized");
    tracing::info!("Session token verification initialized");
}

/// Verify a session token and extract the user it belongs to
pub fn verify_session_token(token: &str) -> Result<AuthUser, String> {
    let secret = SESSION_SECRET
        .get()
        .ok_or_else(|| "session secret not initialized".to_string())?;

    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| e.to_string())?;

    Ok(AuthUser {
        id: data.claims.sub,
        email: data.claims.email,
    })
}

/// Middleware requiring a valid provider session on protected endpoints
pub async fn require_session(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(auth) if auth.starts_with("Bearer ") => {
            let token = &auth[7..];
            match verify_session_token(token) {
                Ok(user) => {
                    request.extensions_mut().insert(user);
                    Ok(next.run(request).await)
                }
                Err(e) => {
                    tracing::warn!("Invalid session token: {}", e);
                    Err(StatusCode::UNAUTHORIZED)
                }
            }
        }
        Some(_) => {
            tracing::warn!("Invalid Authorization header format (expected Bearer token)");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
