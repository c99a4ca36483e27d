use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const MODERATOR_ROLES: [&str; 2] = ["ADMIN", "SUPER_ADMIN"];

/// Claims carried by back-office tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl AdminClaims {
    pub fn is_admin(&self) -> bool {
        MODERATOR_ROLES.contains(&self.role.as_str())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Guards the moderation routes: 401 without a valid HS256 token, 403 for
/// non-admin roles. Valid claims are handed to the handler as an extension.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AppError::AuthenticationError)?;

    let claims = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!("Rejected moderation token: {}", e);
        AppError::AuthenticationError
    })?
    .claims;

    if !claims.is_admin() {
        tracing::warn!("User {} with role {} tried to reach moderation", claims.sub, claims.role);
        return Err(AppError::AuthorizationError);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> AdminClaims {
        AdminClaims { sub: "u1".to_string(), email: None, role: role.to_string(), exp: 0 }
    }

    #[test]
    fn test_moderator_roles() {
        assert!(claims("ADMIN").is_admin());
        assert!(claims("SUPER_ADMIN").is_admin());
        assert!(!claims("ADVERTISER").is_admin());
        assert!(!claims("admin").is_admin());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
