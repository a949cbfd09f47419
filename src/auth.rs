use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    collections::USERS,
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::{Role, User},
    repository::{Document, Filter, RepositoryState},
};

/// Claims
///
/// Payload of the bearer tokens issued by `POST /api/auth/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id.
    pub sub: String,
    /// The role at issue time. Informational only; the extractor re-reads the role
    /// from the store so demotions apply immediately.
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// issue_token
///
/// Signs an HS256 token for `user`, valid for `config.jwt_expire_minutes`.
pub fn issue_token(user: &User, config: &AppConfig) -> ApiResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        iat: now as usize,
        exp: (now + config.jwt_expire_minutes * 60) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// verify_password
///
/// An unparsable stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Decodes a stored user document. Malformed records are treated as missing.
pub fn user_from_document(doc: Document) -> Option<User> {
    match serde_json::from_value(Value::Object(doc)) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!("skipping malformed user record: {}", e);
            None
        }
    }
}

pub async fn find_user(repo: &RepositoryState, filter: &Filter) -> ApiResult<Option<User>> {
    Ok(repo.find_one(USERS, filter).await?.and_then(user_from_document))
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_superadmin(&self) -> ApiResult<()> {
        match self.role {
            Role::Superadmin => Ok(()),
            Role::Admin => Err(ApiError::Forbidden(
                "Only superadmin can manage users".to_string(),
            )),
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reads the `Authorization: Bearer <token>` header, validates the token signature
/// and expiry, then loads the user from the store. A token whose user was deleted
/// is rejected like an invalid one.
///
/// When `auth_middleware` already resolved the user for this request, the cached
/// identity in the request extensions is reused.
///
/// Rejection: `StatusCode::UNAUTHORIZED` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("rejected bearer token: {:?}", e.kind());
            StatusCode::UNAUTHORIZED
        })?;

        let user = find_user(&repo, &Filter::by_id(&token_data.claims.sub))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

/// ensure_bootstrap_admin
///
/// Creates the first superadmin from `ADMIN_USERNAME` / `ADMIN_PASSWORD` when the
/// user collection is empty. Returns whether an account was created.
pub async fn ensure_bootstrap_admin(repo: &RepositoryState, config: &AppConfig) -> ApiResult<bool> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
    else {
        return Ok(false);
    };

    if repo.count(USERS, &Filter::new()).await? > 0 {
        return Ok(false);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        password_hash: hash_password(password)?,
        role: Role::Superadmin,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    store_user(repo, &user).await?;

    tracing::info!("bootstrap superadmin '{}' created", username);
    Ok(true)
}

pub async fn store_user(repo: &RepositoryState, user: &User) -> ApiResult<()> {
    let Value::Object(doc) = serde_json::to_value(user)
        .map_err(|e| ApiError::Internal(format!("failed to encode user: {e}")))?
    else {
        return Err(ApiError::Internal("user did not encode to an object".to_string()));
    };
    repo.insert(USERS, doc).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let config = AppConfig::default();
        let user = User {
            id: "u-1".to_string(),
            username: "editor".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: String::new(),
        };
        let token = issue_token(&user, &config).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "u-1");
        assert_eq!(data.claims.role, Role::Admin);
        assert_eq!(data.claims.exp - data.claims.iat, 60 * 60);
    }
}
