use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::accounts::NewAccount;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{DomainCheckRequest, LoginRequest, RegisterRequest, SessionResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_account_name, validate_email, validate_password};

pub async fn check_domain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DomainCheckRequest>,
) -> impl IntoResponse {
    if req.domain.trim().is_empty() {
        return Err(ApiError::bad_request("domain is required"));
    }

    let availability = state
        .allocator
        .check_availability(&req.domain)
        .api_err("Failed to check domain")?;

    Ok(Json(ApiResponse::success(availability)))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    validate_account_name(&req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let email = req.email.trim().to_lowercase();
    let account = state
        .accounts
        .register(NewAccount {
            name: req.name,
            email: req.email,
            password: req.password,
            preferred_domain: req.domain,
        })
        .map_err(|e| match e {
            Error::AlreadyExists => register_conflict(&state, &email),
            e => ApiError::from(e),
        })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

/// Registration conflicts come from either a taken email or a domain that
/// stayed contended through every allocation retry.
fn register_conflict(state: &AppState, email: &str) -> ApiError {
    match state.store.get_account_by_email(email) {
        Ok(Some(_)) => ApiError::conflict("An account with this email already exists"),
        Ok(None) => ApiError::conflict("Could not reserve a unique domain, please try again"),
        Err(e) => ApiError::from(e),
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let session = state
        .accounts
        .login(&req.email, &req.password)
        .api_err("Failed to log in")?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionResponse {
            token: session.raw,
            expires_at: session.token.expires_at,
            account: session.account,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::store::{SqliteStore, Store};
    use tempfile::TempDir;

    fn state(temp: &TempDir) -> AppState {
        let config = ServerConfig {
            data_dir: temp.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let store = SqliteStore::new(config.db_path()).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        AppState::new(store, config)
    }

    #[test]
    fn test_register_conflict_names_the_cause() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);
        state
            .accounts
            .register(NewAccount {
                name: "Rivera Family".to_string(),
                email: "rivera@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
                preferred_domain: None,
            })
            .unwrap();

        let taken_email = register_conflict(&state, "rivera@example.com");
        assert_eq!(taken_email.status, StatusCode::CONFLICT);
        assert!(taken_email.message.contains("email"));

        let contended_domain = register_conflict(&state, "okafor@example.com");
        assert_eq!(contended_domain.status, StatusCode::CONFLICT);
        assert!(contended_domain.message.contains("domain"));
        assert!(!contended_domain.message.contains("email"));
    }
}
