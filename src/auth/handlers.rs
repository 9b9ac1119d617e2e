use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginForm, MessageResponse, RefreshRequest, TokenResponse},
        jwt::{AuthUser, JwtKeys},
    },
    state::AppState,
    users::{
        dto::{CreateUserRequest, UserResponse},
        handlers::require_fields,
        repo_types::User,
        services,
    },
    validation::ProfileUpdate,
};

type ApiError = (StatusCode, String);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/verify-email/:user_id/:token", get(verify_email))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = services::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = services::login_user(&state, &form.username, &form.password).await?;
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        (StatusCode::UNAUTHORIZED, e.to_string())
    })?;

    // Role may have changed since the refresh token was issued
    let user = services::get_user(&state, claims.sub).await.map_err(|_| {
        (StatusCode::UNAUTHORIZED, "User not found".to_string())
    })?;
    if user.is_locked {
        return Err((StatusCode::BAD_REQUEST, "Account locked".into()));
    }
    Ok(Json(issue_tokens(&keys, &user)?))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(Uuid, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::verify_email(&state, user_id, &token).await?;
    Ok(Json(MessageResponse {
        message: "Email verified successfully",
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = services::get_user(&state, auth.id).await.map_err(|e| {
        error!(error = %e, user_id = %auth.id, "user not found");
        (StatusCode::UNAUTHORIZED, "User not found".to_string())
    })?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, update))]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    require_fields(&update)?;
    let user = services::update_user(&state, auth.id, &update).await?;
    Ok(Json(user.into()))
}

fn issue_tokens(keys: &JwtKeys, user: &User) -> Result<TokenResponse, ApiError> {
    let sign_err = |e: anyhow::Error| {
        error!(error = %e, "jwt sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };
    let access_token = keys.sign_access(user.id, user.role).map_err(sign_err)?;
    let refresh_token = keys.sign_refresh(user.id, user.role).map_err(sign_err)?;
    info!(user_id = %user.id, "tokens issued");
    Ok(TokenResponse::bearer(access_token, refresh_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, users::repo_types::UserRole};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use tower::ServiceExt;

    async fn send(req: Request<Body>) -> (StatusCode, String) {
        let app = build_app(AppState::fake());
        let res = app.oneshot(req).await.expect("router never fails");
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn bearer(role: UserRole) -> String {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let token = keys.sign_access(Uuid::new_v4(), role).expect("sign access");
        format!("Bearer {token}")
    }

    fn json(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        assert_eq!(send(req).await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn register_rejects_weak_password_without_echoing_it() {
        let body = r#"{"username":"jdoe","email":"john.doe@example.com","password":"lowercase-only1"}"#;
        let (status, msg) = send(json("POST", "/api/v1/auth/register", body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(msg, "password must contain at least one uppercase character");
        assert!(!msg.contains("lowercase-only1"));
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let body = r#"{"username":"jdoe","email":"john.doe.example.com","password":"Secure*Pass123"}"#;
        let (status, msg) = send(json("POST", "/api/v1/auth/register", body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(msg, "email is malformed");
    }

    #[tokio::test]
    async fn login_with_malformed_email_is_unauthorized() {
        let req = Request::post("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=not-an-email&password=Secure*Pass123"))
            .unwrap();
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_refuses_access_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let access = keys.sign_access(Uuid::new_v4(), UserRole::Admin).unwrap();
        let body = format!(r#"{{"refresh_token":"{access}"}}"#);
        let (status, msg) = send(json("POST", "/api/v1/auth/refresh", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(msg.contains("not a refresh token"));
    }

    #[tokio::test]
    async fn me_requires_token() {
        let req = Request::get("/api/v1/me").body(Body::empty()).unwrap();
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_refuses_refresh_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let refresh = keys.sign_refresh(Uuid::new_v4(), UserRole::Admin).unwrap();
        let req = Request::get("/api/v1/me")
            .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
            .body(Body::empty())
            .unwrap();
        let (status, msg) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(msg, "Access token required");
    }

    #[tokio::test]
    async fn empty_profile_update_is_rejected() {
        let mut req = json("PATCH", "/api/v1/me", "{}");
        req.headers_mut().insert(
            header::AUTHORIZATION,
            bearer(UserRole::Authenticated).parse().unwrap(),
        );
        let (status, msg) = send(req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(msg.contains("At least one field"));
    }

    #[tokio::test]
    async fn user_management_is_staff_only() {
        let req = Request::get("/api/v1/users")
            .header(header::AUTHORIZATION, bearer(UserRole::Authenticated))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
