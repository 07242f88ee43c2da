// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, login and profile management.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{Role, User};
use crate::routes::form::{AppJson, FormInput};
use crate::services::password::{hash_password, verify_password};
use crate::services::UploadKind;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

const PROFILE_PIC_FIELD: &str = "profilePic";

/// Routes that do not need a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Routes mounted behind `require_auth` in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/picture", put(update_profile_picture))
}

// ─── Responses ───────────────────────────────────────────────

/// User as returned to clients; the password hash is never included.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            username: user.username.clone(),
            profile_pic: user.profile_pic.clone(),
            role: user.role,
            created_at: format_utc_rfc3339(user.created_at),
            updated_at: format_utc_rfc3339(user.updated_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfilePictureResponse {
    pub message: String,
    pub user: UserResponse,
}

// ─── Signup ──────────────────────────────────────────────────

/// Register a new account.
///
/// Takes `name`, `username`, `password`, `role` and an optional `profilePic`
/// image as multipart form data; JSON and urlencoded bodies work for signups
/// without a picture.
async fn signup(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let mut form = FormInput::from_request(request, PROFILE_PIC_FIELD).await?;

    let (username, password) = match (form.non_blank("username"), form.text("password")) {
        (Some(username), Some(password)) if !password.is_empty() => {
            (username.to_string(), password.to_string())
        }
        _ => {
            return Err(AppError::BadRequest(
                "Username and password are required".to_string(),
            ))
        }
    };
    let name = form.non_blank("name").unwrap_or_default().to_string();
    let role = match form.non_blank("role") {
        Some(raw) => raw.parse::<Role>().map_err(AppError::BadRequest)?,
        None => Role::default(),
    };

    let picture = form.take_file();
    if let Some(file) = &picture {
        state.uploads.validate(file)?;
    }

    if state.db.find_user_by_username(&username).await?.is_some() {
        tracing::info!(username = %username, "Signup rejected: username taken");
        return Err(AppError::BadRequest(AppError::USERNAME_TAKEN.to_string()));
    }

    let password_hash = hash_password(password, state.config.bcrypt_cost).await?;
    let mut user = User::new(name, username, password_hash, role);

    if let Some(file) = &picture {
        user.profile_pic = Some(
            state
                .uploads
                .save(UploadKind::ProfilePicture, file)
                .await?,
        );
    }

    // The unique index still catches a signup racing past the check above.
    if let Err(e) = state.db.insert_user(&user).await {
        if let Some(path) = &user.profile_pic {
            state.uploads.remove(path).await;
        }
        return Err(e);
    }

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        role = ?user.role,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully!".to_string(),
        }),
    ))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    password: String,
}

/// Verify credentials and issue a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    request.validate()?;

    let user = state
        .db
        .find_user_by_username(request.username.trim())
        .await?
        .ok_or_else(|| {
            tracing::info!(username = %request.username, "Login failed: unknown user");
            AppError::BadRequest("User not found".to_string())
        })?;

    if !verify_password(request.password, user.password.clone()).await? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = create_jwt(
        user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

// ─── Profile ─────────────────────────────────────────────────

/// Get the authenticated user's profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Replace the profile picture with the uploaded `profilePic` image.
async fn update_profile_picture(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    request: Request,
) -> Result<Json<ProfilePictureResponse>> {
    let mut form = FormInput::from_request(request, PROFILE_PIC_FIELD).await?;
    let file = form
        .take_file()
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let previous = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        .profile_pic;

    let new_path = state
        .uploads
        .save(UploadKind::ProfilePicture, &file)
        .await?;

    let user = match state.db.set_profile_pic(auth.user_id, &new_path).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.uploads.remove(&new_path).await;
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            state.uploads.remove(&new_path).await;
            return Err(e);
        }
    };

    if let Some(old_path) = previous.filter(|old| *old != new_path) {
        state.uploads.remove(&old_path).await;
    }

    tracing::info!(user_id = %user.id, path = %new_path, "Profile picture updated");

    Ok(Json(ProfilePictureResponse {
        message: "Profile picture updated successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}
