// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story routes: creation, the three wizard steps, and reads.
//!
//! All routes here require authentication; the middleware is applied in
//! routes/mod.rs.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Chapter, Character, Story, StoryUpdate};
use crate::routes::form::{AppJson, FormInput};
use crate::services::UploadKind;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const COVER_PAGE_FIELD: &str = "coverPage";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_story))
        .route("/{story_id}/step1", put(update_cover))
        .route("/{story_id}/step2", put(update_characters))
        .route("/{story_id}/step3", put(update_chapters))
        .route("/story/{story_id}", get(get_story))
        .route("/mystories", get(my_stories))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StoryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author's user id
    pub author: String,
    pub collaborators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_page_url: Option<String>,
    pub characters: Vec<Character>,
    pub chapters: Vec<Chapter>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Story> for StoryResponse {
    fn from(story: &Story) -> Self {
        Self {
            id: story.id.to_hex(),
            title: story.title.clone(),
            genre: story.genre.clone(),
            description: story.description.clone(),
            author: story.author.to_hex(),
            collaborators: story.collaborators.iter().map(|id| id.to_hex()).collect(),
            cover_page_url: story.cover_page_url.clone(),
            characters: story.characters.clone(),
            chapters: story.chapters.clone(),
            is_public: story.is_public,
            created_at: format_utc_rfc3339(story.created_at),
            updated_at: format_utc_rfc3339(story.updated_at),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────

/// Story ids are 24-character hex ObjectIds.
fn parse_story_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw)
        .map_err(|_| AppError::BadRequest(AppError::INVALID_STORY_ID.to_string()))
}

/// Load a story the caller is allowed to modify.
async fn load_authored_story(state: &AppState, id: ObjectId, user: &AuthUser) -> Result<Story> {
    let story = state
        .db
        .get_story(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Story not found".to_string()))?;

    if !story.is_author(&user.user_id) {
        tracing::warn!(
            story_id = %id,
            user_id = %user.user_id,
            "Rejected story update from non-author"
        );
        return Err(AppError::Forbidden(
            "Forbidden: You are not the author of this story".to_string(),
        ));
    }

    Ok(story)
}

/// Apply an update, mapping a story deleted mid-request to 404.
async fn apply_update(state: &AppState, id: ObjectId, update: StoryUpdate) -> Result<Story> {
    state
        .db
        .update_story(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Story not found".to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateStoryRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::models::story::not_blank", message = "Title is required"))]
    title: String,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Create a story owned by the caller. Only the title is required.
async fn create_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(request): AppJson<CreateStoryRequest>,
) -> Result<(StatusCode, Json<StoryResponse>)> {
    request.validate()?;

    let story = Story::new(
        request.title.trim().to_string(),
        non_empty(request.genre),
        non_empty(request.description),
        user.user_id,
    );
    state.db.insert_story(&story).await?;

    tracing::info!(story_id = %story.id, author = %user.user_id, "Story created");

    Ok((StatusCode::CREATED, Json(StoryResponse::from(&story))))
}

// ─── Step 1: title and cover ─────────────────────────────────

/// Update the title and/or cover image.
///
/// Accepts multipart (`title`, `coverPage`) or a JSON body with just a title.
/// The previous cover file is removed once the new one is recorded.
async fn update_cover(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<String>,
    request: Request,
) -> Result<Json<StoryResponse>> {
    let id = parse_story_id(&story_id)?;
    let mut form = FormInput::from_request(request, COVER_PAGE_FIELD).await?;

    let story = load_authored_story(&state, id, &user).await?;

    let title = match form.text("title") {
        Some(raw) if raw.trim().is_empty() => {
            return Err(AppError::BadRequest("Title cannot be empty".to_string()))
        }
        Some(raw) => Some(raw.trim().to_string()),
        None => None,
    };
    let cover = form.take_file();
    if let Some(file) = &cover {
        state.uploads.validate(file)?;
    }

    let new_cover_url = match &cover {
        Some(file) => Some(state.uploads.save(UploadKind::CoverPage, file).await?),
        None => None,
    };

    let update = StoryUpdate::Cover {
        title,
        cover_page_url: new_cover_url.clone(),
    };
    let updated = match apply_update(&state, id, update).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(url) = &new_cover_url {
                state.uploads.remove(url).await;
            }
            return Err(e);
        }
    };

    if let (Some(new_url), Some(old_url)) = (&new_cover_url, &story.cover_page_url) {
        if new_url != old_url {
            state.uploads.remove(old_url).await;
        }
    }

    tracing::info!(
        story_id = %id,
        cover_replaced = new_cover_url.is_some(),
        "Story step 1 saved"
    );

    Ok(Json(StoryResponse::from(&updated)))
}

// ─── Step 2: characters ──────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CharactersRequest {
    #[validate(nested)]
    characters: Vec<Character>,
}

/// Replace the story's characters wholesale.
async fn update_characters(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<String>,
    AppJson(request): AppJson<CharactersRequest>,
) -> Result<Json<StoryResponse>> {
    let id = parse_story_id(&story_id)?;

    load_authored_story(&state, id, &user).await?;
    request.validate()?;

    let count = request.characters.len();
    let updated = apply_update(&state, id, StoryUpdate::Characters(request.characters)).await?;

    tracing::info!(story_id = %id, characters = count, "Story step 2 saved");

    Ok(Json(StoryResponse::from(&updated)))
}

// ─── Step 3: chapters ────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChaptersRequest {
    chapters: Vec<Chapter>,
}

/// Replace the story's chapters wholesale.
async fn update_chapters(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<String>,
    AppJson(request): AppJson<ChaptersRequest>,
) -> Result<Json<StoryResponse>> {
    let id = parse_story_id(&story_id)?;

    load_authored_story(&state, id, &user).await?;

    let count = request.chapters.len();
    let updated = apply_update(&state, id, StoryUpdate::Chapters(request.chapters)).await?;

    tracing::info!(story_id = %id, chapters = count, "Story step 3 saved");

    Ok(Json(StoryResponse::from(&updated)))
}

// ─── Reads ───────────────────────────────────────────────────

/// Fetch one story. Visible to its author, or to anyone once public.
async fn get_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<String>,
) -> Result<Json<StoryResponse>> {
    let id = parse_story_id(&story_id)?;

    let story = state
        .db
        .get_story(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Story not found".to_string()))?;

    if !story.is_visible_to(&user.user_id) {
        return Err(AppError::Forbidden(
            "Forbidden: You are not authorized to access this story".to_string(),
        ));
    }

    Ok(Json(StoryResponse::from(&story)))
}

/// List the caller's stories, most recently updated first.
async fn my_stories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<StoryResponse>>> {
    tracing::debug!(user_id = %user.user_id, "Fetching stories");

    let stories = state.db.stories_by_author(user.user_id).await?;
    Ok(Json(stories.iter().map(StoryResponse::from).collect()))
}
