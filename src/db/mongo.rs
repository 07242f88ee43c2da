// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MongoDB client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts and profile pictures)
//! - Stories (wizard steps and per-author listings)

use crate::config::Config;
use crate::db::collections;
use crate::error::AppError;
use crate::models::{Story, StoryUpdate, User};
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};

/// Server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed store.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<User>,
    stories: Collection<Story>,
}

impl MongoStore {
    /// Connect and make sure the indexes the API relies on exist.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.mongo_uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let uri_default = client.default_database().map(|db| db.name().to_string());
        let name = config.database_name(uri_default.as_deref());
        let db = client.database(&name);

        let store = Self {
            users: db.collection(collections::USERS),
            stories: db.collection(collections::STORIES),
        };
        store.ensure_indexes().await?;

        tracing::info!(database = %name, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        let unique_username = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(unique_username).await?;

        let by_author = IndexModel::builder()
            .keys(doc! { "author": 1, "updatedAt": -1 })
            .build();
        self.stories.create_index(by_author).await?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::BadRequest(AppError::USERNAME_TAKEN.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    pub async fn set_profile_pic(
        &self,
        id: ObjectId,
        path: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let update = doc! {
            "$set": {
                "profilePic": path,
                "updatedAt": bson::DateTime::from_chrono(now),
            }
        };
        Ok(self
            .users
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_user(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self.users.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    // ─── Story Operations ────────────────────────────────────────

    pub async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        self.stories.insert_one(story).await?;
        Ok(())
    }

    pub async fn get_story(&self, id: ObjectId) -> Result<Option<Story>, AppError> {
        Ok(self.stories.find_one(doc! { "_id": id }).await?)
    }

    pub async fn update_story(
        &self,
        id: ObjectId,
        update: &StoryUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Story>, AppError> {
        let set = update
            .to_set_document(now)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode update: {}", e)))?;

        Ok(self
            .stories
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn stories_by_author(&self, author: ObjectId) -> Result<Vec<Story>, AppError> {
        let cursor = self
            .stories
            .find(doc! { "author": author })
            .sort(doc! { "updatedAt": -1 })
            .await?;
        let stories: Vec<Story> = cursor.try_collect().await?;
        Ok(stories)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
