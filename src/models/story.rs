// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Story model with embedded characters and chapters.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

const DEFAULT_CHAPTER_TITLE: &str = "Untitled Chapter";

/// Story document stored in the `stories` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning user
    pub author: ObjectId,
    /// Stored only; no endpoint reads or writes it yet.
    #[serde(default)]
    pub collaborators: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_page_url: Option<String>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// A fresh private story with no characters or chapters.
    pub fn new(
        title: String,
        genre: Option<String>,
        description: Option<String>,
        author: ObjectId,
    ) -> Self {
        let now = crate::time_utils::now_millis();
        Self {
            id: ObjectId::new(),
            title,
            genre,
            description,
            author,
            collaborators: Vec::new(),
            cover_page_url: None,
            characters: Vec::new(),
            chapters: Vec::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_author(&self, user_id: &ObjectId) -> bool {
        self.author == *user_id
    }

    /// Readable by its author, or by anyone once public.
    pub fn is_visible_to(&self, user_id: &ObjectId) -> bool {
        self.is_public || self.is_author(user_id)
    }

    /// Apply a step update in place and bump `updated_at`.
    pub fn apply(&mut self, update: StoryUpdate, now: DateTime<Utc>) {
        match update {
            StoryUpdate::Cover {
                title,
                cover_page_url,
            } => {
                if let Some(title) = title {
                    self.title = title;
                }
                if let Some(url) = cover_page_url {
                    self.cover_page_url = Some(url);
                }
            }
            StoryUpdate::Characters(characters) => self.characters = characters,
            StoryUpdate::Chapters(chapters) => self.chapters = chapters,
        }
        self.updated_at = now;
    }
}

/// Role of a character within the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CharacterCategory {
    Lead,
    Supporting,
    Background,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Character {
    #[validate(custom(function = "not_blank", message = "Character name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
    pub category: CharacterCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Chapter {
    #[serde(default = "default_chapter_title", alias = "title")]
    pub chapter_title: String,
    #[serde(default, alias = "content")]
    pub chapter_content: String,
}

fn default_chapter_title() -> String {
    DEFAULT_CHAPTER_TITLE.to_string()
}

/// Rejects empty or whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// One slice of a story replaced by a wizard step.
#[derive(Debug, Clone)]
pub enum StoryUpdate {
    /// Step 1: title and/or cover image. `None` leaves the field as is.
    Cover {
        title: Option<String>,
        cover_page_url: Option<String>,
    },
    /// Step 2: characters, replaced wholesale.
    Characters(Vec<Character>),
    /// Step 3: chapters, replaced wholesale.
    Chapters(Vec<Chapter>),
}

impl StoryUpdate {
    /// `$set` document touching only this slice plus `updatedAt`.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Result<Document, bson::ser::Error> {
        let mut set = doc! { "updatedAt": bson::DateTime::from_chrono(now) };
        match self {
            StoryUpdate::Cover {
                title,
                cover_page_url,
            } => {
                if let Some(title) = title {
                    set.insert("title", title.as_str());
                }
                if let Some(url) = cover_page_url {
                    set.insert("coverPageUrl", url.as_str());
                }
            }
            StoryUpdate::Characters(characters) => {
                set.insert("characters", bson::to_bson(characters)?);
            }
            StoryUpdate::Chapters(chapters) => {
                set.insert("chapters", bson::to_bson(chapters)?);
            }
        }
        Ok(set)
    }
}
