//! Database layer (MongoDB, with an in-process store for tests and local runs).

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Story, StoryUpdate, User};
use bson::oid::ObjectId;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const STORIES: &str = "stories";
}

/// Database handle shared by all handlers.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Mongo(MongoStore),
    Memory(Arc<MemoryStore>),
}

impl Database {
    /// Connect to the store selected by `MONGO_URI`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        if config.uses_memory_store() {
            tracing::warn!("Using in-memory store; data is lost on restart");
            return Ok(Self::new_in_memory());
        }

        let store = MongoStore::connect(config).await?;
        Ok(Self {
            backend: Backend::Mongo(store),
        })
    }

    /// Create an empty in-process store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a new user. Fails with `BadRequest` if the username exists.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.insert_user(user).await,
            Backend::Memory(store) => store.insert_user(user),
        }
    }

    pub async fn get_user(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.get_user(id).await,
            Backend::Memory(store) => Ok(store.get_user(id)),
        }
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.find_user_by_username(username).await,
            Backend::Memory(store) => Ok(store.find_user_by_username(username)),
        }
    }

    /// Point a user's profile picture at `path`. Returns the updated user,
    /// or `None` if the user no longer exists.
    pub async fn set_profile_pic(
        &self,
        id: ObjectId,
        path: &str,
    ) -> Result<Option<User>, AppError> {
        let now = crate::time_utils::now_millis();
        match &self.backend {
            Backend::Mongo(store) => store.set_profile_pic(id, path, now).await,
            Backend::Memory(store) => Ok(store.set_profile_pic(id, path, now)),
        }
    }

    /// Remove a user. Stories they authored are left in place.
    pub async fn delete_user(&self, id: ObjectId) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.delete_user(id).await,
            Backend::Memory(store) => Ok(store.delete_user(id)),
        }
    }

    // ─── Story Operations ────────────────────────────────────────

    pub async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.insert_story(story).await,
            Backend::Memory(store) => {
                store.insert_story(story);
                Ok(())
            }
        }
    }

    pub async fn get_story(&self, id: ObjectId) -> Result<Option<Story>, AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.get_story(id).await,
            Backend::Memory(store) => Ok(store.get_story(id)),
        }
    }

    /// Replace one slice of a story. Returns the updated story, or `None`
    /// if it no longer exists. No version check: the last writer wins.
    pub async fn update_story(
        &self,
        id: ObjectId,
        update: StoryUpdate,
    ) -> Result<Option<Story>, AppError> {
        let now = crate::time_utils::now_millis();
        match &self.backend {
            Backend::Mongo(store) => store.update_story(id, &update, now).await,
            Backend::Memory(store) => Ok(store.update_story(id, update, now)),
        }
    }

    /// All stories written by `author`, most recently updated first.
    pub async fn stories_by_author(&self, author: ObjectId) -> Result<Vec<Story>, AppError> {
        match &self.backend {
            Backend::Mongo(store) => store.stories_by_author(author).await,
            Backend::Memory(store) => Ok(store.stories_by_author(author)),
        }
    }
}
