// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod story;
pub mod user;

pub use story::{Chapter, Character, CharacterCategory, Story, StoryUpdate};
pub use user::{Role, User};
