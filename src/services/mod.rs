// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - password hashing and upload storage.

pub mod password;
pub mod uploads;

pub use uploads::{UploadKind, UploadStore, UploadedFile};
