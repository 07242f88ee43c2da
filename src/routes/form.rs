// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request body extractors shared by the route modules.

use crate::error::AppError;
use crate::services::UploadedFile;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form, Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// JSON body whose rejections become `400` responses with the usual error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Text fields plus at most one file, read from a multipart, JSON or
/// urlencoded body.
///
/// Endpoints that take an optional image accept plain JSON too, so clients
/// can update text fields without building a multipart request.
#[derive(Debug, Default)]
pub struct FormInput {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl FormInput {
    /// Read the body. Only `file_field` may carry a file.
    pub async fn from_request(request: Request, file_field: &str) -> Result<Self, AppError> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, &()).await?;
            Self::from_multipart(multipart, file_field).await
        } else if content_type.starts_with("application/json") {
            let Json(object) =
                Json::<serde_json::Map<String, Value>>::from_request(request, &()).await?;
            Self::from_json(object)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &()).await?;
            Ok(Self { fields, file: None })
        } else {
            Ok(Self::default())
        }
    }

    async fn from_multipart(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut input = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    if name != file_field {
                        return Err(AppError::BadRequest(format!(
                            "Unexpected file field '{}'",
                            name
                        )));
                    }
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    input.file = Some(UploadedFile { file_name, data });
                }
                None => {
                    let text = field.text().await?;
                    input.fields.insert(name, text);
                }
            }
        }

        Ok(input)
    }

    fn from_json(object: serde_json::Map<String, Value>) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        for (key, value) in object {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::BadRequest(format!(
                        "Field '{}' must be a string",
                        key
                    )))
                }
            };
            fields.insert(key, text);
        }
        Ok(Self { fields, file: None })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value trimmed, with blank treated as absent.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }
}
