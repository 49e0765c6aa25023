//! Schema checks for create requests.
//!
//! A request body is untrusted JSON. It becomes a [`NewPhoto`] only after every
//! field passes; otherwise the caller gets the full list of failing fields so a
//! form can flag each one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::model::NewPhoto;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Keys leading to the failing value; empty for the body itself
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self { path: vec![field.to_string()], message: message.into() }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self { path: Vec::new(), message: message.into() }
    }
}

/// Create input as the client sent it. Unknown fields are ignored.
#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct CreatePhotoRequest {
    #[validate(required(message = "Required"), url(message = "Please enter a valid URL"))]
    pub url: Option<String>,

    #[validate(required(message = "Required"), length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(required(message = "Required"), length(min = 1, message = "Date is required"))]
    pub date: Option<String>,

    pub location: Option<String>,
}

// Order errors are reported in
const FIELDS: [&str; 5] = ["url", "title", "description", "date", "location"];

impl CreatePhotoRequest {
    pub fn into_new_photo(self) -> Result<NewPhoto, Vec<FieldError>> {
        self.validate().map_err(|errors| field_errors(&errors))?;

        match (self.url, self.title, self.date) {
            (Some(url), Some(title), Some(date)) => Ok(NewPhoto {
                url,
                title,
                description: self.description,
                date,
                location: self.location,
            }),
            // `required` already rejected these
            _ => Err(vec![FieldError::body("Required")]),
        }
    }
}

/// Validates a raw JSON body.
pub fn parse_new_photo(body: &[u8]) -> Result<NewPhoto, Vec<FieldError>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| vec![FieldError::body(format!("Invalid JSON: {}", e))])?;

    if !value.is_object() {
        return Err(vec![FieldError::body("Expected object")]);
    }

    let request: CreatePhotoRequest = serde_json::from_value(value)
        .map_err(|e| vec![FieldError::body(e.to_string())])?;

    request.into_new_photo()
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let by_field = errors.field_errors();

    FIELDS
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                FieldError::new(field, message)
            })
        })
        .collect()
}
