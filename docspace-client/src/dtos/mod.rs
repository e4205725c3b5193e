use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::IdentityMetadata;

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub metadata: IdentityMetadata,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// A share request. At least one recipient channel is required; both
/// channels may be used at once and grants are additive.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_share_recipients"))]
pub struct ShareRequest {
    pub document_id: Uuid,

    #[serde(default)]
    pub departments: Vec<String>,

    #[serde(default)]
    pub users: Vec<Uuid>,

    pub message: Option<String>,
}

fn validate_share_recipients(req: &ShareRequest) -> Result<(), ValidationError> {
    if req.departments.is_empty() && req.users.is_empty() {
        return Err(ValidationError::new("recipients")
            .with_message("at least one department or user recipient is required".into()));
    }
    Ok(())
}
