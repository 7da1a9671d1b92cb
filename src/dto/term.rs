use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::TermEntity, dto::validation::validate_term_value};

/// Payload adding a term to the catalogue.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTermRequest {
    /// Term value; stored lowercased.
    #[validate(length(min = 1, max = 64), custom(function = "validate_term_value"))]
    pub value: String,
}

/// Entry of the term catalogue.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TermResponse {
    /// Catalogue identifier.
    pub id: Uuid,
    /// Lowercased term.
    pub value: String,
}

impl From<TermEntity> for TermResponse {
    fn from(value: TermEntity) -> Self {
        Self {
            id: value.id,
            value: value.value,
        }
    }
}
