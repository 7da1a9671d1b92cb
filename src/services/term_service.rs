use tracing::info;
use uuid::Uuid;

use crate::{
    dto::term::{CreateTermRequest, TermResponse},
    error::ServiceError,
    state::SharedState,
};

/// List the whole term catalogue.
pub async fn list_terms(state: &SharedState) -> Result<Vec<TermResponse>, ServiceError> {
    let stores = state.require_stores().await?;
    let terms = stores.terms.list_terms().await?;
    Ok(terms.into_iter().map(Into::into).collect())
}

/// Add a term, returning the existing entry when the value is already catalogued.
pub async fn add_term(
    state: &SharedState,
    request: CreateTermRequest,
) -> Result<TermResponse, ServiceError> {
    let value = request.value.trim().to_lowercase();
    if value.is_empty() {
        return Err(ServiceError::InvalidInput("term must not be blank".into()));
    }

    let stores = state.require_stores().await?;
    let term = stores.terms.add_term(value).await?;
    info!(term_id = %term.id, value = %term.value, "term added to catalogue");
    Ok(term.into())
}

/// Remove a term from the catalogue.
pub async fn delete_term(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    if !stores.terms.delete_term(id).await? {
        return Err(ServiceError::NotFound(format!("term `{id}` not found")));
    }
    info!(term_id = %id, "term removed from catalogue");
    Ok(())
}
