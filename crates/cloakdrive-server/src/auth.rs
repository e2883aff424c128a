//! Caller identity.
//!
//! Sessions are owned by the upstream identity provider, which forwards the
//! authenticated user in a request header (`IDENTITY_HEADER`, default
//! `x-user-id`). The value doubles as the owner key and the KDF input.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cloakdrive_shared::types::Identity;

use crate::api::AppState;
use crate::error::ServerError;

/// Extractor for the authenticated caller. Rejects with 401 when the header
/// is missing or does not hold a valid identity.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = state.config.identity_header.as_str();

        let raw = parts
            .headers
            .get(header)
            .ok_or_else(|| ServerError::Unauthorized("Missing identity".into()))?
            .to_str()
            .map_err(|_| ServerError::Unauthorized("Identity is not valid text".into()))?;

        let identity =
            Identity::parse(raw).map_err(|e| ServerError::Unauthorized(e.to_string()))?;
        Ok(Self(identity))
    }
}
