//! Acting identity extractor

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::domain::audit::ActorId;

/// Header carrying the caller's identity
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Identity of the caller, taken from the `X-Actor-Id` header
///
/// A missing, blank or non-UTF-8 header yields the anonymous actor. The
/// value is only used for auditing and is never an authorization decision.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| ActorId::new(value.trim()))
            .unwrap_or_default();

        Ok(Actor(actor))
    }
}
