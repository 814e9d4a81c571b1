//! Transport seam for executing GraphQL requests.
//!
//! The client never talks to a network directly. Whatever answers requests
//! (an HTTP endpoint or an in-process mock server) implements [`Transport`].

use crate::error::TransportError;
use crate::operation::{GraphQlRequest, GraphQlResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Executes GraphQL requests
///
/// A transport reports [`TransportError`] only when no GraphQL response was
/// obtained. Execution failures reported by the server belong in
/// [`GraphQlResponse::errors`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request could not be delivered or the
    /// reply was not a GraphQL envelope.
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        (**self).execute(request).await
    }
}
