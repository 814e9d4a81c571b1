//! Query/mutation client.
//!
//! [`QueryClient`] issues typed operations through a [`Transport`] and keeps
//! query results in a [`QueryCache`]. Mutations accept an `update` callback
//! that rewrites cached queries once the server has confirmed the write, so
//! later reads see the change without another round trip.
//!
//! Failures are logged with the operation name and returned to the caller.
//! The client never retries on its own.

use crate::cache::{self, QueryCache};
use crate::error::ClientError;
use crate::operation::{GraphQlRequest, Operation};
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable read by [`ClientConfig::from_env`]
pub const FETCH_POLICY_ENV: &str = "TODO_FETCH_POLICY";

/// Where a query reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve from cache when present, otherwise fetch and cache
    #[default]
    CacheFirst,
    /// Always fetch, then refresh the cache
    NetworkOnly,
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheFirst => write!(f, "cache-first"),
            Self::NetworkOnly => write!(f, "network-only"),
        }
    }
}

impl FromStr for FetchPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache-first" => Ok(Self::CacheFirst),
            "network-only" => Ok(Self::NetworkOnly),
            other => Err(ClientError::Validation(format!("unknown fetch policy: {other}"))),
        }
    }
}

/// Configuration for a [`QueryClient`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Policy applied by [`QueryClient::query`]
    pub fetch_policy: FetchPolicy,
}

impl ClientConfig {
    /// Default configuration (cache-first)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fetch policy
    #[must_use]
    pub const fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Read configuration from the environment
    ///
    /// `TODO_FETCH_POLICY` selects the fetch policy; unset means the default.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the variable holds an unknown policy.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(FETCH_POLICY_ENV) {
            config.fetch_policy = value.parse()?;
        }
        Ok(config)
    }
}

/// Client for typed GraphQL operations with a response cache
///
/// Cloning is cheap; clones share the transport and the cache.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn QueryCache>,
    config: ClientConfig,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Create a client with the default configuration
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn QueryCache>) -> Self {
        Self::with_config(transport, cache, ClientConfig::default())
    }

    /// Create a client with an explicit configuration
    #[must_use]
    pub fn with_config(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn QueryCache>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    /// The response cache
    #[must_use]
    pub fn cache(&self) -> &dyn QueryCache {
        self.cache.as_ref()
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a query according to the configured [`FetchPolicy`]
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the underlying request. A cache hit never fails.
    #[tracing::instrument(skip(self, variables), fields(operation = O::NAME))]
    pub async fn query<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data, ClientError> {
        if self.config.fetch_policy == FetchPolicy::CacheFirst {
            if let Some(data) = cache::read_query::<O>(self.cache(), variables) {
                tracing::debug!("Cache hit");
                metrics::counter!("client.cache.hits", "operation" => O::NAME).increment(1);
                return Ok(data);
            }
            tracing::debug!("Cache miss");
            metrics::counter!("client.cache.misses", "operation" => O::NAME).increment(1);
        }

        self.fetch::<O>(variables).await
    }

    /// Run a query over the network regardless of policy and refresh its cache entry
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the underlying request; the cache keeps its
    /// previous entry in that case.
    #[tracing::instrument(skip(self, variables), fields(operation = O::NAME))]
    pub async fn refetch<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data, ClientError> {
        self.fetch::<O>(variables).await
    }

    /// Run a mutation without touching the cache
    ///
    /// For mutations whose effect on cached queries is picked up by a
    /// refetch instead of an update callback.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the underlying request.
    #[tracing::instrument(skip(self, variables), fields(operation = O::NAME))]
    pub async fn run_mutation<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data, ClientError> {
        self.execute::<O>(variables).await
    }

    /// Run a mutation, then let `update` rewrite cached queries
    ///
    /// `update` runs exactly once, synchronously, after a successful response
    /// and before this method returns. It never runs when the mutation fails.
    /// Each run counts towards `client.cache.updates`.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the underlying request.
    #[tracing::instrument(skip(self, variables, update), fields(operation = O::NAME))]
    pub async fn mutate<O, F>(&self, variables: &O::Variables, update: F) -> Result<O::Data, ClientError>
    where
        O: Operation,
        F: FnOnce(&dyn QueryCache, &O::Data) + Send,
    {
        let data = self.execute::<O>(variables).await?;
        update(self.cache(), &data);
        metrics::counter!("client.cache.updates", "operation" => O::NAME).increment(1);
        Ok(data)
    }

    /// Read a query result from the cache only
    #[must_use]
    pub fn read_query<O: Operation>(&self, variables: &O::Variables) -> Option<O::Data> {
        cache::read_query::<O>(self.cache(), variables)
    }

    /// Write a query result into the cache
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the data cannot be serialized.
    pub fn write_query<O: Operation>(&self, variables: &O::Variables, data: &O::Data) -> Result<(), ClientError> {
        cache::write_query::<O>(self.cache(), variables, data)?;
        Ok(())
    }

    async fn fetch<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data, ClientError> {
        let data = self.execute::<O>(variables).await?;
        self.write_query::<O>(variables, &data)?;
        Ok(data)
    }

    async fn execute<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data, ClientError> {
        let request = GraphQlRequest::for_operation::<O>(variables)?;
        tracing::debug!(kind = ?O::KIND, "Executing operation");
        metrics::counter!("client.operations.total", "operation" => O::NAME).increment(1);

        let result = match self.transport.execute(request).await {
            Ok(response) => response.into_data::<O>(),
            Err(error) => Err(ClientError::from(error)),
        };

        if let Err(error) = &result {
            tracing::warn!(operation = O::NAME, error = %error, "Operation failed");
            metrics::counter!("client.operations.failed", "operation" => O::NAME).increment(1);
        }

        result
    }
}
