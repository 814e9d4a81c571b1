//! Typed GraphQL operations and the JSON envelopes they travel in.
//!
//! An [`Operation`] ties a GraphQL document to the Rust types of its
//! variables and its `data` payload, the same role generated operation types
//! play in a code-generated client.

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether an operation reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read operation; results are cached by query identity
    Query,
    /// Write operation; results are never cached directly
    Mutation,
}

/// A typed GraphQL operation
///
/// # Example
///
/// ```ignore
/// struct GetTodos;
///
/// impl Operation for GetTodos {
///     const NAME: &'static str = "GetTodos";
///     const DOCUMENT: &'static str = "query GetTodos { todos { id title completed } }";
///     const KIND: OperationKind = OperationKind::Query;
///     type Variables = ();
///     type Data = TodosData;
/// }
/// ```
pub trait Operation {
    /// Operation name, sent as `operationName` and used as cache identity
    const NAME: &'static str;

    /// The GraphQL document text
    const DOCUMENT: &'static str;

    /// Query or mutation
    const KIND: OperationKind;

    /// Variables sent with the request (`()` for none)
    type Variables: Serialize + Send + Sync;

    /// Shape of the response `data` field
    type Data: DeserializeOwned + Serialize + Send;
}

/// Request envelope: `{ operationName, query, variables }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// Name of the operation inside `query`
    pub operation_name: String,
    /// GraphQL document text
    pub query: String,
    /// Variables object, `null` when the operation takes none
    #[serde(default)]
    pub variables: Value,
}

impl GraphQlRequest {
    /// Build the request for operation `O`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the variables cannot be serialized.
    pub fn for_operation<O: Operation>(variables: &O::Variables) -> Result<Self, ClientError> {
        Ok(Self {
            operation_name: O::NAME.to_string(),
            query: O::DOCUMENT.to_string(),
            variables: serde_json::to_value(variables)?,
        })
    }

    /// Deserialize the variables into a concrete type
    ///
    /// # Errors
    ///
    /// Returns the serde error when the variables do not match `T`.
    pub fn variables_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.variables.clone())
    }
}

/// A single entry of the response `errors` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human readable message
    pub message: String,
    /// Path of the field that failed, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl GraphQlError {
    /// Error with a message and no path
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Attach the failing field path
    #[must_use]
    pub fn at(mut self, field: impl Into<String>) -> Self {
        self.path.push(field.into());
        self
    }
}

/// Response envelope: `{ data, errors }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphQlResponse {
    /// Result payload, absent when execution failed entirely
    #[serde(default)]
    pub data: Option<Value>,
    /// Execution errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Successful response carrying `data`
    #[must_use]
    pub const fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Failed response carrying one error and no data
    #[must_use]
    pub fn error(error: GraphQlError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// Decode into the operation's data type
    ///
    /// Any GraphQL error turns the whole response into [`ClientError::Server`];
    /// partial data is not surfaced.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Server`] if `errors` is non-empty
    /// - [`ClientError::Decode`] if `data` is missing or has the wrong shape
    pub fn into_data<O: Operation>(self) -> Result<O::Data, ClientError> {
        if !self.errors.is_empty() {
            let message = self
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::Server(message));
        }

        let data = self
            .data
            .ok_or_else(|| ClientError::Decode(format!("{} returned no data", O::NAME)))?;
        Ok(serde_json::from_value(data)?)
    }
}
