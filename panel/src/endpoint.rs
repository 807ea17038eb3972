//! Generic request descriptor with a type-state builder.
//!
//! [`Endpoint`] is a ready-made [`PanelRequest`] for the common case where a
//! call is fully described by a path, a method, a parameter map and a
//! [`ResponseFormat`]. The [`EndpointBuilder`] tracks the required fields in
//! its type, so an endpoint without a method or path does not compile.

use std::fmt;
use std::marker::PhantomData;

use crate::error::ParseError;
use crate::method::RestMethod;
use crate::request::{PanelRequest, Params};
use crate::response::ResponseFormat;

/// Marker types for builder state tracking.
pub mod builder_state {
    /// A required field that has not been set.
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;
    /// A required field holding its value.
    #[derive(Debug, Clone)]
    pub struct Present<T>(pub(crate) T);
}

use builder_state::{Missing, Present};

/// A panel endpoint plus the parameters of one call.
///
/// ## Examples
///
/// ```rust
/// use panel::{Endpoint, RestMethod};
/// use panel::response::JsonFormat;
///
/// let sites: Endpoint<JsonFormat<serde_json::Value>> = Endpoint::builder()
///     .method(RestMethod::Post)
///     .path("data?action=getData")
///     .param("table", "sites")
///     .param("limit", "15")
///     .build();
///
/// assert_eq!(sites.params().len(), 2);
/// ```
pub struct Endpoint<F: ResponseFormat> {
    method: RestMethod,
    path: String,
    params: Params,
    description: Option<String>,
    _format: PhantomData<fn() -> F>,
}

impl<F: ResponseFormat> fmt::Debug for Endpoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("description", &self.description)
            .finish()
    }
}

// PhantomData<fn() -> F> is Clone for any F
impl<F: ResponseFormat> Clone for Endpoint<F> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            params: self.params.clone(),
            description: self.description.clone(),
            _format: PhantomData,
        }
    }
}

impl<F: ResponseFormat> Endpoint<F> {
    /// Creates a new endpoint builder.
    pub fn builder() -> EndpointBuilder<Missing, Missing, F> {
        EndpointBuilder::new()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns a copy with one more parameter, replacing any previous value.
    #[must_use]
    pub fn with_param(&self, key: impl Into<String>, value: impl ToString) -> Self {
        let mut endpoint = self.clone();
        endpoint.params.insert(key.into(), value.to_string());
        endpoint
    }
}

impl<F: ResponseFormat> PanelRequest for Endpoint<F> {
    type Output = F::Output;

    fn endpoint(&self) -> &str {
        &self.path
    }

    fn method(&self) -> RestMethod {
        self.method
    }

    fn params(&self) -> Params {
        self.params.clone()
    }

    fn parse(&self, body: &str) -> Result<Self::Output, ParseError> {
        F::parse(body)
    }
}

/// Type-state builder for [`Endpoint`].
///
/// ## Type Parameters
///
/// - `M`: State of the method field (`Missing` or `Present<RestMethod>`).
/// - `P`: State of the path field (`Missing` or `Present<String>`).
/// - `F`: The response format type.
pub struct EndpointBuilder<M, P, F: ResponseFormat> {
    method: M,
    path: P,
    params: Params,
    description: Option<String>,
    _format: PhantomData<fn() -> F>,
}

impl<F: ResponseFormat> EndpointBuilder<Missing, Missing, F> {
    /// Creates a new endpoint builder with no fields set.
    pub fn new() -> Self {
        Self {
            method: Missing,
            path: Missing,
            params: Params::new(),
            description: None,
            _format: PhantomData,
        }
    }
}

impl<F: ResponseFormat> Default for EndpointBuilder<Missing, Missing, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, F: ResponseFormat> EndpointBuilder<Missing, P, F> {
    /// Sets the HTTP method.
    pub fn method(self, method: RestMethod) -> EndpointBuilder<Present<RestMethod>, P, F> {
        EndpointBuilder {
            method: Present(method),
            path: self.path,
            params: self.params,
            description: self.description,
            _format: PhantomData,
        }
    }
}

impl<M, F: ResponseFormat> EndpointBuilder<M, Missing, F> {
    /// Sets the path relative to the panel base URL.
    ///
    /// The path may carry its own query, e.g. `site?action=AddSite`.
    pub fn path(self, path: impl Into<String>) -> EndpointBuilder<M, Present<String>, F> {
        EndpointBuilder {
            method: self.method,
            path: Present(path.into()),
            params: self.params,
            description: self.description,
            _format: PhantomData,
        }
    }
}

impl<M, P, F: ResponseFormat> EndpointBuilder<M, P, F> {
    /// Adds a parameter, replacing any previous value for `key`.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Adds every pair from `params`.
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl<F: ResponseFormat> EndpointBuilder<Present<RestMethod>, Present<String>, F> {
    /// Builds the endpoint.
    ///
    /// Only available once both the method and the path are set.
    pub fn build(self) -> Endpoint<F> {
        Endpoint {
            method: self.method.0,
            path: self.path.0,
            params: self.params,
            description: self.description,
            _format: PhantomData,
        }
    }
}
