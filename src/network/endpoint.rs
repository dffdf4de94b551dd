use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed JSON mapping used for both headers and parameters.
pub type Params = Map<String, Value>;

/// HTTP verbs a dispatch can use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether parameters travel in the query string rather than the body.
    pub fn encodes_in_url(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one logical API call. Implementors are immutable values; the
/// dispatcher only reads from them.
pub trait Endpoint: fmt::Debug {
    fn host(&self) -> &str;

    fn path(&self) -> &str;

    fn headers(&self) -> Option<Params> {
        None
    }

    fn parameters(&self) -> Option<Params> {
        None
    }

    /// Full request URL. `None` means the endpoint can't be dispatched.
    fn url(&self) -> Option<String> {
        Some(format!("{}{}", self.host(), self.path()))
    }
}

/// A free-form endpoint for calls that don't belong to a fixed API family.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDescriptor {
    host: String,
    path: String,
    headers: Option<Params>,
    parameters: Option<Params>,
}

impl ApiDescriptor {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            headers: None,
            parameters: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }
}

impl Endpoint for ApiDescriptor {
    fn host(&self) -> &str {
        &self.host
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn headers(&self) -> Option<Params> {
        self.headers.clone()
    }

    fn parameters(&self) -> Option<Params> {
        self.parameters.clone()
    }
}
