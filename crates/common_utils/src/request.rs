//! Outbound requests to the payment gateways

use masking::{Maskable, Secret};
#[cfg(feature = "logs")]
use pay_env::logger;
use serde::{Deserialize, Serialize};

/// Request headers, values may be masked
pub type Headers = std::collections::HashSet<(String, Maskable<String>)>;

/// HTTP method of an outbound request
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// Encoded request body
#[derive(Clone, PartialEq, Eq)]
pub enum RequestContent {
    /// JSON document
    Json(String),
    /// `application/x-www-form-urlencoded` pairs, encoded by the transport
    FormUrlEncoded(Vec<(String, String)>),
    /// XML document
    Xml(String),
}

impl std::fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json(_) => "JsonRequestBody",
            Self::FormUrlEncoded(_) => "FormUrlEncodedRequestBody",
            Self::Xml(_) => "XmlRequestBody",
        })
    }
}

impl RequestContent {
    /// Value of the `Content-Type` header for this body
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => mime_types::APPLICATION_JSON,
            Self::FormUrlEncoded(_) => mime_types::APPLICATION_FORM_URLENCODED,
            Self::Xml(_) => mime_types::TEXT_XML,
        }
    }

    /// Render the body as the string sent on the wire
    pub fn get_inner_value(&self) -> Secret<String> {
        match self {
            Self::Json(body) | Self::Xml(body) => body.clone().into(),
            Self::FormUrlEncoded(pairs) => serde_urlencoded::to_string(pairs)
                .unwrap_or_default()
                .into(),
        }
    }
}

mod mime_types {
    pub(super) const APPLICATION_JSON: &str = "application/json";
    pub(super) const APPLICATION_FORM_URLENCODED: &str =
        "application/x-www-form-urlencoded;charset=utf-8";
    pub(super) const TEXT_XML: &str = "text/xml;charset=utf-8";
}

fn default_request_headers() -> [(String, Maskable<String>); 1] {
    [(http::header::ACCEPT.to_string(), "*/*".into())]
}

/// A fully built outbound request
#[derive(Debug, Clone)]
pub struct Request {
    /// Target URL
    pub url: String,
    /// Headers
    pub headers: Headers,
    /// Method
    pub method: Method,
    /// Body
    pub body: Option<RequestContent>,
}

impl Request {
    /// A request to `url` without headers or body
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_owned(),
            headers: Headers::new(),
            body: None,
        }
    }
}

/// Builder for [`Request`], starting from a GET without URL
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// An empty GET request
    pub fn new() -> Self {
        Self {
            request: Request::new(Method::Get, ""),
        }
    }

    /// Target URL
    pub fn url(mut self, url: &str) -> Self {
        self.request.url = url.to_owned();
        self
    }

    /// HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Adds the `Accept` header every gateway call carries
    pub fn attach_default_headers(mut self) -> Self {
        self.request.headers.extend(default_request_headers());
        self
    }

    /// Sets the body together with its `Content-Type` header
    pub fn set_body(mut self, body: RequestContent) -> Self {
        self.request.headers.insert((
            http::header::CONTENT_TYPE.to_string(),
            body.content_type().into(),
        ));
        #[cfg(feature = "logs")]
        logger::debug!(connector_request_body = ?body);
        self.request.body = Some(body);
        self
    }

    /// The finished request
    pub fn build(self) -> Request {
        self.request
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
