//! HTTP transport used by the adapters to reach the gateways

use std::{str::FromStr, time::Duration};

use common_utils::{
    consts,
    errors::CustomResult,
    request::{Headers, Method, Request, RequestContent},
};
use error_stack::ResultExt;
use once_cell::sync::OnceCell;
use pay_env::{instrument, logger, tracing};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{configs::Proxy, errors::HttpClientError};

static DEFAULT_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Raw gateway response
#[derive(Clone, Debug)]
pub struct Response {
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub response: bytes::Bytes,
}

/// Sends fully built requests to a gateway
#[async_trait::async_trait]
pub trait ApiClient: dyn_clone::DynClone + Send + Sync + std::fmt::Debug {
    /// Send `request`, giving up after `option_timeout_secs` (30 seconds when `None`)
    async fn send_request(
        &self,
        request: Request,
        option_timeout_secs: Option<u64>,
    ) -> CustomResult<Response, HttpClientError>;
}

dyn_clone::clone_trait_object!(ApiClient);

/// [`ApiClient`] backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct ProxyClient {
    client: reqwest::Client,
}

impl ProxyClient {
    /// Client honouring the given proxy settings.
    ///
    /// Without a proxy the process wide default client is reused.
    pub fn new(proxy_config: &Proxy) -> CustomResult<Self, HttpClientError> {
        let client = if proxy_config.http_url.is_none() && proxy_config.https_url.is_none() {
            get_base_client(proxy_config)?
        } else {
            get_client_builder(proxy_config)?
                .build()
                .change_context(HttpClientError::ClientConstructionFailed)
                .attach_printable("Failed to construct proxied client")?
        };
        Ok(Self { client })
    }
}

fn get_client_builder(
    proxy_config: &Proxy,
) -> CustomResult<reqwest::ClientBuilder, HttpClientError> {
    let mut client_builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(Duration::from_secs(
            proxy_config
                .idle_pool_connection_timeout
                .unwrap_or(consts::REQUEST_TIME_OUT),
        ));

    if let Some(url) = proxy_config.https_url.as_ref() {
        client_builder = client_builder.proxy(
            reqwest::Proxy::https(url)
                .change_context(HttpClientError::InvalidProxyConfiguration)
                .attach_printable("HTTPS proxy configuration error")?,
        );
    }

    if let Some(url) = proxy_config.http_url.as_ref() {
        client_builder = client_builder.proxy(
            reqwest::Proxy::http(url)
                .change_context(HttpClientError::InvalidProxyConfiguration)
                .attach_printable("HTTP proxy configuration error")?,
        );
    }

    Ok(client_builder)
}

fn get_base_client(proxy_config: &Proxy) -> CustomResult<reqwest::Client, HttpClientError> {
    Ok(DEFAULT_CLIENT
        .get_or_try_init(|| {
            get_client_builder(proxy_config)?
                .build()
                .change_context(HttpClientError::ClientConstructionFailed)
                .attach_printable("Failed to construct base client")
        })?
        .clone())
}

fn construct_header_map(headers: Headers) -> CustomResult<HeaderMap, HttpClientError> {
    headers
        .into_iter()
        .try_fold(HeaderMap::new(), |mut header_map, (header_name, header_value)| {
            let is_masked = header_value.is_masked();
            let header_name = HeaderName::from_str(&header_name)
                .change_context(HttpClientError::HeaderMapConstructionFailed)?;
            let mut header_value = HeaderValue::from_str(&header_value.into_inner())
                .change_context(HttpClientError::HeaderMapConstructionFailed)
                .attach_printable_lazy(|| format!("Invalid value for header {header_name}"))?;
            header_value.set_sensitive(is_masked);
            header_map.append(header_name, header_value);
            Ok(header_map)
        })
}

#[async_trait::async_trait]
impl ApiClient for ProxyClient {
    #[instrument(skip_all)]
    async fn send_request(
        &self,
        request: Request,
        option_timeout_secs: Option<u64>,
    ) -> CustomResult<Response, HttpClientError> {
        logger::debug!(method=%request.method, url=%request.url, payload=?request.body);

        let url =
            reqwest::Url::parse(&request.url).change_context(HttpClientError::UrlParsingFailed)?;
        let headers = construct_header_map(request.headers)?;

        let request_builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let client = self.client.post(url);
                match request.body {
                    Some(RequestContent::Json(payload)) | Some(RequestContent::Xml(payload)) => {
                        client.body(payload)
                    }
                    Some(RequestContent::FormUrlEncoded(payload)) => client.form(&payload),
                    None => client,
                }
            }
        }
        .headers(headers)
        .timeout(Duration::from_secs(
            option_timeout_secs.unwrap_or(consts::REQUEST_TIME_OUT),
        ));

        let started_at = std::time::Instant::now();
        let response = request_builder
            .send()
            .await
            .map_err(|error| match error {
                error if error.is_timeout() => HttpClientError::RequestTimeoutReceived,
                _ => HttpClientError::RequestNotSent(error.to_string()),
            })
            .attach_printable("Unable to send request to connector")?;

        let status_code = response.status().as_u16();
        let response = response
            .bytes()
            .await
            .change_context(HttpClientError::ResponseDecodingFailed)
            .attach_printable("Error while waiting for response")?;
        logger::info!(
            status_code,
            latency = ?started_at.elapsed(),
            "Received connector response"
        );

        Ok(Response {
            status_code,
            response,
        })
    }
}
