//! The capability every payment gateway adapter implements

use common_utils::{errors::CustomResult, request::Request};
use error_stack::{report, ResultExt};
use pay_env::{instrument, logger, tracing};

use crate::{
    client::{ApiClient, Response},
    errors::{ConnectorError, HttpClientError},
    types::{NoticeParams, Order, Way},
    webhooks::{IncomingNotification, NotificationPayload},
};

/// Identity and addressing of a gateway
pub trait ConnectorCommon {
    /// Name of the connector (in lowercase).
    fn id(&self) -> &'static str;

    /// The base URL for interacting with the connector's API.
    fn base_url(&self) -> &str;

    /// Seconds an outbound request may take
    fn request_timeout_secs(&self) -> Option<u64> {
        None
    }
}

/// A payment gateway seen through one uniform interface
#[async_trait::async_trait]
pub trait Payer: IncomingNotification + Send + Sync {
    /// Channels this gateway can build an artifact for
    fn supported_ways(&self) -> &'static [Way];

    /// Authenticate a notification and normalize its content
    fn verify(&self, payload: &NotificationPayload) -> CustomResult<NoticeParams, ConnectorError> {
        self.verify_and_normalize(payload)
    }

    /// Body to answer a notification with so the gateway stops retrying it
    fn success(&self) -> String;

    /// Build the payable artifact of `way` for `order`
    async fn call(&self, way: Way, order: &Order) -> CustomResult<String, ConnectorError>;

    /// Fail with [`ConnectorError::WayNotSupported`] when `way` is not served here
    fn ensure_way_supported(&self, way: Way) -> CustomResult<(), ConnectorError> {
        if self.supported_ways().contains(&way) {
            Ok(())
        } else {
            Err(report!(ConnectorError::WayNotSupported {
                way,
                connector: self.id(),
            }))
        }
    }
}

impl std::fmt::Debug for dyn Payer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payer").field("connector", &self.id()).finish()
    }
}

/// Send a request to a gateway and accept only a 2xx answer
#[instrument(skip_all, fields(connector = connector.id()))]
pub async fn call_connector_api<C: ConnectorCommon + ?Sized>(
    connector: &C,
    client: &dyn ApiClient,
    request: Request,
) -> CustomResult<Response, ConnectorError> {
    let response = client
        .send_request(request, connector.request_timeout_secs())
        .await
        .map_err(|error| {
            let timed_out = error.current_context() == &HttpClientError::RequestTimeoutReceived;
            logger::error!(connector = connector.id(), timed_out, ?error, "Connector request failed");
            error.change_context(ConnectorError::RequestNotSent)
        })?;

    match response.status_code {
        200..=299 => Ok(response),
        status_code => {
            logger::error!(
                connector = connector.id(),
                status_code,
                "Connector responded with an unexpected status"
            );
            Err(report!(ConnectorError::UnexpectedResponseStatus { status_code }))
                .attach_printable_lazy(|| {
                    format!(
                        "Response body: {}",
                        String::from_utf8_lossy(&response.response)
                    )
                })
        }
    }
}
