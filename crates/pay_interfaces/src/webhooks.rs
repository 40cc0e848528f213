//! Inbound gateway notifications

use std::collections::BTreeMap;

use common_utils::{crypto, errors::CustomResult};
use error_stack::{report, ResultExt};
use pay_env::{instrument, logger, tracing};
use serde::de::DeserializeOwned;

use crate::{api::ConnectorCommon, errors::ConnectorError, types::NoticeParams};

/// Raw key-value content of a gateway notification.
///
/// Keys are kept sorted, which is the order both gateways sign them in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationPayload(BTreeMap<String, String>);

impl NotificationPayload {
    /// Parse an `application/x-www-form-urlencoded` body or query string.
    ///
    /// A repeated key keeps its last value.
    pub fn from_query_string(body: &str) -> CustomResult<Self, ConnectorError> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(body)
            .change_context(ConnectorError::WebhookBodyDecodingFailed)
            .attach_printable("Notification body is not url encoded")
            .map(Self::from_pairs)
    }

    /// Build a payload from already decoded pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Value of `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key`, failing when it is absent or empty
    pub fn get_required(&self, key: &'static str) -> CustomResult<&str, ConnectorError> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| report!(ConnectorError::MissingRequiredField { field_name: key }))
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Pairs in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize the payload into a typed notification, all values are strings
    pub fn parse_struct<T: DeserializeOwned>(
        &self,
        type_name: &'static str,
    ) -> CustomResult<T, ConnectorError> {
        let deserializer: serde::de::value::MapDeserializer<'_, _, serde::de::value::Error> =
            serde::de::value::MapDeserializer::new(self.iter());
        T::deserialize(deserializer)
            .change_context(ConnectorError::WebhookBodyDecodingFailed)
            .attach_printable_lazy(|| format!("Unable to parse notification as {type_name}"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NotificationPayload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// Verification and normalization of gateway notifications
pub trait IncomingNotification: ConnectorCommon + Sync {
    /// Algorithm the gateway signed this notification with
    fn get_notification_source_verification_algorithm(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Box<dyn crypto::VerifySignature + Send>, ConnectorError>;

    /// Key material the signature is checked with
    fn get_notification_source_verification_merchant_secret(
        &self,
    ) -> CustomResult<Vec<u8>, ConnectorError>;

    /// Decoded signature carried by the notification
    fn get_notification_source_verification_signature(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Vec<u8>, ConnectorError>;

    /// Bytes the gateway signed
    fn get_notification_source_verification_message(
        &self,
        payload: &NotificationPayload,
        merchant_secret: &[u8],
    ) -> CustomResult<Vec<u8>, ConnectorError>;

    /// Check that the notification was signed by the gateway
    #[instrument(skip_all)]
    fn verify_notification_source(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<bool, ConnectorError> {
        let algorithm = self
            .get_notification_source_verification_algorithm(payload)
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;
        let secret = self
            .get_notification_source_verification_merchant_secret()
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;
        let signature = self
            .get_notification_source_verification_signature(payload)
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;
        let message = self
            .get_notification_source_verification_message(payload, &secret)
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;

        algorithm
            .verify_signature(&secret, &signature, &message)
            .change_context(ConnectorError::WebhookSourceVerificationFailed)
            .attach_printable_lazy(|| {
                format!("Signature verification errored for {}", self.id())
            })
    }

    /// Build the normalized notice from a verified payload
    fn get_notice_params(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<NoticeParams, ConnectorError>;

    /// Verify the notification and normalize it
    fn verify_and_normalize(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<NoticeParams, ConnectorError> {
        if !self.verify_notification_source(payload)? {
            logger::warn!(connector = self.id(), "Notification signature mismatch");
            return Err(report!(ConnectorError::WebhookSourceVerificationFailed))
                .attach_printable("Notification signature does not match its content");
        }
        self.get_notice_params(payload)
    }
}
