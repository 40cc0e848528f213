pub mod transformers;

use std::collections::BTreeMap;

use base64::Engine;
use common_utils::{
    consts::BASE64_ENGINE,
    crypto::{self, SignMessage, VerifySignature},
    errors::CustomResult,
    ext_traits::ByteSliceExt,
    request::{Method, RequestBuilder, RequestContent},
    types::{AmountConvertor, StringMajorUnit, StringMajorUnitForConnector},
};
use error_stack::{report, ResultExt};
use masking::{PeekInterface, StrongSecret};
use pay_env::{instrument, logger, tracing};
use pay_interfaces::{
    api::{self, ConnectorCommon, Payer},
    client::{ApiClient, ProxyClient},
    configs::Proxy,
    errors::ConnectorError,
    types::{NoticeParams, Order, Way},
    webhooks::{IncomingNotification, NotificationPayload},
};
pub use transformers::AlipayOptions;
use transformers as alipay;

use crate::{constants::alipay as alipay_constants, utils};

const SUPPORTED_WAYS: &[Way] = &[Way::Form, Way::Qrcode, Way::App, Way::Wap];

#[derive(Clone)]
pub struct Alipay {
    options: AlipayOptions,
    app_private_key: StrongSecret<Vec<u8>>,
    alipay_public_key: Vec<u8>,
    client: Box<dyn ApiClient>,
    amount_converter: &'static (dyn AmountConvertor<Output = StringMajorUnit> + Sync),
}

impl std::fmt::Debug for Alipay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alipay")
            .field("app_id", &self.options.app_id)
            .field("is_production", &self.options.is_production)
            .field("app_private_key", &self.app_private_key)
            .finish_non_exhaustive()
    }
}

impl Alipay {
    /// Adapter sending requests through the shared default client
    pub fn new(options: AlipayOptions) -> CustomResult<Self, ConnectorError> {
        let client = ProxyClient::new(&Proxy::default())
            .change_context(ConnectorError::InvalidConnectorConfig { config: "proxy" })?;
        Self::with_client(options, Box::new(client))
    }

    /// Adapter sending requests through `client`.
    ///
    /// Both keys are decoded and parsed here so that a bad key fails at startup.
    pub fn with_client(
        options: AlipayOptions,
        client: Box<dyn ApiClient>,
    ) -> CustomResult<Self, ConnectorError> {
        if options.app_id.trim().is_empty() {
            return Err(report!(ConnectorError::InvalidConnectorConfig {
                config: "app_id"
            }));
        }

        let app_private_key = crypto::decode_key_material(options.app_private_key.peek())
            .and_then(|der| crypto::parse_rsa_private_key(&der).map(|_| der))
            .change_context(ConnectorError::InvalidConnectorConfig {
                config: "app_private_key",
            })?;
        let alipay_public_key = crypto::decode_key_material(options.alipay_public_key.peek())
            .and_then(|der| crypto::parse_rsa_public_key(&der).map(|_| der))
            .change_context(ConnectorError::InvalidConnectorConfig {
                config: "alipay_public_key",
            })?;

        Ok(Self {
            options,
            app_private_key: StrongSecret::new(app_private_key),
            alipay_public_key,
            client,
            amount_converter: &StringMajorUnitForConnector,
        })
    }

    /// Public parameters of `method` for `order`, signed with the application key
    fn get_signed_params(
        &self,
        method: alipay::AlipayMethod,
        order: &Order,
    ) -> CustomResult<BTreeMap<String, String>, ConnectorError> {
        let amount = utils::convert_amount(self.amount_converter, order.amount)?;
        let router_data = alipay::AlipayRouterData::from((amount, method, order, &self.options));
        let request = alipay::AlipayCommonRequest::try_from(&router_data)?;
        let mut params = utils::get_request_params(&request)?;

        let sign_string = utils::get_sign_string(
            params.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            &["sign"],
        );
        let signature = crypto::RsaSha256
            .sign_message(self.app_private_key.peek(), sign_string.as_bytes())
            .change_context(ConnectorError::RequestEncodingFailed)
            .attach_printable("Failed to sign alipay request")?;
        params.insert("sign".to_string(), BASE64_ENGINE.encode(signature));
        Ok(params)
    }

    fn get_redirect_url(
        &self,
        method: alipay::AlipayMethod,
        order: &Order,
    ) -> CustomResult<String, ConnectorError> {
        let query = self.get_signed_query(method, order)?;
        Ok(format!("{}?{query}", self.base_url()))
    }

    fn get_signed_query(
        &self,
        method: alipay::AlipayMethod,
        order: &Order,
    ) -> CustomResult<String, ConnectorError> {
        let params = self.get_signed_params(method, order)?;
        serde_urlencoded::to_string(&params).change_context(ConnectorError::RequestEncodingFailed)
    }

    #[instrument(skip_all)]
    async fn precreate(&self, order: &Order) -> CustomResult<String, ConnectorError> {
        let params = self.get_signed_params(alipay::AlipayMethod::Precreate, order)?;
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(self.base_url())
            .attach_default_headers()
            .set_body(RequestContent::FormUrlEncoded(params.into_iter().collect()))
            .build();

        let response = api::call_connector_api(self, self.client.as_ref(), request).await?;
        self.handle_precreate_response(&response.response)
    }

    fn handle_precreate_response(&self, body: &[u8]) -> CustomResult<String, ConnectorError> {
        let body = std::str::from_utf8(body)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let envelope: alipay::AlipayPrecreateEnvelope<'_> = serde_json::from_str(body)
            .change_context(ConnectorError::ResponseDeserializationFailed)
            .attach_printable_lazy(|| format!("Unexpected alipay response {body}"))?;

        let Some(node) = envelope.alipay_trade_precreate_response else {
            let error_node = envelope
                .error_response
                .ok_or_else(|| report!(ConnectorError::ResponseDeserializationFailed))
                .attach_printable("Neither a precreate nor an error response")?;
            let error: alipay::AlipayPrecreateResponse = error_node
                .get()
                .as_bytes()
                .parse_struct("AlipayPrecreateResponse")
                .change_context(ConnectorError::ResponseDeserializationFailed)?;
            logger::error!(code = %error.code, sub_code = ?error.sub_code, "Alipay rejected the request");
            return Err(report!(error.into_failure()));
        };

        self.verify_response_sign(node.get(), envelope.sign.as_deref())?;

        let response: alipay::AlipayPrecreateResponse = node
            .get()
            .as_bytes()
            .parse_struct("AlipayPrecreateResponse")
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        if !response.is_success() {
            logger::error!(code = %response.code, sub_code = ?response.sub_code, "Alipay declined the precreate");
            return Err(report!(response.into_failure()));
        }
        logger::info!(out_trade_no = ?response.out_trade_no, "Alipay precreate succeeded");

        response
            .qr_code
            .filter(|qr_code| !qr_code.is_empty())
            .ok_or_else(|| report!(ConnectorError::ResponseDeserializationFailed))
            .attach_printable("qr_code missing from a successful precreate")
    }

    fn verify_response_sign(
        &self,
        content: &str,
        sign: Option<&str>,
    ) -> CustomResult<(), ConnectorError> {
        let signature = sign
            .filter(|sign| !sign.is_empty())
            .ok_or_else(|| report!(ConnectorError::ResponseSignatureVerificationFailed))
            .attach_printable("Alipay response is not signed")
            .and_then(|sign| {
                BASE64_ENGINE
                    .decode(sign)
                    .change_context(ConnectorError::ResponseSignatureVerificationFailed)
            })?;
        let verified = crypto::RsaSha256
            .verify_signature(&self.alipay_public_key, &signature, content.as_bytes())
            .change_context(ConnectorError::ResponseSignatureVerificationFailed)?;
        if verified {
            Ok(())
        } else {
            logger::warn!("Alipay response signature mismatch");
            Err(report!(ConnectorError::ResponseSignatureVerificationFailed))
        }
    }
}

impl ConnectorCommon for Alipay {
    fn id(&self) -> &'static str {
        "alipay"
    }

    fn base_url(&self) -> &str {
        match (&self.options.base_url, self.options.is_production) {
            (Some(base_url), _) => base_url,
            (None, true) => alipay_constants::BASE_URL_PRODUCTION,
            (None, false) => alipay_constants::BASE_URL_SANDBOX,
        }
    }

    fn request_timeout_secs(&self) -> Option<u64> {
        self.options.timeout_secs
    }
}

impl IncomingNotification for Alipay {
    fn get_notification_source_verification_algorithm(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Box<dyn VerifySignature + Send>, ConnectorError> {
        let sign_type = match payload.get("sign_type").filter(|value| !value.is_empty()) {
            Some(sign_type) => sign_type
                .parse::<alipay::AlipaySignType>()
                .change_context(ConnectorError::WebhookSourceVerificationFailed)
                .attach_printable_lazy(|| format!("Unknown sign_type {sign_type}"))?,
            None => alipay::AlipaySignType::default(),
        };
        Ok(match sign_type {
            alipay::AlipaySignType::Rsa2 => Box::new(crypto::RsaSha256),
            alipay::AlipaySignType::Rsa => Box::new(crypto::RsaSha1),
        })
    }

    fn get_notification_source_verification_merchant_secret(
        &self,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(self.alipay_public_key.clone())
    }

    fn get_notification_source_verification_signature(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let sign = payload
            .get("sign")
            .filter(|sign| !sign.is_empty())
            .ok_or_else(|| report!(ConnectorError::WebhookSignatureNotFound))?;
        BASE64_ENGINE
            .decode(sign)
            .change_context(ConnectorError::WebhookSignatureNotFound)
            .attach_printable("sign is not base64")
    }

    fn get_notification_source_verification_message(
        &self,
        payload: &NotificationPayload,
        _merchant_secret: &[u8],
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(utils::get_sign_string(payload.iter(), &["sign", "sign_type"]).into_bytes())
    }

    fn get_notice_params(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<NoticeParams, ConnectorError> {
        let notification: alipay::AlipayNotification =
            payload.parse_struct("AlipayNotification")?;
        Ok(NoticeParams {
            amount: utils::convert_back_amount_or_zero(
                self.amount_converter,
                notification.total_amount,
                self.id(),
            ),
            order_id: notification.out_trade_no,
            payment_id: notification.trade_no,
            trade_status: notification.trade_status.into(),
        })
    }
}

#[async_trait::async_trait]
impl Payer for Alipay {
    fn supported_ways(&self) -> &'static [Way] {
        SUPPORTED_WAYS
    }

    fn success(&self) -> String {
        alipay_constants::NOTIFICATION_ACK.to_string()
    }

    #[instrument(skip_all, fields(connector = "alipay", way = %way, order_id = %order.id))]
    async fn call(&self, way: Way, order: &Order) -> CustomResult<String, ConnectorError> {
        match way {
            Way::Form => self.get_redirect_url(alipay::AlipayMethod::PagePay, order),
            Way::Wap => self.get_redirect_url(alipay::AlipayMethod::WapPay, order),
            Way::App => self.get_signed_query(alipay::AlipayMethod::AppPay, order),
            Way::Qrcode => self.precreate(order).await,
            Way::JsApi | Way::MiniProgram => {
                Err(utils::construct_way_not_supported_report(way, self.id()))
            }
        }
    }
}
