pub mod transformers;

use std::collections::BTreeMap;

use common_utils::{
    consts::NONCE_LENGTH,
    crypto::{self, GenerateDigest, SignMessage, VerifySignature},
    date_time,
    errors::CustomResult,
    ext_traits::Encode,
    request::{Method, RequestBuilder, RequestContent},
    types::{AmountConvertor, StringMinorUnit, StringMinorUnitForConnector},
};
use error_stack::{report, ResultExt};
use masking::{KeyMaterial, PeekInterface, StrongSecret};
use pay_env::{instrument, logger, tracing};
use pay_interfaces::{
    api::{self, ConnectorCommon, Payer},
    client::{ApiClient, ProxyClient},
    configs::Proxy,
    consts,
    errors::ConnectorError,
    types::{NoticeParams, Order, Way},
    webhooks::{IncomingNotification, NotificationPayload},
};
pub use transformers::WechatpayOptions;
use transformers as wechatpay;

use crate::{constants::wechatpay as wechatpay_constants, utils};

const SUPPORTED_WAYS: &[Way] = &[
    Way::Qrcode,
    Way::App,
    Way::Wap,
    Way::JsApi,
    Way::MiniProgram,
];

/// Read a notification body posted by WeChat Pay.
///
/// The gateway posts a flat XML document, its elements become the payload keys.
pub fn body_to_payload(body: &str) -> CustomResult<NotificationPayload, ConnectorError> {
    utils::xml_to_map(body)
        .change_context(ConnectorError::WebhookBodyDecodingFailed)
        .map(NotificationPayload::from_pairs)
}

#[derive(Clone)]
pub struct Wechatpay {
    options: WechatpayOptions,
    api_key: StrongSecret<String, KeyMaterial>,
    client: Box<dyn ApiClient>,
    amount_converter: &'static (dyn AmountConvertor<Output = StringMinorUnit> + Sync),
}

impl std::fmt::Debug for Wechatpay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wechatpay")
            .field("app_id", &self.options.app_id)
            .field("mch_id", &self.options.mch_id)
            .field("is_production", &self.options.is_production)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl Wechatpay {
    /// Adapter sending requests through the shared default client
    pub fn new(options: WechatpayOptions) -> CustomResult<Self, ConnectorError> {
        let client = ProxyClient::new(&Proxy::default())
            .change_context(ConnectorError::InvalidConnectorConfig { config: "proxy" })?;
        Self::with_client(options, Box::new(client))
    }

    /// Adapter sending requests through `client`
    pub fn with_client(
        options: WechatpayOptions,
        client: Box<dyn ApiClient>,
    ) -> CustomResult<Self, ConnectorError> {
        for (config, value) in [
            ("app_id", options.app_id.as_str()),
            ("mch_id", options.mch_id.as_str()),
            ("api_key", options.api_key.peek().as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(report!(ConnectorError::InvalidConnectorConfig { config }));
            }
        }

        Ok(Self {
            api_key: StrongSecret::new(options.api_key.peek().clone()),
            options,
            client,
            amount_converter: &StringMinorUnitForConnector,
        })
    }

    fn signed_message<'a>(&self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
        let sign_string = utils::get_sign_string(params, &["sign"]);
        format!("{sign_string}&key={}", self.api_key.peek())
    }

    /// Uppercase hex signature over every non empty parameter but `sign`
    fn sign(
        &self,
        params: &BTreeMap<String, String>,
        sign_type: wechatpay::WechatpaySignType,
    ) -> CustomResult<String, ConnectorError> {
        let message = self.signed_message(
            params
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        let digest = match sign_type {
            wechatpay::WechatpaySignType::Md5 => crypto::Md5.generate_digest(message.as_bytes()),
            wechatpay::WechatpaySignType::HmacSha256 => crypto::HmacSha256
                .sign_message(self.api_key.peek().as_bytes(), message.as_bytes()),
        }
        .change_context(ConnectorError::RequestEncodingFailed)
        .attach_printable("Failed to sign wechatpay request")?;
        Ok(hex::encode_upper(digest))
    }

    fn sign_params(
        &self,
        mut params: BTreeMap<String, String>,
    ) -> CustomResult<BTreeMap<String, String>, ConnectorError> {
        let sign = self.sign(&params, self.options.sign_type)?;
        params.insert("sign".to_string(), sign);
        Ok(params)
    }

    fn unified_order_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url(),
            wechatpay_constants::UNIFIED_ORDER_PATH
        )
    }

    #[instrument(skip_all)]
    async fn unified_order(
        &self,
        way: Way,
        order: &Order,
    ) -> CustomResult<wechatpay::WechatpayUnifiedOrderResponse, ConnectorError> {
        let amount = utils::convert_amount(self.amount_converter, order.amount)?;
        let nonce_str = crypto::generate_cryptographically_secure_random_string(NONCE_LENGTH);
        let router_data =
            wechatpay::WechatpayRouterData::from((amount, way, order, &self.options, nonce_str));
        let request = wechatpay::WechatpayUnifiedOrderRequest::try_from(&router_data)?;
        let params = self.sign_params(utils::get_request_params(&request)?)?;

        let body = utils::map_to_xml(
            params
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(&self.unified_order_url())
            .attach_default_headers()
            .set_body(RequestContent::Xml(body))
            .build();

        let response = api::call_connector_api(self, self.client.as_ref(), request).await?;
        self.handle_unified_order_response(&response.response)
    }

    fn handle_unified_order_response(
        &self,
        body: &[u8],
    ) -> CustomResult<wechatpay::WechatpayUnifiedOrderResponse, ConnectorError> {
        let body = std::str::from_utf8(body)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let payload = utils::xml_to_map(body)
            .change_context(ConnectorError::ResponseDeserializationFailed)
            .attach_printable_lazy(|| format!("Unexpected wechatpay response {body}"))
            .map(NotificationPayload::from_pairs)?;

        if payload.get("return_code") != Some(wechatpay_constants::SUCCESS) {
            let message = payload
                .get("return_msg")
                .filter(|message| !message.is_empty())
                .unwrap_or(consts::NO_ERROR_MESSAGE)
                .to_string();
            logger::error!(return_msg = %message, "Wechatpay rejected the request");
            return Err(report!(ConnectorError::ConnectorReturnedFailure { message }));
        }

        if payload.get("sign").map_or(true, str::is_empty) {
            logger::warn!("Wechatpay response is not signed");
            return Err(report!(ConnectorError::ResponseSignatureVerificationFailed))
                .attach_printable("sign missing from a unified order response");
        }
        let verified = self
            .verify_notification_source(&payload)
            .change_context(ConnectorError::ResponseSignatureVerificationFailed)?;
        if !verified {
            logger::warn!("Wechatpay response signature mismatch");
            return Err(report!(ConnectorError::ResponseSignatureVerificationFailed));
        }

        if payload.get("result_code") != Some(wechatpay_constants::SUCCESS) {
            let code = payload
                .get("err_code")
                .filter(|code| !code.is_empty())
                .unwrap_or(consts::NO_ERROR_CODE)
                .to_string();
            let message = payload
                .get("err_code_des")
                .filter(|message| !message.is_empty())
                .unwrap_or(consts::NO_ERROR_MESSAGE)
                .to_string();
            logger::error!(err_code = %code, "Wechatpay declined the unified order");
            return Err(report!(ConnectorError::FailedAtConnector { code, message }));
        }

        payload
            .parse_struct::<wechatpay::WechatpayUnifiedOrderResponse>(
                "WechatpayUnifiedOrderResponse",
            )
            .change_context(ConnectorError::ResponseDeserializationFailed)
    }

    fn get_native_code_url(
        response: wechatpay::WechatpayUnifiedOrderResponse,
    ) -> CustomResult<String, ConnectorError> {
        Some(response.code_url)
            .filter(|code_url| !code_url.is_empty())
            .ok_or_else(|| report!(ConnectorError::ResponseDeserializationFailed))
            .attach_printable("code_url missing from a NATIVE unified order")
    }

    fn get_mweb_url(
        &self,
        response: wechatpay::WechatpayUnifiedOrderResponse,
    ) -> CustomResult<String, ConnectorError> {
        let mweb_url = Some(response.mweb_url)
            .filter(|mweb_url| !mweb_url.is_empty())
            .ok_or_else(|| report!(ConnectorError::ResponseDeserializationFailed))
            .attach_printable("mweb_url missing from a MWEB unified order")?;
        match self.options.return_url.as_deref().filter(|url| !url.is_empty()) {
            Some(return_url) => {
                let redirect = serde_urlencoded::to_string([("redirect_url", return_url)])
                    .change_context(ConnectorError::RequestEncodingFailed)?;
                Ok(format!("{mweb_url}&{redirect}"))
            }
            None => Ok(mweb_url),
        }
    }

    fn get_prepay_id(
        response: wechatpay::WechatpayUnifiedOrderResponse,
    ) -> CustomResult<String, ConnectorError> {
        Some(response.prepay_id)
            .filter(|prepay_id| !prepay_id.is_empty())
            .ok_or_else(|| report!(ConnectorError::ResponseDeserializationFailed))
            .attach_printable("prepay_id missing from an APP or JSAPI unified order")
    }

    fn get_app_params(
        &self,
        response: wechatpay::WechatpayUnifiedOrderResponse,
    ) -> CustomResult<String, ConnectorError> {
        let params = wechatpay::WechatpayAppParams {
            appid: self.options.app_id.clone(),
            partnerid: self.options.mch_id.clone(),
            prepayid: Self::get_prepay_id(response)?,
            package: wechatpay_constants::APP_PACKAGE,
            noncestr: crypto::generate_cryptographically_secure_random_string(NONCE_LENGTH),
            timestamp: date_time::now_unix_timestamp().to_string(),
        };
        let params = self.sign_params(utils::get_request_params(&params)?)?;
        serde_urlencoded::to_string(&params).change_context(ConnectorError::RequestEncodingFailed)
    }

    fn get_js_api_params(
        &self,
        way: Way,
        response: wechatpay::WechatpayUnifiedOrderResponse,
    ) -> CustomResult<String, ConnectorError> {
        let prepay_id = Self::get_prepay_id(response)?;
        let mut params = wechatpay::WechatpayJsApiParams {
            app_id: self.options.app_id_for(way).to_string(),
            time_stamp: date_time::now_unix_timestamp().to_string(),
            nonce_str: crypto::generate_cryptographically_secure_random_string(NONCE_LENGTH),
            package: format!("prepay_id={prepay_id}"),
            sign_type: self.options.sign_type,
            pay_sign: None,
        };
        let pay_sign = self.sign(&utils::get_request_params(&params)?, params.sign_type)?;
        params.pay_sign = Some(pay_sign);
        params
            .encode_to_string_of_json()
            .change_context(ConnectorError::RequestEncodingFailed)
    }
}

impl ConnectorCommon for Wechatpay {
    fn id(&self) -> &'static str {
        "wechatpay"
    }

    fn base_url(&self) -> &str {
        match (&self.options.base_url, self.options.is_production) {
            (Some(base_url), _) => base_url.trim_end_matches('/'),
            (None, true) => wechatpay_constants::BASE_URL_PRODUCTION,
            (None, false) => wechatpay_constants::BASE_URL_SANDBOX,
        }
    }

    fn request_timeout_secs(&self) -> Option<u64> {
        self.options.timeout_secs
    }
}

impl IncomingNotification for Wechatpay {
    fn get_notification_source_verification_algorithm(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Box<dyn VerifySignature + Send>, ConnectorError> {
        let sign_type = match payload.get("sign_type").filter(|value| !value.is_empty()) {
            Some(sign_type) => sign_type
                .parse::<wechatpay::WechatpaySignType>()
                .change_context(ConnectorError::WebhookSourceVerificationFailed)
                .attach_printable_lazy(|| format!("Unknown sign_type {sign_type}"))?,
            None => self.options.sign_type,
        };
        Ok(match sign_type {
            wechatpay::WechatpaySignType::Md5 => Box::new(crypto::Md5),
            wechatpay::WechatpaySignType::HmacSha256 => Box::new(crypto::HmacSha256),
        })
    }

    fn get_notification_source_verification_merchant_secret(
        &self,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(self.api_key.peek().as_bytes().to_vec())
    }

    fn get_notification_source_verification_signature(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let sign = payload
            .get("sign")
            .filter(|sign| !sign.is_empty())
            .ok_or_else(|| report!(ConnectorError::WebhookSignatureNotFound))?;
        hex::decode(sign)
            .change_context(ConnectorError::WebhookSignatureNotFound)
            .attach_printable("sign is not hex")
    }

    fn get_notification_source_verification_message(
        &self,
        payload: &NotificationPayload,
        _merchant_secret: &[u8],
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(self.signed_message(payload.iter()).into_bytes())
    }

    fn get_notice_params(
        &self,
        payload: &NotificationPayload,
    ) -> CustomResult<NoticeParams, ConnectorError> {
        let notification: wechatpay::WechatpayNotification =
            payload.parse_struct("WechatpayNotification")?;
        Ok(NoticeParams {
            trade_status: notification.trade_status(),
            amount: utils::convert_back_amount_or_zero(
                self.amount_converter,
                notification.total_fee,
                self.id(),
            ),
            order_id: notification.out_trade_no,
            payment_id: notification.transaction_id,
        })
    }
}

#[async_trait::async_trait]
impl Payer for Wechatpay {
    fn supported_ways(&self) -> &'static [Way] {
        SUPPORTED_WAYS
    }

    fn success(&self) -> String {
        wechatpay_constants::NOTIFICATION_ACK.to_string()
    }

    #[instrument(skip_all, fields(connector = "wechatpay", way = %way, order_id = %order.id))]
    async fn call(&self, way: Way, order: &Order) -> CustomResult<String, ConnectorError> {
        self.ensure_way_supported(way)?;
        let response = self.unified_order(way, order).await?;
        logger::info!(prepay_id = %response.prepay_id, "Wechatpay unified order succeeded");
        match way {
            Way::Qrcode => Self::get_native_code_url(response),
            Way::App => self.get_app_params(response),
            Way::Wap => self.get_mweb_url(response),
            Way::JsApi | Way::MiniProgram => self.get_js_api_params(way, response),
            Way::Form => Err(utils::construct_way_not_supported_report(way, self.id())),
        }
    }
}
