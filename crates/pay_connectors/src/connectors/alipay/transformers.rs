use common_utils::{date_time, ext_traits::Encode, types::StringMajorUnit};
use error_stack::{report, ResultExt};
use masking::{KeyMaterial, Secret};
use pay_interfaces::{
    consts,
    errors::ConnectorError,
    types::{Order, TradeStatus},
};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::constants::alipay as alipay_constants;

/// Credentials and endpoints of an Alipay application
#[derive(Clone, Debug, Deserialize)]
pub struct AlipayOptions {
    pub app_id: String,
    /// Alipay public key, PEM or base64 DER
    pub alipay_public_key: Secret<String, KeyMaterial>,
    /// Application private key, PEM or base64 DER (PKCS#1 or PKCS#8)
    pub app_private_key: Secret<String, KeyMaterial>,
    #[serde(default)]
    pub is_production: bool,
    pub notify_url: String,
    #[serde(default)]
    pub return_url: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug)]
pub struct AlipayRouterData<'a> {
    pub amount: StringMajorUnit,
    pub method: AlipayMethod,
    pub order: &'a Order,
    pub options: &'a AlipayOptions,
}

impl<'a> From<(StringMajorUnit, AlipayMethod, &'a Order, &'a AlipayOptions)>
    for AlipayRouterData<'a>
{
    fn from(
        (amount, method, order, options): (StringMajorUnit, AlipayMethod, &'a Order, &'a AlipayOptions),
    ) -> Self {
        Self {
            amount,
            method,
            order,
            options,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
pub enum AlipayMethod {
    #[serde(rename = "alipay.trade.page.pay")]
    #[strum(serialize = "alipay.trade.page.pay")]
    PagePay,
    #[serde(rename = "alipay.trade.wap.pay")]
    #[strum(serialize = "alipay.trade.wap.pay")]
    WapPay,
    #[serde(rename = "alipay.trade.app.pay")]
    #[strum(serialize = "alipay.trade.app.pay")]
    AppPay,
    #[serde(rename = "alipay.trade.precreate")]
    #[strum(serialize = "alipay.trade.precreate")]
    Precreate,
}

impl AlipayMethod {
    fn product_code(self) -> Option<&'static str> {
        match self {
            Self::PagePay => Some("FAST_INSTANT_TRADE_PAY"),
            Self::WapPay => Some("QUICK_WAP_WAY"),
            Self::AppPay => Some("QUICK_MSECURITY_PAY"),
            Self::Precreate => None,
        }
    }

    /// Browser channels send the payer back to the merchant afterwards
    fn returns_to_merchant(self) -> bool {
        matches!(self, Self::PagePay | Self::WapPay)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum AlipaySignType {
    #[default]
    #[serde(rename = "RSA2")]
    #[strum(serialize = "RSA2")]
    Rsa2,
    #[serde(rename = "RSA")]
    #[strum(serialize = "RSA")]
    Rsa,
}

#[derive(Debug, Serialize)]
pub struct AlipayBizContent {
    out_trade_no: String,
    total_amount: StringMajorUnit,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quit_url: Option<String>,
}

impl TryFrom<&AlipayRouterData<'_>> for AlipayBizContent {
    type Error = error_stack::Report<ConnectorError>;
    fn try_from(item: &AlipayRouterData<'_>) -> Result<Self, Self::Error> {
        if item.order.id.is_empty() {
            return Err(report!(ConnectorError::MissingRequiredField { field_name: "id" }));
        }
        let quit_url = (item.method == AlipayMethod::WapPay)
            .then(|| non_empty(&item.options.return_url))
            .flatten();
        Ok(Self {
            out_trade_no: item.order.id.clone(),
            total_amount: item.amount.clone(),
            subject: item.order.title.clone(),
            product_code: item.method.product_code(),
            quit_url,
        })
    }
}

/// Public request parameters shared by every gateway method, `sign` excluded
#[derive(Debug, Serialize)]
pub struct AlipayCommonRequest {
    app_id: String,
    method: AlipayMethod,
    format: &'static str,
    charset: &'static str,
    sign_type: AlipaySignType,
    timestamp: String,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<String>,
    biz_content: String,
}

impl TryFrom<&AlipayRouterData<'_>> for AlipayCommonRequest {
    type Error = error_stack::Report<ConnectorError>;
    fn try_from(item: &AlipayRouterData<'_>) -> Result<Self, Self::Error> {
        let biz_content = AlipayBizContent::try_from(item)?
            .encode_to_string_of_json()
            .change_context(ConnectorError::RequestEncodingFailed)?;
        let timestamp = date_time::format_china_standard_time(date_time::now())
            .change_context(ConnectorError::RequestEncodingFailed)?;
        let return_url = item
            .method
            .returns_to_merchant()
            .then(|| non_empty(&item.options.return_url))
            .flatten();
        Ok(Self {
            app_id: item.options.app_id.clone(),
            method: item.method,
            format: alipay_constants::FORMAT,
            charset: alipay_constants::CHARSET,
            sign_type: AlipaySignType::Rsa2,
            timestamp,
            version: alipay_constants::VERSION,
            notify_url: non_empty(&item.options.notify_url),
            return_url,
            biz_content,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Gateway answer, the method node is kept raw because its exact text is signed
#[derive(Debug, Deserialize)]
pub struct AlipayPrecreateEnvelope<'a> {
    #[serde(borrow, default)]
    pub alipay_trade_precreate_response: Option<&'a RawValue>,
    #[serde(borrow, default)]
    pub error_response: Option<&'a RawValue>,
    #[serde(default)]
    pub sign: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlipayPrecreateResponse {
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub sub_code: Option<String>,
    #[serde(default)]
    pub sub_msg: Option<String>,
    #[serde(default)]
    pub out_trade_no: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl AlipayPrecreateResponse {
    pub fn is_success(&self) -> bool {
        self.code == alipay_constants::SUCCESS_CODE
    }

    /// Business failure built from the most specific code and message present
    pub fn into_failure(self) -> ConnectorError {
        ConnectorError::FailedAtConnector {
            code: self.sub_code.unwrap_or(self.code),
            message: self
                .sub_msg
                .or(self.msg)
                .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlipayTradeStatus {
    WaitBuyerPay,
    TradeClosed,
    TradeSuccess,
    TradeFinished,
    #[default]
    #[serde(other)]
    Unknown,
}

impl From<AlipayTradeStatus> for TradeStatus {
    fn from(item: AlipayTradeStatus) -> Self {
        match item {
            AlipayTradeStatus::WaitBuyerPay | AlipayTradeStatus::Unknown => Self::Wait,
            AlipayTradeStatus::TradeClosed => Self::Closed,
            AlipayTradeStatus::TradeSuccess => Self::Success,
            AlipayTradeStatus::TradeFinished => Self::Finished,
        }
    }
}

/// Asynchronous payment notification, every value arrives as text
#[derive(Debug, Deserialize)]
pub struct AlipayNotification {
    pub out_trade_no: String,
    #[serde(default)]
    pub trade_no: String,
    #[serde(default)]
    pub trade_status: AlipayTradeStatus,
    #[serde(default)]
    pub total_amount: StringMajorUnit,
}
