use common_utils::{ext_traits::Encode, types::StringMinorUnit};
use error_stack::{report, ResultExt};
use masking::{KeyMaterial, Secret};
use pay_interfaces::{
    consts,
    errors::ConnectorError,
    types::{Order, TradeStatus, Way},
};
use serde::{Deserialize, Serialize};

use crate::{constants::wechatpay as wechatpay_constants, utils};

/// Merchant credentials and endpoints for the WeChat Pay v2 API
#[derive(Clone, Debug, Deserialize)]
pub struct WechatpayOptions {
    pub app_id: String,
    pub mch_id: String,
    /// Merchant API key used for MD5 and HMAC-SHA256 signatures
    pub api_key: Secret<String, KeyMaterial>,
    #[serde(default)]
    pub is_production: bool,
    pub notify_url: String,
    /// Site reported in the H5 scene info
    #[serde(default)]
    pub api_domain: String,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub mini_program_app_id: Option<String>,
    #[serde(default)]
    pub sign_type: WechatpaySignType,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WechatpayOptions {
    /// Mini programs pay under their own app id when one is configured
    pub fn app_id_for(&self, way: Way) -> &str {
        match (way, self.mini_program_app_id.as_deref()) {
            (Way::MiniProgram, Some(app_id)) if !app_id.is_empty() => app_id,
            _ => &self.app_id,
        }
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
pub enum WechatpaySignType {
    #[default]
    #[serde(rename = "MD5")]
    #[strum(serialize = "MD5")]
    Md5,
    #[serde(rename = "HMAC-SHA256")]
    #[strum(serialize = "HMAC-SHA256")]
    HmacSha256,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum WechatpayTradeType {
    Native,
    App,
    Mweb,
    Jsapi,
}

impl TryFrom<Way> for WechatpayTradeType {
    type Error = error_stack::Report<ConnectorError>;
    fn try_from(way: Way) -> Result<Self, Self::Error> {
        match way {
            Way::Qrcode => Ok(Self::Native),
            Way::App => Ok(Self::App),
            Way::Wap => Ok(Self::Mweb),
            Way::JsApi | Way::MiniProgram => Ok(Self::Jsapi),
            Way::Form => Err(utils::construct_way_not_supported_report(
                way,
                "wechatpay",
            )),
        }
    }
}

#[derive(Debug)]
pub struct WechatpayRouterData<'a> {
    pub amount: StringMinorUnit,
    pub way: Way,
    pub order: &'a Order,
    pub options: &'a WechatpayOptions,
    pub nonce_str: String,
}

impl<'a> From<(StringMinorUnit, Way, &'a Order, &'a WechatpayOptions, String)>
    for WechatpayRouterData<'a>
{
    fn from(
        (amount, way, order, options, nonce_str): (
            StringMinorUnit,
            Way,
            &'a Order,
            &'a WechatpayOptions,
            String,
        ),
    ) -> Self {
        Self {
            amount,
            way,
            order,
            options,
            nonce_str,
        }
    }
}

#[derive(Debug, Serialize)]
struct WechatpayH5SceneInfo {
    h5_info: WechatpayH5Info,
}

#[derive(Debug, Serialize)]
struct WechatpayH5Info {
    #[serde(rename = "type")]
    h5_type: &'static str,
    wap_url: String,
    wap_name: String,
}

/// `pay/unifiedorder` parameters, `sign` excluded
#[derive(Debug, Serialize)]
pub struct WechatpayUnifiedOrderRequest {
    appid: String,
    mch_id: String,
    nonce_str: String,
    sign_type: WechatpaySignType,
    body: String,
    out_trade_no: String,
    total_fee: StringMinorUnit,
    spbill_create_ip: String,
    notify_url: String,
    trade_type: WechatpayTradeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene_info: Option<String>,
}

impl TryFrom<&WechatpayRouterData<'_>> for WechatpayUnifiedOrderRequest {
    type Error = error_stack::Report<ConnectorError>;
    fn try_from(item: &WechatpayRouterData<'_>) -> Result<Self, Self::Error> {
        let trade_type = WechatpayTradeType::try_from(item.way)?;
        let order = item.order;
        if order.id.is_empty() {
            return Err(report!(ConnectorError::MissingRequiredField { field_name: "id" }));
        }

        let client_ip = order.ip.clone().filter(|ip| !ip.is_empty());
        let spbill_create_ip = match trade_type {
            WechatpayTradeType::Native => {
                client_ip.unwrap_or_else(|| consts::DEFAULT_CLIENT_IP.to_string())
            }
            WechatpayTradeType::App | WechatpayTradeType::Mweb | WechatpayTradeType::Jsapi => {
                client_ip.ok_or_else(|| {
                    report!(ConnectorError::MissingRequiredField { field_name: "ip" })
                })?
            }
        };

        let openid = match trade_type {
            WechatpayTradeType::Jsapi => Some(
                order
                    .open_id
                    .clone()
                    .filter(|open_id| !open_id.is_empty())
                    .ok_or_else(|| {
                        report!(ConnectorError::MissingRequiredField {
                            field_name: "open_id"
                        })
                    })?,
            ),
            _ => None,
        };

        let scene_info = match trade_type {
            WechatpayTradeType::Mweb => Some(
                WechatpayH5SceneInfo {
                    h5_info: WechatpayH5Info {
                        h5_type: wechatpay_constants::H5_SCENE_TYPE,
                        wap_url: item.options.api_domain.clone(),
                        wap_name: order.title.clone(),
                    },
                }
                .encode_to_string_of_json()
                .change_context(ConnectorError::RequestEncodingFailed)?,
            ),
            _ => None,
        };

        Ok(Self {
            appid: item.options.app_id_for(item.way).to_string(),
            mch_id: item.options.mch_id.clone(),
            nonce_str: item.nonce_str.clone(),
            sign_type: item.options.sign_type,
            body: order.title.clone(),
            out_trade_no: order.id.clone(),
            total_fee: item.amount.clone(),
            spbill_create_ip,
            notify_url: item.options.notify_url.clone(),
            trade_type,
            product_id: (trade_type == WechatpayTradeType::Native).then(|| order.id.clone()),
            openid,
            scene_info,
        })
    }
}

/// Successful `pay/unifiedorder` answer
#[derive(Debug, Deserialize)]
pub struct WechatpayUnifiedOrderResponse {
    #[serde(default)]
    pub prepay_id: String,
    #[serde(default)]
    pub code_url: String,
    #[serde(default)]
    pub mweb_url: String,
}

/// Parameters handed to the WeChat app SDK, `sign` excluded
#[derive(Debug, Serialize)]
pub struct WechatpayAppParams {
    pub appid: String,
    pub partnerid: String,
    pub prepayid: String,
    pub package: &'static str,
    pub noncestr: String,
    pub timestamp: String,
}

/// Parameters for `WeixinJSBridge` / `wx.requestPayment`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatpayJsApiParams {
    pub app_id: String,
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: WechatpaySignType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_sign: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum WechatpayTradeState {
    Success,
    Refund,
    Notpay,
    Closed,
    Revoked,
    Userpaying,
    Payerror,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Payment result notification
#[derive(Debug, Deserialize)]
pub struct WechatpayNotification {
    pub out_trade_no: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub result_code: String,
    #[serde(default)]
    pub trade_state: WechatpayTradeState,
    #[serde(default)]
    pub total_fee: StringMinorUnit,
}

impl WechatpayNotification {
    /// WeChat Pay notices carry `trade_state`/`result_code`, never Alipay's `TRADE_*` statuses.
    ///
    /// `trade_state` when the gateway sent one, otherwise the `result_code`
    pub fn trade_status(&self) -> TradeStatus {
        match self.trade_state {
            WechatpayTradeState::Success | WechatpayTradeState::Refund => TradeStatus::Success,
            WechatpayTradeState::Closed
            | WechatpayTradeState::Revoked
            | WechatpayTradeState::Payerror => TradeStatus::Closed,
            WechatpayTradeState::Notpay | WechatpayTradeState::Userpaying => TradeStatus::Wait,
            WechatpayTradeState::Unknown if self.result_code == wechatpay_constants::SUCCESS => {
                TradeStatus::Success
            }
            WechatpayTradeState::Unknown => TradeStatus::Wait,
        }
    }
}
