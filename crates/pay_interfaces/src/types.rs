//! Data carried between callers and the payment gateway adapters

pub use common_utils::types::MinorUnit;
use serde::{Deserialize, Serialize};

/// An order the caller wants paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Merchant side order identifier, unique per merchant
    pub id: String,
    /// Human readable description shown to the payer
    pub title: String,
    /// Amount in minor currency units (fen)
    pub amount: MinorUnit,
    /// Client ip of the payer
    pub ip: Option<String>,
    /// Gateway specific user identifier (WeChat `openid`)
    pub open_id: Option<String>,
}

impl Order {
    /// Order without client ip or open id
    pub fn new(id: impl Into<String>, title: impl Into<String>, amount: MinorUnit) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            amount,
            ip: None,
            open_id: None,
        }
    }

    /// Attach the payer's client ip
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Attach the gateway specific user identifier
    pub fn with_open_id(mut self, open_id: impl Into<String>) -> Self {
        self.open_id = Some(open_id.into());
        self
    }
}

/// Payment channel the caller wants an artifact for
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Way {
    /// Desktop browser checkout page
    Form,
    /// QR code scanned by the gateway's wallet app
    Qrcode,
    /// Native app invoking the gateway SDK
    App,
    /// Mobile browser checkout
    Wap,
    /// In-wallet web page (WeChat JSAPI)
    JsApi,
    /// Mini program
    MiniProgram,
}

/// Normalized trade status
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TradeStatus {
    /// Waiting for the payer, also used for anything unrecognized
    #[default]
    Wait,
    /// Paid
    Success,
    /// Closed without payment
    Closed,
    /// Paid and no longer refundable
    Finished,
}

/// Normalized content of a verified gateway notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeParams {
    /// Merchant side order identifier
    pub order_id: String,
    /// Gateway side transaction identifier
    pub payment_id: String,
    /// Trade status
    pub trade_status: TradeStatus,
    /// Amount in minor units
    pub amount: MinorUnit,
}
