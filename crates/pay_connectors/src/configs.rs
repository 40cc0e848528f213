//! Settings of the payment adapters and the registry building them

use std::path::PathBuf;

use common_utils::errors::{CustomResult, ValidationError};
use config::{Environment, File};
use error_stack::{report, ResultExt};
use pay_env::{env, logger};
use pay_interfaces::{
    api::Payer,
    client::ProxyClient,
    configs::Proxy,
    errors::ConnectorError,
};
use serde::Deserialize;

use crate::connectors::{Alipay, AlipayOptions, Wechatpay, WechatpayOptions};

/// Prefix of environment variables overriding file values, e.g. `PAY__ALIPAY__APP_ID`
const ENV_PREFIX: &str = "PAY";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unable to load configuration from {0}")]
    ConfigLoadFailed(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: pay_env::Log,
    pub proxy: Proxy,
    pub alipay: Option<AlipayOptions>,
    pub wechatpay: Option<WechatpayOptions>,
}

/// Adapters the registry can build
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connector {
    Alipay,
    Wechatpay,
}

impl Settings {
    /// Load `config/<environment>.toml` from the workspace, chosen by `RUN_ENV`
    pub fn new() -> CustomResult<Self, SettingsError> {
        let config_path = env::workspace_path()
            .join("config")
            .join(format!("{}.toml", env::which().config_file_stem()));
        Self::with_config_path(config_path)
    }

    /// Load settings from `config_path`, then apply `PAY__` environment overrides.
    ///
    /// A missing file is not an error, every section is optional.
    /// Overrides are kept as strings, so numeric-looking keys and ids survive intact.
    pub fn with_config_path(config_path: PathBuf) -> CustomResult<Self, SettingsError> {
        Self::load(config_path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load(config_path: PathBuf, environment: Environment) -> CustomResult<Self, SettingsError> {
        let display_path = config_path.display().to_string();
        let settings: Self = config::Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(environment.separator("__"))
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .change_context_lazy(|| SettingsError::ConfigLoadFailed(display_path.clone()))?;

        logger::debug!(
            config_path = %display_path,
            alipay = settings.alipay.is_some(),
            wechatpay = settings.wechatpay.is_some(),
            "Loaded payment settings"
        );
        Ok(settings)
    }

    /// Reject configured sections that are missing their identifiers
    pub fn validate(&self) -> CustomResult<(), ValidationError> {
        if let Some(alipay) = &self.alipay {
            ensure_not_blank("alipay.app_id", &alipay.app_id)?;
            ensure_not_blank("alipay.notify_url", &alipay.notify_url)?;
        }
        if let Some(wechatpay) = &self.wechatpay {
            ensure_not_blank("wechatpay.app_id", &wechatpay.app_id)?;
            ensure_not_blank("wechatpay.mch_id", &wechatpay.mch_id)?;
            ensure_not_blank("wechatpay.notify_url", &wechatpay.notify_url)?;
        }
        Ok(())
    }

    /// Build the adapter for `connector` from its section
    pub fn get_payer(&self, connector: Connector) -> CustomResult<Box<dyn Payer>, ConnectorError> {
        let client = Box::new(
            ProxyClient::new(&self.proxy)
                .change_context(ConnectorError::InvalidConnectorConfig { config: "proxy" })?,
        );
        let payer: Box<dyn Payer> = match connector {
            Connector::Alipay => {
                let options = self.alipay.clone().ok_or_else(|| {
                    report!(ConnectorError::InvalidConnectorConfig { config: "alipay" })
                })?;
                Box::new(Alipay::with_client(options, client)?)
            }
            Connector::Wechatpay => {
                let options = self.wechatpay.clone().ok_or_else(|| {
                    report!(ConnectorError::InvalidConnectorConfig {
                        config: "wechatpay"
                    })
                })?;
                Box::new(Wechatpay::with_client(options, client)?)
            }
        };
        logger::info!(connector = %connector, "Payment adapter ready");
        Ok(payer)
    }
}

fn ensure_not_blank(field: &str, value: &str) -> CustomResult<(), ValidationError> {
    if value.trim().is_empty() {
        Err(report!(ValidationError::InvalidValue {
            message: format!("{field} must not be empty"),
        }))
    } else {
        Ok(())
    }
}
