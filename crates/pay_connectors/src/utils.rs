use std::collections::BTreeMap;

use common_utils::{
    errors::{CustomResult, ParsingError},
    ext_traits::Encode,
    types::{AmountConvertor, MinorUnit},
};
use error_stack::{report, ResultExt};
use pay_env::logger;
use pay_interfaces::{errors::ConnectorError, types::Way};
use quick_xml::events::Event;
use serde::Serialize;

pub(crate) fn construct_way_not_supported_report(
    way: Way,
    connector_name: &'static str,
) -> error_stack::Report<ConnectorError> {
    ConnectorError::WayNotSupported {
        way,
        connector: connector_name,
    }
    .into()
}

pub(crate) fn convert_amount<T>(
    amount_convertor: &dyn AmountConvertor<Output = T>,
    amount: MinorUnit,
) -> Result<T, error_stack::Report<ConnectorError>> {
    amount_convertor
        .convert(amount)
        .change_context(ConnectorError::InvalidDataFormat {
            field_name: "amount",
        })
}

/// Gateway amounts that cannot be read are reported as zero, the notification
/// itself is still accepted.
pub(crate) fn convert_back_amount_or_zero<T: std::fmt::Display + Clone>(
    amount_convertor: &dyn AmountConvertor<Output = T>,
    amount: T,
    connector_name: &'static str,
) -> MinorUnit {
    amount_convertor
        .convert_back(amount.clone())
        .unwrap_or_else(|error| {
            logger::warn!(
                connector = connector_name,
                amount = %amount,
                ?error,
                "Unreadable notification amount, using zero"
            );
            MinorUnit::zero()
        })
}

/// Flatten a serializable request into its string parameters.
///
/// `None` fields are dropped, numbers and booleans are rendered as text.
pub(crate) fn get_request_params<T: Serialize + std::fmt::Debug>(
    request: &T,
) -> CustomResult<BTreeMap<String, String>, ConnectorError> {
    let value = request
        .encode_to_value()
        .change_context(ConnectorError::RequestEncodingFailed)?;
    let serde_json::Value::Object(fields) = value else {
        return Err(report!(ConnectorError::RequestEncodingFailed))
            .attach_printable("Request must serialize to a flat object");
    };

    fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(value) => Some(Ok((key, value))),
            serde_json::Value::Number(value) => Some(Ok((key, value.to_string()))),
            serde_json::Value::Bool(value) => Some(Ok((key, value.to_string()))),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Some(
                Err(report!(ConnectorError::RequestEncodingFailed))
                    .attach_printable_lazy(|| format!("Nested value for parameter {key}")),
            ),
        })
        .collect()
}

/// Sorted `k=v&k=v` string both gateways sign.
///
/// Empty values and the `excluded` keys do not take part in the signature.
pub(crate) fn get_sign_string<'a>(
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
    excluded: &[&str],
) -> String {
    let sorted = params
        .into_iter()
        .filter(|(key, value)| !value.is_empty() && !excluded.contains(key))
        .collect::<BTreeMap<_, _>>();
    sorted
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Read a flat `<xml><key>value</key>...</xml>` document.
///
/// Text and CDATA content are both accepted, nested elements are ignored.
pub(crate) fn xml_to_map(xml: &str) -> CustomResult<BTreeMap<String, String>, ParsingError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.trim_text(true);

    let mut params = BTreeMap::new();
    let mut depth = 0usize;
    let mut current: Option<(String, String)> = None;
    let mut saw_root = false;

    loop {
        match reader
            .read_event()
            .change_context(ParsingError::StructParseFailure("xml document"))?
        {
            Event::Start(element) => {
                depth += 1;
                saw_root = true;
                if depth == 2 {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    current = Some((name, String::new()));
                }
            }
            Event::Empty(element) if depth == 1 => {
                let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                params.insert(name, String::new());
            }
            Event::Text(text) if depth == 2 => {
                let text = text
                    .unescape()
                    .change_context(ParsingError::StructParseFailure("xml text"))?;
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&text);
                }
            }
            Event::CData(data) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some((name, value)) = current.take() {
                        params.insert(name, value);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(report!(ParsingError::StructParseFailure("xml document")))
            .attach_printable("Document has no root element");
    }
    Ok(params)
}

/// Write parameters as a flat `<xml>` document, values wrapped in CDATA.
pub(crate) fn map_to_xml<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let body = params
        .into_iter()
        .map(|(key, value)| {
            format!(
                "<{key}><![CDATA[{}]]></{key}>",
                value.replace("]]>", "]]]]><![CDATA[>")
            )
        })
        .collect::<String>();
    format!("<xml>{body}</xml>")
}
