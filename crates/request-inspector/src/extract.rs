//! Turning raw request parts into an [`InspectionInput`].
//!
//! Query strings and `application/x-www-form-urlencoded` bodies are decoded
//! once (`+` to space, then percent-decoding), exactly as a web framework
//! would before handing them to application code.  Cookie values are taken
//! verbatim apart from surrounding double quotes.  Anything that cannot be
//! turned into a string is an error, never an empty field.

use std::borrow::Cow;

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use http::request::Parts;

use crate::input::{FieldSource, InspectionInput};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM: &str = "multipart/form-data";

/// Bounds on what a single request may hand to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionLimits {
    /// Longest accepted value, in bytes, after decoding.
    pub max_value_len: usize,
    /// Most fields accepted across query, form and cookies combined.
    pub max_fields: usize,
}

impl Default for InspectionLimits {
    fn default() -> Self {
        Self {
            max_value_len: 16 * 1024,
            max_fields: 512,
        }
    }
}

/// A request whose fields cannot be inspected as given.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{origin} field '{name}' is not valid UTF-8 after decoding")]
    InvalidEncoding { origin: FieldSource, name: String },

    #[error("{origin} data is not valid UTF-8")]
    NonUtf8 { origin: FieldSource },

    #[error("{origin} field '{name}' is {len} bytes, limit is {max}")]
    ValueTooLong {
        origin: FieldSource,
        name: String,
        len: usize,
        max: usize,
    },

    #[error("request carries more than {max} inspectable fields")]
    TooManyFields { max: usize },

    #[error("Content-Type header is not visible ASCII")]
    InvalidContentType,
}

/// Decode a query string (without the leading `?`).
pub fn parse_query(
    raw: &str,
    limits: &InspectionLimits,
) -> Result<Vec<(String, String)>, ExtractError> {
    parse_urlencoded(raw, FieldSource::Query, limits)
}

/// Decode an `application/x-www-form-urlencoded` body.
pub fn parse_form(
    body: &[u8],
    limits: &InspectionLimits,
) -> Result<Vec<(String, String)>, ExtractError> {
    let raw = std::str::from_utf8(body).map_err(|_| ExtractError::NonUtf8 {
        origin: FieldSource::Form,
    })?;
    parse_urlencoded(raw, FieldSource::Form, limits)
}

/// Split every `Cookie` header into `(name, value)` pairs.
///
/// A token without `=` is kept as a value with an empty name so that it is
/// still inspected.
pub fn parse_cookies<'a>(
    headers: impl IntoIterator<Item = &'a HeaderValue>,
    limits: &InspectionLimits,
) -> Result<Vec<(String, String)>, ExtractError> {
    let mut pairs = Vec::new();

    for header in headers {
        let raw = std::str::from_utf8(header.as_bytes()).map_err(|_| ExtractError::NonUtf8 {
            origin: FieldSource::Cookie,
        })?;

        for token in raw.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name.trim(), unquote(value.trim())),
                None => ("", token),
            };
            push_checked(
                &mut pairs,
                FieldSource::Cookie,
                name.to_string(),
                value.to_string(),
                limits,
            )?;
        }
    }

    Ok(pairs)
}

/// Assemble the full [`InspectionInput`] for a request: query parameters,
/// then form fields (when the body is urlencoded), then cookies.
pub fn extract_request(
    parts: &Parts,
    body: &[u8],
    limits: &InspectionLimits,
) -> Result<InspectionInput, ExtractError> {
    let mut input = InspectionInput::new();

    if let Some(query) = parts.uri.query() {
        input.extend_from(FieldSource::Query, parse_query(query, limits)?);
    }

    if is_form_urlencoded(&parts.headers)? {
        input.extend_from(FieldSource::Form, parse_form(body, limits)?);
    }

    input.extend_from(
        FieldSource::Cookie,
        parse_cookies(parts.headers.get_all(COOKIE), limits)?,
    );

    if input.len() > limits.max_fields {
        return Err(ExtractError::TooManyFields {
            max: limits.max_fields,
        });
    }

    Ok(input)
}

/// True when the request body is `application/x-www-form-urlencoded`.
///
/// An unreadable `Content-Type` is an error: the body type, and so whether
/// it needs inspecting, cannot be known.
pub fn is_form_urlencoded(headers: &HeaderMap) -> Result<bool, ExtractError> {
    let media = media_type(headers)?;
    Ok(media.is_some_and(|m| m.eq_ignore_ascii_case(FORM_URLENCODED)))
}

/// True when the request body is `multipart/form-data`, which this crate
/// does not decode.
pub fn is_multipart(headers: &HeaderMap) -> Result<bool, ExtractError> {
    let media = media_type(headers)?;
    Ok(media.is_some_and(|m| m.eq_ignore_ascii_case(MULTIPART_FORM)))
}

/// The `type/subtype` part of `Content-Type`, without parameters.
fn media_type(headers: &HeaderMap) -> Result<Option<&str>, ExtractError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| ExtractError::InvalidContentType)?;
    Ok(value.split(';').next().map(str::trim))
}

fn parse_urlencoded(
    raw: &str,
    origin: FieldSource,
    limits: &InspectionLimits,
) -> Result<Vec<(String, String)>, ExtractError> {
    let mut pairs = Vec::new();

    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        let (raw_name, raw_value) = segment.split_once('=').unwrap_or((segment, ""));

        let name = decode_component(raw_name).ok_or_else(|| ExtractError::InvalidEncoding {
            origin,
            name: raw_name.to_string(),
        })?;
        let value = decode_component(raw_value).ok_or_else(|| ExtractError::InvalidEncoding {
            origin,
            name: name.clone(),
        })?;

        push_checked(&mut pairs, origin, name, value, limits)?;
    }

    Ok(pairs)
}

fn push_checked(
    pairs: &mut Vec<(String, String)>,
    origin: FieldSource,
    name: String,
    value: String,
    limits: &InspectionLimits,
) -> Result<(), ExtractError> {
    if pairs.len() >= limits.max_fields {
        return Err(ExtractError::TooManyFields {
            max: limits.max_fields,
        });
    }
    if value.len() > limits.max_value_len {
        return Err(ExtractError::ValueTooLong {
            origin,
            name,
            len: value.len(),
            max: limits.max_value_len,
        });
    }
    pairs.push((name, value));
    Ok(())
}

/// `+` to space, then percent-decode.  `None` when the bytes are not UTF-8.
/// Malformed escapes such as `%zz` are kept literally.
fn decode_component(raw: &str) -> Option<String> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
