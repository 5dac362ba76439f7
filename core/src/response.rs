//! Normalization of raw responses into `Response<R>` or `ApiError`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::http::HttpResponse;

/// A successful (2xx) response with its decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<R = Value> {
    pub status: u16,
    pub data: R,
}

/// Map a raw response onto the normalized result.
///
/// Any 2xx is a success whose body is parsed as JSON, an empty body reading
/// as `null`; bytes that are not UTF-8 JSON are a `Decode` error. Everything
/// else is `RequestFailed` with the body kept as JSON when it parses and as
/// text otherwise.
pub fn parse_response<R: DeserializeOwned>(response: HttpResponse) -> Result<Response<R>, ApiError> {
    let status = response.status;
    if !(200..300).contains(&status) {
        return Err(ApiError::RequestFailed {
            status,
            body: ErrorBody::from_raw(String::from_utf8_lossy(&response.body).into_owned()),
        });
    }

    let value = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body).map_err(|source| ApiError::Decode { status, source })?
    };
    let data = serde_json::from_value(value).map_err(|source| ApiError::Decode { status, source })?;
    Ok(Response { status, data })
}
