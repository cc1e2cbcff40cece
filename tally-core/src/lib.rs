use {
    serde::{Serialize, Deserialize},
    thiserror::Error,
    http::{HeaderMap, header::{IntoHeaderName, HeaderValue}, StatusCode},
};

/// Response produced by a counter invocation. Status, headers and body are
/// typed and only converted to the transport representation at the server
/// boundary.
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: vec![],
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn with_header<K: IntoHeaderName>(mut self, header_name: K, header_value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(header_name, header_value.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl HttpResponseBody) -> Self {
        self.body = body.into_bytes();
        self
    }
}

pub trait HttpResponseBody {
    fn into_bytes(self) -> Vec<u8>;
}

impl HttpResponseBody for Vec<u8> {
    fn into_bytes(self) -> Vec<u8> { self }
}

impl HttpResponseBody for String {
    fn into_bytes(self) -> Vec<u8> { self.into_bytes() }
}

impl HttpResponseBody for &str {
    fn into_bytes(self) -> Vec<u8> { self.as_bytes().to_vec() }
}

/// JSON body returned to the website. The count travels as a decimal string,
/// not a JSON number.
#[derive(Debug, Serialize, Deserialize)]
pub struct VisitorCount {
    pub count: String,
}

impl VisitorCount {
    pub fn from_quantity(quantity: u64) -> Self {
        Self {
            count: quantity.to_string(),
        }
    }

    pub fn quantity(&self) -> Result<u64, VisitorCountError> {
        self.count.parse()
            .map_err(|err| VisitorCountError::NotANumber { reason: format!("{err:?}") })
    }
}

#[derive(Error, Debug)]
pub enum VisitorCountError {
    #[error("count does not hold a non-negative integer: {reason}")]
    NotANumber { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_a_decimal_string() {
        assert_eq!("0", VisitorCount::from_quantity(0).count);
        assert_eq!("7", VisitorCount::from_quantity(7).count);
        assert_eq!("18446744073709551615", VisitorCount::from_quantity(u64::MAX).count);
    }

    #[test]
    fn serializes_to_a_single_count_field() {
        let body = serde_json::to_string(&VisitorCount::from_quantity(6)).unwrap();
        assert_eq!(r#"{"count":"6"}"#, body);
    }

    #[test]
    fn quantity_parses_the_count_back() {
        let parsed: VisitorCount = serde_json::from_str(r#"{"count":"42"}"#).unwrap();
        assert_eq!(42, parsed.quantity().unwrap());
    }

    #[test]
    fn quantity_rejects_non_numeric_count() {
        let parsed: VisitorCount = serde_json::from_str(r#"{"count":"not-a-number"}"#).unwrap();
        match parsed.quantity() {
            Err(VisitorCountError::NotANumber { reason: _ }) => {},
            other => panic!("unexpected result: {other:?}, expected NotANumber"),
        }
    }

    #[test]
    fn response_builder_sets_status_headers_and_body() {
        let response = HttpResponse::new()
            .with_status(StatusCode::OK)
            .with_header("Access-Control-Allow-Origin", HeaderValue::from_static("*"))
            .with_body(r#"{"count":"1"}"#);

        assert_eq!(StatusCode::OK, response.status);
        assert_eq!("*", response.headers().get("Access-Control-Allow-Origin").unwrap().to_str().unwrap());
        assert_eq!(r#"{"count":"1"}"#.as_bytes(), response.body.as_slice());
    }
}
