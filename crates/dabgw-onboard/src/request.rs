use serde_json::{json, Value};

use dabgw_core::Category;

/// Error codes sent back to onboard clients in place of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// The body was not decodable JSON.
    IncorrectJson,
    /// The body decoded to something other than an object.
    NotAnObject,
    /// A known key was missing or carried an illegal value.
    IncorrectFormat,
    /// The request type is not one the interface supports.
    UnknownRequestType,
}

impl RequestError {
    /// Wire value carried in the error reply.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestError::IncorrectJson => "incorrect json",
            RequestError::NotAnObject => "request is not an object",
            RequestError::IncorrectFormat => "incorrect request format",
            RequestError::UnknownRequestType => "unknown request type",
        }
    }
}

/// A validated onboard request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Undelivered messages matching `valid`.
    Latest { valid: bool },
    /// Messages of `category` matching `valid`.
    Category { category: Category, valid: bool },
    /// Fixed probe row for interface testing.
    Test,
}

/// Parses and validates one request body.
///
/// Unknown keys are ignored. A missing `valid` defaults to true; a
/// non-boolean `valid` is a format error. A non-string `request_type`
/// is reported as an unknown request type, matching how unsupported
/// types are reported.
pub fn parse_request(body: &[u8]) -> Result<Request, RequestError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| RequestError::IncorrectJson)?;
    let Value::Object(map) = value else {
        return Err(RequestError::NotAnObject);
    };
    let Some(request_type) = map.get("request_type") else {
        return Err(RequestError::IncorrectFormat);
    };
    let valid = match map.get("valid") {
        None => true,
        Some(Value::Bool(valid)) => *valid,
        Some(_) => return Err(RequestError::IncorrectFormat),
    };

    match request_type {
        Value::String(kind) => match kind.as_str() {
            "latest" => Ok(Request::Latest { valid }),
            "category" => {
                let Some(Value::String(label)) = map.get("category") else {
                    return Err(RequestError::IncorrectFormat);
                };
                Ok(Request::Category {
                    category: Category::parse(label),
                    valid,
                })
            }
            "test" => Ok(Request::Test),
            _ => Err(RequestError::UnknownRequestType),
        },
        _ => Err(RequestError::UnknownRequestType),
    }
}

/// Builds the success reply for a served request.
pub fn build_response(request: &Request, information: Value) -> Value {
    match request {
        Request::Category { category, .. } => json!({
            "reply": true,
            "category": category.as_str(),
            "information": information,
        }),
        _ => json!({ "reply": true, "information": information }),
    }
}

/// Builds the error reply for a rejected request.
pub fn error_response(err: RequestError) -> Value {
    json!({ "reply": false, "error_message": err.as_str() })
}

/// Fixed probe row served for test requests.
pub fn test_information() -> Value {
    json!([[1, 4, "other", [1.1234, 5.6789]]])
}
