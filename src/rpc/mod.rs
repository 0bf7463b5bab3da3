//! # Line-delimited JSON-RPC over a byte stream
//!
//! One JSON object per line in each direction. The device side runs the
//! [`server::RpcServer`], the host side drives it through
//! [`client::JoystickClient`]; both share the wire types defined here.
//!
//! ```text
//! Request:  {"id":1,"jsonrpc":"2.0","method":"SetAxis","params":{"index":2,"value":-500}}
//! Response: {"id":1,"result":true}
//!           {"id":1,"error":{"code":-32603,"message":"missing argument: value"}}
//! ```
//!
//! Requests are answered strictly in order, one response per request, so the
//! id mostly serves as a sanity check on the client side.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod method;
pub mod server;

pub use client::{JoystickClient, SerialConfig};
pub use dispatcher::Dispatcher;
pub use error::{ClientError, DispatchError, ServerError};
pub use method::Method;
pub use server::RpcServer;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Error code carried by every dispatch failure, unknown methods included
pub const INTERNAL_ERROR: i64 = -32603;

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl Request {
    pub fn new(id: i64, method: &Method) -> Self {
        let params = method.params();
        Self {
            id,
            jsonrpc: default_version(),
            method: method.name().to_string(),
            params: (!params.is_empty()).then_some(params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Exactly one of `result` and `error` is set by the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: i64, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }

    /// An error object wins over a result; a missing result reads as null.
    pub fn into_result(self) -> Result<Value, ErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
