//! Host-side call stub.
//!
//! Blocking on purpose: one request is written, then responses are read until
//! the one carrying its id arrives. Calls must not overlap. A response that
//! arrives after its call timed out has a lower id and is discarded by whichever
//! call reads it next; a higher id than expected is an [`ClientError::IdMismatch`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::error::ClientError;
use super::method::Method;
use super::{Request, Response};
use crate::gamepad::HatDirection;

/// Serial line settings for [`JoystickClient::open`]; always 8N1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 12_000_000,
            read_timeout_ms: 3000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

pub struct JoystickClient<T> {
    transport: BufReader<T>,
    last_id: i64,
}

impl JoystickClient<Box<dyn SerialPort>> {
    pub fn open(port: &str, config: &SerialConfig) -> Result<Self, ClientError> {
        let serial = serialport::new(port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| ClientError::Open {
                port: port.to_string(),
                source,
            })?;
        info!(
            "Opened {} at {} baud, read timeout {:?}",
            port,
            config.baud_rate,
            config.read_timeout()
        );
        Ok(Self::new(serial))
    }
}

impl<T: Read + Write> JoystickClient<T> {
    /// Wraps an already connected transport. Its read timeout, if any, is the call timeout.
    pub fn new(transport: T) -> Self {
        Self {
            transport: BufReader::new(transport),
            last_id: 0,
        }
    }

    /// Id of the most recent request, 0 before the first call
    pub fn last_id(&self) -> i64 {
        self.last_id
    }

    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }

    pub fn button(&mut self, index: usize) -> Result<bool, ClientError> {
        let method = Method::Button { index };
        let value = self.call(method)?;
        value.as_bool().ok_or(ClientError::UnexpectedResult {
            method: method.name(),
            value,
        })
    }

    pub fn set_button(&mut self, index: usize, push: bool) -> Result<(), ClientError> {
        self.call(Method::SetButton { index, push }).map(drop)
    }

    pub fn hat(&mut self, index: usize) -> Result<HatDirection, ClientError> {
        let method = Method::Hat { index };
        let value = self.call(method)?;
        match value.as_i64() {
            Some(code) => Ok(HatDirection::from_code(code)),
            None => Err(ClientError::UnexpectedResult {
                method: method.name(),
                value,
            }),
        }
    }

    pub fn set_hat(&mut self, index: usize, dir: HatDirection) -> Result<(), ClientError> {
        self.call(Method::SetHat { index, dir }).map(drop)
    }

    pub fn axis(&mut self, index: usize) -> Result<i16, ClientError> {
        let method = Method::Axis { index };
        let value = self.call(method)?;
        match value.as_i64().and_then(|v| i16::try_from(v).ok()) {
            Some(axis) => Ok(axis),
            None => Err(ClientError::UnexpectedResult {
                method: method.name(),
                value,
            }),
        }
    }

    /// The device saturates `value` to -32767..=32767
    pub fn set_axis(&mut self, index: usize, value: i64) -> Result<(), ClientError> {
        self.call(Method::SetAxis { index, value }).map(drop)
    }

    pub fn send_state(&mut self) -> Result<(), ClientError> {
        self.call(Method::SendState).map(drop)
    }

    /// One round trip: write the request line, then read until its response.
    pub fn call(&mut self, method: Method) -> Result<Value, ClientError> {
        self.last_id += 1;
        let id = self.last_id;
        let name = method.name();

        let mut line =
            serde_json::to_vec(&Request::new(id, &method)).map_err(ClientError::Encode)?;
        line.push(b'\n');
        let writer = self.transport.get_mut();
        writer.write_all(&line).map_err(|e| io_failure(name, e))?;
        writer.flush().map_err(|e| io_failure(name, e))?;

        let response = loop {
            let response = self.read_response(name)?;
            if response.id >= id {
                break response;
            }
            debug!(
                "Discarding late response #{} while waiting for #{}",
                response.id, id
            );
        };
        if response.id != id {
            return Err(ClientError::IdMismatch {
                expected: id,
                actual: response.id,
            });
        }
        debug!("#{} {} answered: {:?}", id, name, response);
        response
            .into_result()
            .map_err(|error| ClientError::Rpc {
                code: error.code,
                message: error.message,
            })
    }
}

impl<T: Read> JoystickClient<T> {
    fn read_response(&mut self, name: &'static str) -> Result<Response, ClientError> {
        let mut reply = String::new();
        let read = self
            .transport
            .read_line(&mut reply)
            .map_err(|e| io_failure(name, e))?;
        if read == 0 {
            return Err(ClientError::Closed(name));
        }
        Ok(serde_json::from_str(reply.trim())?)
    }
}

fn io_failure(method: &'static str, error: io::Error) -> ClientError {
    match error.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ClientError::Timeout(method),
        _ => ClientError::Io(error),
    }
}
