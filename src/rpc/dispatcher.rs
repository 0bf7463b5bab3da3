use serde_json::Value;
use tracing::debug;

use super::error::DispatchError;
use super::method::Method;
use super::{Request, Response};
use crate::gamepad::Gamepad;

/// Turns requests into gamepad operations.
///
/// Owns the [`Gamepad`]; there is no other path to mutate its state.
#[derive(Debug)]
pub struct Dispatcher {
    gamepad: Gamepad,
}

impl Dispatcher {
    pub fn new(gamepad: Gamepad) -> Self {
        Self { gamepad }
    }

    pub fn gamepad(&self) -> &Gamepad {
        &self.gamepad
    }

    pub fn into_gamepad(self) -> Gamepad {
        self.gamepad
    }

    /// Always produces a response; dispatch faults become error objects.
    pub fn dispatch(&mut self, request: &Request) -> Response {
        let outcome = Method::parse(&request.method, request.params.as_ref())
            .and_then(|method| self.execute(method));
        match outcome {
            Ok(result) => {
                debug!("#{} {} -> {}", request.id, request.method, result);
                Response::success(request.id, result)
            }
            Err(e) => {
                debug!("#{} {} failed: {}", request.id, request.method, e);
                Response::failure(request.id, e.code(), e.to_string())
            }
        }
    }

    pub fn execute(&mut self, method: Method) -> Result<Value, DispatchError> {
        let result = match method {
            Method::Button { index } => Value::Bool(self.gamepad.button(index)?),
            Method::SetButton { index, push } => {
                self.gamepad.set_button(index, push)?;
                Value::Bool(true)
            }
            Method::Hat { index } => Value::from(self.gamepad.hat(index)?.code()),
            Method::SetHat { index, dir } => {
                self.gamepad.set_hat(index, dir)?;
                Value::Bool(true)
            }
            Method::Axis { index } => Value::from(self.gamepad.axis(index)?),
            Method::SetAxis { index, value } => {
                self.gamepad.set_axis(index, value)?;
                Value::Bool(true)
            }
            Method::SendState => {
                self.gamepad.send_state();
                Value::Bool(true)
            }
        };
        Ok(result)
    }
}
