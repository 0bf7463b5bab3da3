//! Typed method catalogue.
//!
//! The wire stays loosely typed (a name plus a JSON object), but every request
//! is narrowed into a [`Method`] before anything touches the gamepad. That
//! narrowing step is the only place parameter types are checked.

use serde_json::{json, Map, Value};

use super::error::DispatchError;
use crate::gamepad::HatDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Button { index: usize },
    SetButton { index: usize, push: bool },
    Hat { index: usize },
    SetHat { index: usize, dir: HatDirection },
    Axis { index: usize },
    SetAxis { index: usize, value: i64 },
    SendState,
}

impl Method {
    pub const NAMES: [&'static str; 7] = [
        "Button",
        "SetButton",
        "Hat",
        "SetHat",
        "Axis",
        "SetAxis",
        "SendState",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Button { .. } => "Button",
            Method::SetButton { .. } => "SetButton",
            Method::Hat { .. } => "Hat",
            Method::SetHat { .. } => "SetHat",
            Method::Axis { .. } => "Axis",
            Method::SetAxis { .. } => "SetAxis",
            Method::SendState => "SendState",
        }
    }

    /// Validates `params` against the schema of method `name`.
    ///
    /// Arguments are checked in declaration order, so the first missing or
    /// mistyped one is the one reported.
    pub fn parse(name: &str, params: Option<&Map<String, Value>>) -> Result<Self, DispatchError> {
        let args = Args(params);
        let method = match name {
            "Button" => Method::Button {
                index: args.index("index")?,
            },
            "SetButton" => Method::SetButton {
                index: args.index("index")?,
                push: args.boolean("push")?,
            },
            "Hat" => Method::Hat {
                index: args.index("index")?,
            },
            "SetHat" => Method::SetHat {
                index: args.index("index")?,
                dir: HatDirection::from_code(args.integer("dir")?),
            },
            "Axis" => Method::Axis {
                index: args.index("index")?,
            },
            "SetAxis" => Method::SetAxis {
                index: args.index("index")?,
                value: args.integer("value")?,
            },
            "SendState" => Method::SendState,
            other => return Err(DispatchError::UnknownMethod(other.to_string())),
        };
        Ok(method)
    }

    /// Parameter object as the client puts it on the wire
    pub fn params(&self) -> Map<String, Value> {
        let value = match *self {
            Method::Button { index } | Method::Hat { index } | Method::Axis { index } => {
                json!({ "index": index })
            }
            Method::SetButton { index, push } => json!({ "index": index, "push": push }),
            Method::SetHat { index, dir } => json!({ "index": index, "dir": dir.code() }),
            Method::SetAxis { index, value } => json!({ "index": index, "value": value }),
            Method::SendState => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

struct Args<'a>(Option<&'a Map<String, Value>>);

impl Args<'_> {
    fn get(&self, name: &'static str) -> Result<&Value, DispatchError> {
        self.0
            .and_then(|params| params.get(name))
            .ok_or(DispatchError::MissingArgument(name))
    }

    /// Any JSON number, truncated toward zero
    fn integer(&self, name: &'static str) -> Result<i64, DispatchError> {
        let value = self.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
            .ok_or(DispatchError::InvalidArgument(name))
    }

    fn index(&self, name: &'static str) -> Result<usize, DispatchError> {
        let value = self.integer(name)?;
        usize::try_from(value).map_err(|_| DispatchError::InvalidArgument(name))
    }

    fn boolean(&self, name: &'static str) -> Result<bool, DispatchError> {
        self.get(name)?
            .as_bool()
            .ok_or(DispatchError::InvalidArgument(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn parses_every_catalogued_method() {
        let cases = [
            ("Button", json!({"index": 3}), Method::Button { index: 3 }),
            (
                "SetButton",
                json!({"index": 1, "push": true}),
                Method::SetButton { index: 1, push: true },
            ),
            ("Hat", json!({"index": 0}), Method::Hat { index: 0 }),
            (
                "SetHat",
                json!({"index": 0, "dir": 5}),
                Method::SetHat {
                    index: 0,
                    dir: HatDirection::DownLeft,
                },
            ),
            ("Axis", json!({"index": 2}), Method::Axis { index: 2 }),
            (
                "SetAxis",
                json!({"index": 2, "value": -500}),
                Method::SetAxis { index: 2, value: -500 },
            ),
            ("SendState", json!({}), Method::SendState),
        ];
        for (name, raw, expected) in cases {
            assert_eq!(Method::parse(name, Some(&params(raw))), Ok(expected), "{name}");
            assert!(Method::NAMES.contains(&expected.name()));
        }
    }

    #[test]
    fn send_state_needs_no_params() {
        assert_eq!(Method::parse("SendState", None), Ok(Method::SendState));
    }

    #[test]
    fn unknown_method_is_reported_by_name() {
        assert_eq!(
            Method::parse("Rumble", None),
            Err(DispatchError::UnknownMethod("Rumble".to_string()))
        );
    }

    #[test]
    fn missing_and_mistyped_arguments_are_named() {
        assert_eq!(
            Method::parse("SetButton", Some(&params(json!({"push": true})))),
            Err(DispatchError::MissingArgument("index"))
        );
        assert_eq!(
            Method::parse("SetButton", Some(&params(json!({"index": "0", "push": true})))),
            Err(DispatchError::InvalidArgument("index"))
        );
        assert_eq!(
            Method::parse("SetButton", Some(&params(json!({"index": 0, "push": 1})))),
            Err(DispatchError::InvalidArgument("push"))
        );
        assert_eq!(
            Method::parse("SetAxis", Some(&params(json!({"index": 0})))),
            Err(DispatchError::MissingArgument("value"))
        );
        assert_eq!(Method::parse("Axis", None), Err(DispatchError::MissingArgument("index")));
    }

    #[test]
    fn numbers_are_truncated_toward_zero() {
        assert_eq!(
            Method::parse("SetAxis", Some(&params(json!({"index": 1.9, "value": -12.7})))),
            Ok(Method::SetAxis { index: 1, value: -12 })
        );
    }

    #[test]
    fn negative_index_is_invalid() {
        assert_eq!(
            Method::parse("Button", Some(&params(json!({"index": -1})))),
            Err(DispatchError::InvalidArgument("index"))
        );
    }

    #[test]
    fn out_of_range_hat_code_centers() {
        assert_eq!(
            Method::parse("SetHat", Some(&params(json!({"index": 0, "dir": 200})))),
            Ok(Method::SetHat {
                index: 0,
                dir: HatDirection::Centered
            })
        );
    }

    #[test]
    fn params_round_trip_through_parse() {
        let methods = [
            Method::SetButton { index: 9, push: true },
            Method::SetHat {
                index: 0,
                dir: HatDirection::UpLeft,
            },
            Method::SetAxis { index: 3, value: 32767 },
            Method::SendState,
        ];
        for method in methods {
            let params = method.params();
            assert_eq!(Method::parse(method.name(), Some(&params)), Ok(method));
        }
    }
}
