use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by the dynamic-member and configuration APIs.
///
/// Listener registration, removal and emission never fail; absence of an
/// event or of an attached emitter yields empty results instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitterError {
  #[error("emitter does not expose a member named `{name}`")]
  UnsupportedProperty { name: String },

  #[error("`{name}` cannot be set to {value}")]
  InvalidValue { name: String, value: Value },

  #[error("default max listeners already configured as {current}")]
  DefaultAlreadySet { current: usize },
}

#[cfg(test)]
mod test {
  use super::*;
  use serde_json::json;

  #[test]
  fn messages_name_the_member() {
    let err = EmitterError::UnsupportedProperty { name: "testProperty".into() };
    assert_eq!(err.to_string(), "emitter does not expose a member named `testProperty`");

    let err = EmitterError::InvalidValue { name: "maxListeners".into(), value: json!("ten") };
    assert_eq!(err.to_string(), "`maxListeners` cannot be set to \"ten\"");
  }
}
