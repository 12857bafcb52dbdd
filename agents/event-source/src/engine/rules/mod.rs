//! Tag rules, grouped by device family

mod boost;
mod common;
mod network;
mod receiver;
mod thermostat;
mod water;

pub use boost::*;
pub use common::*;
pub use network::*;
pub use receiver::*;
pub use thermostat::*;
pub use water::*;

use serde_json::Value;

use crate::contracts::Event;

/// Text form of an `eventData` value inside a description.
///
/// Strings are inserted verbatim, everything else as compact JSON.
pub fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

/// Integer `status` code of an event, if it carries one.
///
/// Whole floats such as `4.0` count as integers.
pub(crate) fn status_code(event: &Event) -> Option<i64> {
    event.field("status").and_then(integer)
}

fn integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render() {
        assert_eq!(render(Some(&json!("ECO"))), "ECO");
        assert_eq!(render(Some(&json!(256))), "256");
        assert_eq!(render(Some(&json!(21.5))), "21.5");
        assert_eq!(render(Some(&json!(true))), "true");
        assert_eq!(render(None), "null");
    }

    #[test]
    fn test_status_code_accepts_whole_floats() {
        assert_eq!(integer(&json!(4)), Some(4));
        assert_eq!(integer(&json!(256.0)), Some(256));
        assert_eq!(integer(&json!(-1.0)), Some(-1));
        assert_eq!(integer(&json!(4.5)), None);
        assert_eq!(integer(&json!("4")), None);
        assert_eq!(integer(&json!(1e300)), None);
    }
}
