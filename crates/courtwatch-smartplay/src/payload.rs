//! Response decoding.
//!
//! The feed answers either with a bare JSON array of rows or with an object
//! holding the array under one of a few envelope keys. Anything else decodes
//! to an empty dataset. Rows are coerced field by field; a bad field never
//! fails the fetch.

use courtwatch_core::record::Record;
use serde_json::{Map, Value};

use crate::Result;

/// Envelope keys, in priority order. The first one holding an array wins.
const ENVELOPE_KEYS: [&str; 5] = ["data", "contents", "result", "items", "records"];

const DISTRICT: &str = "District_Name_EN";
const VENUE: &str = "Venue_Name_EN";
const DATE: &str = "Available_Date";
const START_TIME: &str = "Session_Start_Time";
const COURTS: &str = "Available_Courts";

/// Decode a raw response body. Fails only when the body is not JSON.
pub fn decode(body: &[u8]) -> Result<Vec<Record>> {
  let raw: Value = serde_json::from_slice(body)?;
  Ok(
    rows(raw)
      .iter()
      .filter_map(Value::as_object)
      .map(to_record)
      .collect(),
  )
}

fn rows(raw: Value) -> Vec<Value> {
  match raw {
    Value::Array(rows) => rows,
    Value::Object(mut map) => ENVELOPE_KEYS
      .iter()
      .find_map(|key| match map.remove(*key) {
        Some(Value::Array(rows)) => Some(rows),
        _ => None,
      })
      .unwrap_or_default(),
    _ => Vec::new(),
  }
}

fn to_record(row: &Map<String, Value>) -> Record {
  Record {
    district:        text(row.get(DISTRICT)),
    venue:           text(row.get(VENUE)),
    date:            text(row.get(DATE)),
    start_time:      text(row.get(START_TIME)),
    available_count: count(row.get(COURTS)),
  }
}

/// Strings are trimmed; blanks and nulls are missing; numbers are rendered.
fn text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) => {
      let s = s.trim();
      (!s.is_empty()).then(|| s.to_owned())
    }
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Numeric or numeric-string counts; anything unparseable or negative is 0.
fn count(value: Option<&Value>) -> u32 {
  let parsed = match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  match parsed {
    Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(f64::from(u32::MAX)) as u32,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(courts: Value) -> Value {
    serde_json::json!({
      "District_Name_EN": "Central & Western",
      "Venue_Name_EN": "Victoria Park Tennis Court",
      "Available_Date": "2024-01-01",
      "Session_Start_Time": "19:00",
      "Available_Courts": courts,
      "Facility_Type": "TENNIS",
    })
  }

  fn decode_value(v: Value) -> Vec<Record> {
    decode(v.to_string().as_bytes()).unwrap()
  }

  #[test]
  fn bare_array() {
    let records = decode_value(Value::Array(vec![row("2".into())]));
    assert_eq!(records.len(), 1);
    assert_eq!(
      records[0],
      Record::new(
        "Central & Western",
        "Victoria Park Tennis Court",
        "2024-01-01",
        "19:00",
        2
      )
    );
  }

  #[test]
  fn envelope_keys_in_priority_order() {
    let body = serde_json::json!({
      "meta": { "count": 1 },
      "contents": "not a list",
      "result": [row(1.into())],
      "items": [row(1.into()), row(1.into())],
    });
    assert_eq!(decode_value(body).len(), 1);
  }

  #[test]
  fn unknown_shape_is_empty() {
    assert!(decode_value(serde_json::json!({ "rows": [row(1.into())] })).is_empty());
    assert!(decode_value(serde_json::json!("hello")).is_empty());
    assert!(decode_value(serde_json::json!([])).is_empty());
  }

  #[test]
  fn not_json_is_an_error() {
    assert!(decode(b"<html>maintenance</html>").is_err());
  }

  #[test]
  fn counts_are_coerced() {
    let counts = [
      ("3", 3),
      (" 4 ", 4),
      ("2.0", 2),
      ("n/a", 0),
      ("", 0),
      ("-1", 0),
    ];
    for (raw, expected) in counts {
      let records = decode_value(Value::Array(vec![row(raw.into())]));
      assert_eq!(records[0].available_count, expected, "{raw:?}");
    }
    assert_eq!(decode_value(Value::Array(vec![row(5.into())]))[0].available_count, 5);
    assert_eq!(decode_value(Value::Array(vec![row(Value::Null)]))[0].available_count, 0);
  }

  #[test]
  fn missing_fields_are_missing_not_errors() {
    let body = serde_json::json!([{ "Venue_Name_EN": "  ", "Available_Courts": "1" }, 42]);
    let records = decode_value(body);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].district, None);
    assert_eq!(records[0].venue, None);
    assert_eq!(records[0].available_count, 1);
  }
}
