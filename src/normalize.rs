//! Lenient field deserializers for stored snapshots.
//!
//! Older snapshots wrote booleans as strings, left `status` and `amount` out,
//! and used `""` for every absent value. Each helper accepts any JSON value and
//! coerces it to the field type, falling back to the default rather than
//! failing the whole record.

use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::task::TaskId;

pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<TaskId, D::Error> {
    let value = Value::deserialize(d)?;
    integer(&value)
        .map(TaskId)
        .ok_or_else(|| D::Error::custom(format!("task id must be an integer, got {value}")))
}

pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(integer(&value).unwrap_or(0))
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            tracing::warn!("Dropping non-text value {other} from text field");
            String::new()
        }
    })
}

/// `true`, `"true"` are true; everything else is false.
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim() == "true",
        _ => false,
    })
}

pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

pub fn lenient_enum<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if s.trim().is_empty() => T::default(),
        Value::String(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown value `{s}`, using default");
            T::default()
        }),
        _ => T::default(),
    })
}

/// Optional `YYYY-MM-DD` date, stored as `""` when absent.
pub mod date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.collect_str(&date.format(FORMAT)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => parse(&s),
            _ => None,
        })
    }

    /// Parses a stored or typed date. Blank input is `None`; so is garbage, with a warning.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(raw, FORMAT) {
            Ok(date) => Some(date),
            Err(err) => {
                tracing::warn!("Ignoring unparseable date `{raw}`: {err}");
                None
            }
        }
    }
}

/// Optional money amount, stored as a number or `""` when absent.
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(amount: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match amount {
            Some(value) => s.serialize_f64(*value),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => parse(&s),
            _ => None,
        })
    }

    pub fn parse(raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use crate::task::{Priority, Repeat, Status, Task, TaskId};
    use chrono::NaiveDate;

    fn parse(json: &str) -> Task {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn legacy_string_booleans_are_coerced() {
        let task = parse(r#"{"id": 1, "done": "true", "deleted": "false"}"#);
        assert!(task.done);
        assert!(!task.deleted);
    }

    #[test]
    fn missing_status_and_amount_get_defaults() {
        let task = parse(r#"{"id": 1, "title": "Roof"}"#);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.amount, None);
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.repeat, Repeat::None);
        assert_eq!(task.created_at, 0);
    }

    #[test]
    fn amounts_accept_numbers_and_numeric_strings() {
        assert_eq!(parse(r#"{"id": 1, "amount": 12.5}"#).amount, Some(12.5));
        assert_eq!(parse(r#"{"id": 1, "amount": " 40 "}"#).amount, Some(40.0));
        assert_eq!(parse(r#"{"id": 1, "amount": ""}"#).amount, None);
        assert_eq!(parse(r#"{"id": 1, "amount": "abc"}"#).amount, None);
        assert_eq!(parse(r#"{"id": 1, "amount": null}"#).amount, None);
    }

    #[test]
    fn blank_and_broken_dates_are_absent() {
        let task =
            parse(r#"{"id": 1, "startDate": "", "dueDate": "2024-13-40", "title": null}"#);
        assert_eq!(task.start_date, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.title, "");

        let task = parse(r#"{"id": 1, "dueDate": "2024-01-31"}"#);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn unknown_enum_values_fall_back() {
        let task = parse(r#"{"id": 1, "priority": "urgent", "status": "lost", "repeat": 3}"#);
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.repeat, Repeat::None);
    }

    #[test]
    fn ids_accept_numeric_strings_but_not_garbage() {
        assert_eq!(parse(r#"{"id": "1700000000000"}"#).id, TaskId(1_700_000_000_000));
        assert!(serde_json::from_str::<Task>(r#"{"id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Task>(r#"{"title": "no id"}"#).is_err());
    }

    #[test]
    fn legacy_just_added_flag_is_dropped() {
        let task = parse(r#"{"id": 1, "justAdded": true, "photos": ["data:x", 4, ""]}"#);
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("justAdded").is_none());
        assert_eq!(task.photos, vec!["data:x".to_string()]);
    }

    #[test]
    fn absent_values_serialize_as_empty_strings() {
        let task = parse(r#"{"id": 1}"#);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "");
        assert_eq!(json["amount"], "");
        assert_eq!(json["createdAt"], 0);
    }
}
