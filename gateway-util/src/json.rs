//! Serde helpers for durations stored as milliseconds.
use chrono::TimeDelta;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

/// Read a signed number of milliseconds into a [`TimeDelta`].
///
/// Unlike [`std::time::Duration`], the result may be negative.
pub fn deserialize_delta_from_ms<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
where
    D: Deserializer<'de>,
{
    let ms: i64 = Deserialize::deserialize(deserializer)?;
    TimeDelta::try_milliseconds(ms)
        .ok_or_else(|| D::Error::custom(format!("{ms}ms is out of range")))
}

pub fn serialize_delta_to_ms<S>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(delta.num_milliseconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Timing {
        #[serde(
            deserialize_with = "deserialize_delta_from_ms",
            serialize_with = "serialize_delta_to_ms"
        )]
        threshold: TimeDelta,
    }

    #[test]
    fn test_reads_negative_thresholds() {
        let timing: Timing = serde_json::from_value(json!({"threshold": -250})).unwrap();
        assert_eq!(timing.threshold, TimeDelta::milliseconds(-250));
    }

    #[test]
    fn test_writes_milliseconds() {
        let timing = Timing {
            threshold: TimeDelta::seconds(-1),
        };

        assert_eq!(
            serde_json::to_value(&timing).unwrap(),
            json!({"threshold": -1000})
        );
    }

    #[test]
    fn test_rejects_non_integer_thresholds() {
        let res = serde_json::from_value::<Timing>(json!({"threshold": "soon"}));
        assert!(res.is_err());
    }
}
