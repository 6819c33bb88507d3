//! Serde helpers for floats that may be infinite
//!
//! JSON has no encoding for infinities or NaN (serde_json writes `null`), so
//! non-finite values are written as the strings `"inf"`, `"-inf"` and `"nan"`.
//! Finite values stay plain numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

impl Repr {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(E::custom(format!("invalid float {other:?}"))),
            },
        }
    }
}

struct Float(f64);

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str("nan")
        } else if v > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }
}

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    Float(*value).serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Repr::deserialize(deserializer)?.into_f64()
}

/// Same encoding for `Option<f64>`
pub(crate) mod option {
    use super::{Float, Repr};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&Float(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<Repr>::deserialize(deserializer)?
            .map(Repr::into_f64)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Scores {
        #[serde(with = "super")]
        t: f64,
        #[serde(default, with = "super::option")]
        z: Option<f64>,
    }

    #[test]
    fn test_infinities_keep_their_sign() {
        let scores = Scores {
            t: f64::NEG_INFINITY,
            z: Some(f64::INFINITY),
        };
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"t":"-inf","z":"inf"}"#);
        assert_eq!(serde_json::from_str::<Scores>(&json).unwrap(), scores);
    }

    #[test]
    fn test_finite_values_stay_numbers() {
        let json = serde_json::to_string(&Scores { t: 1.5, z: None }).unwrap();
        assert_eq!(json, r#"{"t":1.5,"z":null}"#);

        let parsed: Scores = serde_json::from_str(r#"{"t":2}"#).unwrap();
        assert_eq!(parsed, Scores { t: 2.0, z: None });
    }

    #[test]
    fn test_unknown_text_rejected() {
        assert!(serde_json::from_str::<Scores>(r#"{"t":"fast"}"#).is_err());
    }
}
