use serde::{Deserialize, Deserializer, Serialize};

/// Patient data collected by the backend during a consultation.
///
/// Only ever filled from a backend fetch. The backend may omit fields or send
/// `null` for ones it has not collected yet; both default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub symptoms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub previous_history: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medication_history: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_symptoms: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub critical: bool,
}

impl PatientRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
