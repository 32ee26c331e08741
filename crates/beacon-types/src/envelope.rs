use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Envelope - One submitted signaling payload
// ============================================================================

/// A signaling payload deposited under a rendezvous key.
///
/// Only `key` and `webrtc` are interpreted by the relay; every other field is
/// carried through verbatim and returned to readers exactly as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Rendezvous key correlating envelopes into one logical session.
    /// An empty key makes the submission a no-op.
    #[serde(default)]
    pub key: String,

    /// Presence of this field selects append mode; absence (or JSON null)
    /// selects replace mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webrtc: Option<Value>,

    /// Passthrough fields, preserved verbatim.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Envelope {
    /// Which write policy this envelope selects.
    pub fn mode(&self) -> WriteMode {
        if self.webrtc.is_some() {
            WriteMode::Append
        } else {
            WriteMode::Replace
        }
    }
}

// ============================================================================
// WriteMode - Replace vs. append protocol switch
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the key's stored value with this envelope.
    Replace,
    /// Add this envelope to the ordered sequence under the key.
    Append,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Replace => "replace",
            WriteMode::Append => "append",
        }
    }
}

// ============================================================================
// StoredValue - The shapes a rendezvous entry can take
// ============================================================================

/// The value held under a rendezvous key at any moment.
///
/// The wire format is raw JSON so readers receive exactly what is stored:
/// `Single` is the envelope object, `Sequence` is an array of envelope
/// objects. `Empty` is the in-memory image of "absent" and is never written.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Empty,
    Single(Envelope),
    Sequence(Vec<Envelope>),
}

impl StoredValue {
    /// Decode a stored value from its raw JSON bytes.
    ///
    /// An array decodes to `Sequence`, an object to `Single`; anything else
    /// is an error the caller should treat as absent state.
    pub fn from_bytes(raw: &[u8]) -> serde_json::Result<Self> {
        use serde::de::Error;

        let value: Value = serde_json::from_slice(raw)?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<serde_json::Result<Vec<Envelope>>>()
                .map(StoredValue::Sequence),
            object @ Value::Object(_) => serde_json::from_value(object).map(StoredValue::Single),
            other => Err(serde_json::Error::custom(format!(
                "stored value is neither object nor array: {other}"
            ))),
        }
    }

    /// Encode to the raw JSON wire format.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            // Never stored by the engine; encoded as an empty sequence.
            StoredValue::Empty => Ok(b"[]".to_vec()),
            StoredValue::Single(envelope) => serde_json::to_vec(envelope),
            StoredValue::Sequence(envelopes) => serde_json::to_vec(envelopes),
        }
    }

    /// Apply an append-mode write.
    ///
    /// A prior single value is not merged in: appending onto `Single` starts
    /// a fresh one-element sequence.
    pub fn append(self, envelope: Envelope) -> StoredValue {
        match self {
            StoredValue::Sequence(mut items) => {
                items.push(envelope);
                StoredValue::Sequence(items)
            }
            StoredValue::Empty | StoredValue::Single(_) => {
                StoredValue::Sequence(vec![envelope])
            }
        }
    }

    /// Number of envelopes held.
    pub fn len(&self) -> usize {
        match self {
            StoredValue::Empty => 0,
            StoredValue::Single(_) => 1,
            StoredValue::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StoredValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(raw: Value) -> Envelope {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn mode_is_selected_by_webrtc_presence() {
        assert_eq!(envelope(json!({"key": "a"})).mode(), WriteMode::Replace);
        assert_eq!(
            envelope(json!({"key": "a", "webrtc": "offer"})).mode(),
            WriteMode::Append
        );
        // Any present value selects append, even an empty string
        assert_eq!(
            envelope(json!({"key": "a", "webrtc": ""})).mode(),
            WriteMode::Append
        );
        // JSON null reads back as absent and selects replace
        assert_eq!(
            envelope(json!({"key": "a", "webrtc": null})).mode(),
            WriteMode::Replace
        );
    }

    #[test]
    fn missing_key_defaults_to_empty() {
        let env = envelope(json!({"webrtc": "offer"}));
        assert!(env.key.is_empty());
    }

    #[test]
    fn passthrough_fields_survive_round_trip() {
        let raw = json!({"key": "abc", "webrtc": "offer", "ice": ["c1", "c2"], "nonce": 7});
        let env = envelope(raw.clone());
        assert_eq!(env.rest.get("nonce"), Some(&json!(7)));
        assert_eq!(serde_json::to_value(&env).unwrap(), raw);
    }

    #[test]
    fn object_decodes_to_single_and_array_to_sequence() {
        let single = StoredValue::from_bytes(br#"{"key":"x"}"#).unwrap();
        assert!(matches!(single, StoredValue::Single(_)));

        let sequence = StoredValue::from_bytes(br#"[{"key":"x"},{"key":"x"}]"#).unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn scalar_payload_is_rejected() {
        assert!(StoredValue::from_bytes(b"42").is_err());
        assert!(StoredValue::from_bytes(b"not json").is_err());
    }

    #[test]
    fn append_state_machine() {
        let a = envelope(json!({"key": "k", "webrtc": "offer"}));
        let b = envelope(json!({"key": "k", "webrtc": "answer"}));

        // ABSENT -> SEQUENCE(1)
        let value = StoredValue::Empty.append(a.clone());
        assert_eq!(value, StoredValue::Sequence(vec![a.clone()]));

        // SEQUENCE(1) -> SEQUENCE(2), insertion order kept
        let value = value.append(b.clone());
        assert_eq!(value, StoredValue::Sequence(vec![a.clone(), b.clone()]));

        // SINGLE -> SEQUENCE(1): prior single value is discarded, not merged
        let single = StoredValue::Single(envelope(json!({"key": "k"})));
        let value = single.append(b.clone());
        assert_eq!(value, StoredValue::Sequence(vec![b]));
    }

    #[test]
    fn wire_format_round_trip() {
        let a = envelope(json!({"key": "k", "webrtc": "offer"}));
        let bytes = StoredValue::Sequence(vec![a.clone()]).to_bytes().unwrap();
        assert_eq!(StoredValue::from_bytes(&bytes).unwrap().len(), 1);

        let bytes = StoredValue::Single(a).to_bytes().unwrap();
        assert!(matches!(
            StoredValue::from_bytes(&bytes).unwrap(),
            StoredValue::Single(_)
        ));
    }
}
