//! Snapshot payload encoding
//!
//! Payloads are a small JSON envelope carrying a version number and the item
//! list. JSON keeps every field self-describing so old snapshots stay readable
//! across restarts; the version gates future schema changes.

use serde::{Deserialize, Serialize};

use super::ArchiveError;
use crate::data::Item;

/// Version written into every new payload
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Serialize)]
struct PayloadRef<'a> {
    version: u32,
    items: &'a [Item],
}

#[derive(Deserialize)]
struct Payload {
    version: u32,
    items: Vec<Item>,
}

/// Encode an item list for storage
pub fn encode_items(items: &[Item]) -> Result<Vec<u8>, ArchiveError> {
    let payload = PayloadRef {
        version: PAYLOAD_VERSION,
        items,
    };
    Ok(serde_json::to_vec(&payload)?)
}

/// Decode a stored payload back into the item list
pub fn decode_items(bytes: &[u8]) -> Result<Vec<Item>, ArchiveError> {
    let payload: Payload = serde_json::from_slice(bytes)?;
    if payload.version != PAYLOAD_VERSION {
        return Err(ArchiveError::UnsupportedVersion(payload.version));
    }
    Ok(payload.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ItemKind;

    fn sample_items() -> Vec<Item> {
        vec![
            Item {
                id: 8863,
                author: "dhouston".to_string(),
                title: "My YC app: Dropbox - Throw away your USB drive".to_string(),
                url: "http://www.getdropbox.com/u/2/screencast.html".to_string(),
                text: String::new(),
                score: 111,
                time: 1_175_714_200,
                kind: ItemKind::Story,
                descendants: 71,
                deleted: false,
                dead: false,
            },
            Item {
                id: 121003,
                author: "tel".to_string(),
                title: "Ask HN: The Arc Effect".to_string(),
                text: "<i>or</i> HN: the Next Iteration".to_string(),
                score: 25,
                time: 1_203_647_620,
                kind: ItemKind::Story,
                ..Default::default()
            },
            // All zero values must survive too
            Item::default(),
            Item {
                dead: true,
                kind: ItemKind::PollOpt,
                ..Item::deleted(7)
            },
        ]
    }

    #[test]
    fn test_payload_survives_roundtrip() {
        let items = sample_items();

        let bytes = encode_items(&items).expect("Encode should succeed");
        let decoded = decode_items(&bytes).expect("Decode should succeed");

        assert_eq!(decoded, items, "Items should survive roundtrip in order");
    }

    #[test]
    fn test_empty_list_roundtrip() {
        let bytes = encode_items(&[]).unwrap();
        assert!(decode_items(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_payload_carries_version() {
        let bytes = encode_items(&sample_items()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["version"], PAYLOAD_VERSION);
        assert_eq!(value["items"][0]["by"], "dhouston");
        assert_eq!(value["items"][0]["type"], "story");
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let result = decode_items(br#"{"version": 99, "items": []}"#);
        assert!(matches!(result, Err(ArchiveError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result = decode_items(b"\x00\x01not json");
        assert!(matches!(result, Err(ArchiveError::Decode(_))));
    }
}
