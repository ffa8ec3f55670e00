//! Write-path sealing and read-path revealing of sensitive fields.
//!
//! These are the explicit transforms every repository composes around its
//! store calls — nothing here runs implicitly. [`seal`] rewrites a change-set
//! in place before it is committed; [`reveal`] projects a stored document
//! into the plaintext view handed to callers.
//!
//! A field is "modified in this write" iff it appears as a key of the
//! change-set. Fields absent from the change-set keep their stored
//! ciphertext and digest untouched, so a pair is recomputed exactly once per
//! write that actually changes the plaintext.

use serde_json::Value;
use tracing::debug;

use crate::policy::EntityPolicy;
use pii_codec::{CipherError, PiiCodec};

use crate::store::Document;

/// Seal the sensitive fields of a change-set prior to committing it.
///
/// For each declared sensitive field present in `changes`:
/// - a non-empty string value is replaced by its ciphertext, and its digest
///   is written to the sibling index slot;
/// - an empty, null, or non-string value is left as-is, and the sibling index
///   slot is cleared (`null`) so no stale digest keeps matching lookups for
///   the previous value.
///
/// Digest and ciphertext derive from the same captured plaintext and land in
/// the same map, so committing the sealed change-set in one store operation
/// keeps the pair atomic.
///
/// # Errors
///
/// Propagates [`CipherError`] from encryption; the caller must abandon the
/// write rather than commit plaintext.
pub fn seal(
    codec: &PiiCodec,
    policy: &EntityPolicy,
    changes: &mut Document,
) -> Result<(), CipherError> {
    for field in &policy.fields {
        let Some(value) = changes.get(&field.name) else {
            continue; // not modified in this write
        };

        match value {
            Value::String(plaintext) if !plaintext.is_empty() => {
                let digest = codec.blind_index(plaintext);
                let ciphertext = codec.encrypt_field(plaintext)?;
                debug!(
                    collection = %policy.collection,
                    field = %field.name,
                    "sealed sensitive field"
                );
                changes.insert(field.index_field.clone(), Value::String(digest));
                changes.insert(field.name.clone(), Value::String(ciphertext));
            }
            _ => {
                // Field cleared or empty: store it as-is, drop the stale index.
                changes.insert(field.index_field.clone(), Value::Null);
            }
        }
    }
    Ok(())
}

/// Project a stored document into the plaintext view exposed to callers.
///
/// Sensitive fields are decrypted (with the codec's recover-on-failure
/// behaviour) and index slots are stripped entirely — digests are an
/// implementation detail of the store layer and never leave it.
pub fn reveal(codec: &PiiCodec, policy: &EntityPolicy, stored: &Document) -> Document {
    let mut view = Document::new();
    for (key, value) in stored {
        if policy.is_index_field(key) {
            continue;
        }
        match (policy.get(key), value) {
            (Some(_), Value::String(s)) => {
                view.insert(key.clone(), Value::String(codec.decrypt_field(s)));
            }
            _ => {
                view.insert(key.clone(), value.clone());
            }
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::users_policy;
    use pii_codec::{KeyBytes, DELIMITER, KEY_LEN};
    use serde_json::json;

    fn codec() -> PiiCodec {
        PiiCodec::new(KeyBytes::new([0x42; KEY_LEN]))
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn seal_writes_ciphertext_and_digest() {
        let c = codec();
        let policy = users_policy();
        let mut changes = doc(json!({ "name": "Ada", "email": "User@Example.com" }));

        seal(&c, &policy, &mut changes).unwrap();

        let stored_email = changes["email"].as_str().unwrap();
        assert_ne!(stored_email, "User@Example.com");
        assert!(stored_email.contains(DELIMITER));
        assert_eq!(
            changes["email_hash"].as_str().unwrap(),
            c.blind_index("user@example.com"),
        );
        // Non-sensitive fields pass through untouched.
        assert_eq!(changes["name"], json!("Ada"));
    }

    #[test]
    fn seal_skips_unmodified_fields() {
        let c = codec();
        let policy = users_policy();
        let mut changes = doc(json!({ "name": "Ada" }));

        seal(&c, &policy, &mut changes).unwrap();

        assert!(!changes.contains_key("email"));
        assert!(!changes.contains_key("email_hash"));
    }

    #[test]
    fn seal_clears_index_for_cleared_field() {
        let c = codec();
        let policy = users_policy();
        let mut changes = doc(json!({ "phone_number": null }));

        seal(&c, &policy, &mut changes).unwrap();

        assert_eq!(changes["phone_number"], Value::Null);
        assert_eq!(changes["phone_number_hash"], Value::Null);
    }

    #[test]
    fn seal_clears_index_for_emptied_field() {
        let c = codec();
        let policy = users_policy();
        let mut changes = doc(json!({ "phone_number": "" }));

        seal(&c, &policy, &mut changes).unwrap();

        assert_eq!(changes["phone_number"], json!(""));
        assert_eq!(changes["phone_number_hash"], Value::Null);
    }

    #[test]
    fn reveal_decrypts_and_strips_index_slots() {
        let c = codec();
        let policy = users_policy();
        let mut stored = doc(json!({ "name": "Ada", "email": "ada@example.com" }));
        seal(&c, &policy, &mut stored).unwrap();

        let view = reveal(&c, &policy, &stored);

        assert_eq!(view["email"], json!("ada@example.com"));
        assert_eq!(view["name"], json!("Ada"));
        assert!(!view.contains_key("email_hash"));
    }

    #[test]
    fn reveal_passes_legacy_plaintext_through() {
        let c = codec();
        let policy = users_policy();
        // A record written before encryption was introduced.
        let stored = doc(json!({ "email": "old@example.com" }));

        let view = reveal(&c, &policy, &stored);
        assert_eq!(view["email"], json!("old@example.com"));
    }

    #[test]
    fn seal_then_reveal_round_trips() {
        let c = codec();
        let policy = users_policy();
        let original = doc(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone_number": "+44 20 7946 0123",
        }));
        let mut sealed = original.clone();
        seal(&c, &policy, &mut sealed).unwrap();

        let view = reveal(&c, &policy, &sealed);
        assert_eq!(view, original);
    }
}
