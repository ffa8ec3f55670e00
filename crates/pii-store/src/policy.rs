//! Declarations of which entity fields get the ciphertext + blind-index
//! treatment.
//!
//! A policy is per-collection and lists each sensitive field together with
//! the name of its sibling index slot and whether that slot carries a
//! unique constraint. Uniqueness always lives at the index layer: ciphertext
//! is probabilistic and can never be compared for equality.

/// One sensitive field and its sibling blind-index slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveField {
    /// Field holding plaintext in memory and ciphertext at rest.
    pub name: String,
    /// Sibling field holding the blind-index digest.
    pub index_field: String,
    /// Whether two live documents may share a digest in `index_field`.
    /// Sparse: documents without a digest are exempt.
    pub unique: bool,
}

impl SensitiveField {
    fn new(name: &str, unique: bool) -> Self {
        Self {
            name: name.to_owned(),
            index_field: format!("{name}_hash"),
            unique,
        }
    }
}

/// The set of sensitive fields for one entity collection.
#[derive(Debug, Clone)]
pub struct EntityPolicy {
    /// Collection name, used in logs only.
    pub collection: String,
    /// Declared sensitive fields.
    pub fields: Vec<SensitiveField>,
}

impl EntityPolicy {
    /// Start an empty policy for `collection`.
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_owned(),
            fields: Vec::new(),
        }
    }

    /// Declare `name` sensitive, indexed in `<name>_hash`, no unique constraint.
    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(SensitiveField::new(name, false));
        self
    }

    /// Declare `name` sensitive with a sparse-unique constraint on its digest.
    pub fn unique_field(mut self, name: &str) -> Self {
        self.fields.push(SensitiveField::new(name, true));
        self
    }

    /// Look up the declaration for a sensitive field by name.
    pub fn get(&self, name: &str) -> Option<&SensitiveField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is one of this policy's index slots.
    pub fn is_index_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.index_field == name)
    }
}

/// Policy for the `users` collection: one account per email and per
/// third-party account id; phone numbers are optional and not unique.
pub fn users_policy() -> EntityPolicy {
    EntityPolicy::new("users")
        .unique_field("email")
        .field("phone_number")
        .unique_field("provider_id")
}

/// Policy for the `invites` collection: invites are looked up by email but
/// several invites may target the same address.
pub fn invites_policy() -> EntityPolicy {
    EntityPolicy::new("invites").field("email")
}
