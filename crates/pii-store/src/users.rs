//! User accounts: the primary consumer of the sealing layer.
//!
//! The repository composes the transforms visibly at every call site:
//! writes are `seal` then commit, reads are fetch then `reveal`, lookups are
//! digest then index equality. Callers deal exclusively in plaintext; the
//! ciphertext and digest forms exist only between the repository and the
//! collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;
use crate::hook::{reveal, seal};
use crate::policy::{users_policy, EntityPolicy};
use crate::store::{Collection, Document};
use pii_codec::PiiCodec;

/// A user account as exposed to callers — always plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned on creation.
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Third-party account identifier (e.g. an OAuth subject).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

/// A change-set for updating a user. Only the fields set here count as
/// modified in the write; clearing an optional field stores `null`, which
/// also clears its blind-index slot.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    changes: Document,
}

impl UserChanges {
    /// Start an empty change-set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.changes.insert("name".into(), Value::String(name.into()));
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.changes.insert("email".into(), Value::String(email.into()));
        self
    }

    /// Set or clear (`None`) the phone number.
    pub fn phone_number(mut self, phone: Option<&str>) -> Self {
        let value = phone.map_or(Value::Null, |p| Value::String(p.into()));
        self.changes.insert("phone_number".into(), value);
        self
    }

    /// Set or clear (`None`) the third-party account identifier.
    pub fn provider_id(mut self, provider_id: Option<&str>) -> Self {
        let value = provider_id.map_or(Value::Null, |p| Value::String(p.into()));
        self.changes.insert("provider_id".into(), value);
        self
    }

    fn into_document(self) -> Document {
        self.changes
    }
}

/// Repository over the `users` collection.
#[derive(Debug)]
pub struct UserRepository {
    codec: PiiCodec,
    policy: EntityPolicy,
    collection: Collection,
}

impl UserRepository {
    /// Build a repository around an injected codec.
    pub fn new(codec: PiiCodec) -> Self {
        let policy = users_policy();
        let unique = policy
            .fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| f.index_field.clone())
            .collect();
        Self {
            codec,
            policy,
            collection: Collection::new(unique),
        }
    }

    /// Create a user. Sensitive fields are sealed and committed in one write.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StoreError::DuplicateIndex`] (wrapped) if another
    /// account already holds this email or provider id, or with a cipher
    /// error if sealing fails — in which case nothing is stored.
    pub fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let mut doc = to_document(serde_json::to_value(&new_user)?);
        seal(&self.codec, &self.policy, &mut doc)?;
        let id = self.collection.insert(doc)?;
        self.require(id)
    }

    /// Apply a change-set to an existing user.
    ///
    /// Only fields present in `changes` are touched; their ciphertext and
    /// digest are recomputed from the new plaintext before the commit.
    pub fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, Error> {
        let mut doc = changes.into_document();
        seal(&self.codec, &self.policy, &mut doc)?;
        self.collection.update(id, doc)?;
        self.require(id)
    }

    /// Fetch a user by id.
    pub fn get(&self, id: Uuid) -> Result<Option<User>, Error> {
        match self.collection.get(id) {
            Some(stored) => Ok(Some(self.hydrate(id, &stored)?)),
            None => Ok(None),
        }
    }

    /// Find the account holding this email, if any.
    ///
    /// The supplied plaintext is digested and matched against the index
    /// slot; no stored record is decrypted during the search. Normalisation
    /// makes the match case- and whitespace-insensitive.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.find_by("email", email)
    }

    /// Find the account linked to this third-party account id, if any.
    pub fn find_by_provider_id(&self, provider_id: &str) -> Result<Option<User>, Error> {
        self.find_by("provider_id", provider_id)
    }

    /// Delete a user. Returns whether a document was removed.
    pub fn delete(&self, id: Uuid) -> bool {
        self.collection.remove(id).is_some()
    }

    fn find_by(&self, field: &str, plaintext: &str) -> Result<Option<User>, Error> {
        let digest = self.codec.blind_index(plaintext);
        if digest.is_empty() {
            return Ok(None); // no index exists for empty values
        }
        let Some(declared) = self.policy.get(field) else {
            return Ok(None);
        };
        match self.collection.find_by_index(&declared.index_field, &digest) {
            Some((id, stored)) => Ok(Some(self.hydrate(id, &stored)?)),
            None => Ok(None),
        }
    }

    fn require(&self, id: Uuid) -> Result<User, Error> {
        let stored = self
            .collection
            .get(id)
            .ok_or(crate::store::StoreError::NotFound(id))?;
        self.hydrate(id, &stored)
    }

    fn hydrate(&self, id: Uuid, stored: &Document) -> Result<User, Error> {
        let mut view = reveal(&self.codec, &self.policy, stored);
        view.insert("id".into(), serde_json::to_value(id)?);
        Ok(serde_json::from_value(Value::Object(view))?)
    }
}

fn to_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
