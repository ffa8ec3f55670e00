//! Invites: the second consumer of the email blind index.
//!
//! Invites are created for an address before any account exists, and the
//! signup path asks "is there an invite for this email". Same sealing
//! mechanism as users, but the email digest carries no unique constraint —
//! an address can be invited more than once.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;
use crate::hook::{reveal, seal};
use crate::policy::{invites_policy, EntityPolicy};
use crate::store::{Collection, Document};
use pii_codec::PiiCodec;

/// A pending invite as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    /// Role the invitee will receive on signup.
    pub role: String,
    /// Opaque token embedded in the invite link.
    pub token: String,
}

/// Repository over the `invites` collection.
#[derive(Debug)]
pub struct InviteRepository {
    codec: PiiCodec,
    policy: EntityPolicy,
    collection: Collection,
}

impl InviteRepository {
    /// Build a repository around an injected codec.
    pub fn new(codec: PiiCodec) -> Self {
        Self {
            codec,
            policy: invites_policy(),
            collection: Collection::new(Vec::new()),
        }
    }

    /// Create an invite for `email` with a fresh opaque token.
    ///
    /// # Errors
    ///
    /// Fails with a cipher error if sealing fails; nothing is stored then.
    pub fn create(&self, email: &str, role: &str) -> Result<Invite, Error> {
        let mut doc = Document::new();
        doc.insert("email".into(), Value::String(email.into()));
        doc.insert("role".into(), Value::String(role.into()));
        doc.insert(
            "token".into(),
            Value::String(Uuid::new_v4().simple().to_string()),
        );

        seal(&self.codec, &self.policy, &mut doc)?;
        let id = self.collection.insert(doc)?;
        let stored = self
            .collection
            .get(id)
            .ok_or(crate::store::StoreError::NotFound(id))?;
        self.hydrate(id, &stored)
    }

    /// Every pending invite for this email, matched via the blind index.
    pub fn find_by_email(&self, email: &str) -> Result<Vec<Invite>, Error> {
        let digest = self.codec.blind_index(email);
        if digest.is_empty() {
            return Ok(Vec::new());
        }
        let index_field = match self.policy.get("email") {
            Some(f) => f.index_field.clone(),
            None => return Ok(Vec::new()),
        };
        self.collection
            .find_all_by_index(&index_field, &digest)
            .into_iter()
            .map(|(id, stored)| self.hydrate(id, &stored))
            .collect()
    }

    /// Fetch an invite by id.
    pub fn get(&self, id: Uuid) -> Result<Option<Invite>, Error> {
        match self.collection.get(id) {
            Some(stored) => Ok(Some(self.hydrate(id, &stored)?)),
            None => Ok(None),
        }
    }

    /// Delete an invite (e.g. once consumed). Returns whether one existed.
    pub fn delete(&self, id: Uuid) -> bool {
        self.collection.remove(id).is_some()
    }

    fn hydrate(&self, id: Uuid, stored: &Document) -> Result<Invite, Error> {
        let mut view = reveal(&self.codec, &self.policy, stored);
        view.insert("id".into(), serde_json::to_value(id)?);
        Ok(serde_json::from_value(Value::Object(view))?)
    }
}
