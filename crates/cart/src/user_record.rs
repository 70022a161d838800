use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use storefront_backend::{BackendError, Record, from_record, server_timestamp};
use storefront_core::UserId;

use crate::item::CartItem;

/// Per-user document in the users collection (document id = user id).
///
/// Only the fields the storefront reads are modelled. Writes are always merge-writes of the
/// fields being changed, so anything else stored on the document is left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Recovery phrase checked by the forgot-password flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet: Option<String>,
    /// Avatar URL; empty when unset.
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Decode a stored document. Older records may lack `uid`, so the document id is used.
    ///
    /// Cart entries are decoded one at a time; malformed ones are skipped so a single bad
    /// entry does not make the whole account unreadable.
    pub fn decode(id: &str, mut record: Record) -> Result<Self, BackendError> {
        record
            .entry("uid")
            .or_insert_with(|| Value::String(id.to_string()));
        let cart = record.remove("cart");
        let mut user: Self = from_record(record)?;
        user.cart = decode_cart(id, cart);
        Ok(user)
    }

    /// Smallest record that makes a signed-in user usable: username defaults to the e-mail.
    pub fn minimal(uid: UserId, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            uid,
            username: email.clone(),
            email,
            pet: None,
            profile: String::new(),
            cart: Vec::new(),
            disabled: false,
            created_at: None,
        }
    }

    /// Fields written when a record is created on first sign-in.
    pub fn minimal_fields(&self) -> Record {
        let mut record = Record::new();
        record.insert("uid".into(), Value::String(self.uid.to_string()));
        record.insert("email".into(), Value::String(self.email.clone()));
        record.insert("username".into(), Value::String(self.username.clone()));
        record.insert("profile".into(), Value::String(self.profile.clone()));
        record.insert("cart".into(), Value::Array(Vec::new()));
        record
    }

    /// Full body written by account creation, stamped with the server commit time.
    pub fn account_fields(&self) -> Record {
        let mut record = self.minimal_fields();
        record.insert(
            "pet".into(),
            Value::String(self.pet.clone().unwrap_or_default()),
        );
        record.insert("disabled".into(), Value::Bool(false));
        record.insert("createdAt".into(), server_timestamp());
        record
    }
}

fn decode_cart(id: &str, cart: Option<Value>) -> Vec<CartItem> {
    let entries = match cart {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!(user_id = %id, found = %other, "stored cart is not a list; treating as empty");
            return Vec::new();
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<CartItem>(entry) {
            Ok(item) => items.push(item),
            Err(err) => {
                tracing::warn!(user_id = %id, index, error = %err, "skipping malformed cart item")
            }
        }
    }
    items
}

/// Merge-write body that replaces only the `cart` field.
pub fn cart_fields(items: &[CartItem]) -> Result<Record, BackendError> {
    let mut record = Record::new();
    record.insert("cart".into(), serde_json::to_value(items)?);
    Ok(record)
}

/// Merge-write body that replaces only the `profile` field.
pub fn profile_fields(url: &str) -> Record {
    let mut record = Record::new();
    record.insert("profile".into(), Value::String(url.to_string()));
    record
}
