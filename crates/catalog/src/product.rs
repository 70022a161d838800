use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use storefront_backend::{BackendError, Document, Record, from_record, server_timestamp};
use storefront_core::{Entity, Price, ProductId, StoreError};

/// Catalog product as the storefront reads it from the products collection.
///
/// The backend stores the optional image URL and description as empty strings when the
/// admin left them blank; both decode to `None` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(
        default,
        rename = "img",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(
        default,
        rename = "desc",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl Product {
    /// Decode a products-collection document; the document id becomes the product id.
    pub fn from_document(doc: Document) -> Result<Self, BackendError> {
        from_record(doc.into_record_with_id("id"))
    }

    /// Case-insensitive substring match on the name. `needle` must already be lower-cased.
    pub fn name_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(needle)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Admin input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: impl Into<Price>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            image_url: None,
            description: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("product name cannot be empty"));
        }
        if self.price.is_blank() {
            return Err(StoreError::validation("product price cannot be empty"));
        }
        Ok(())
    }

    /// Document body for the products collection, stamped with the server commit time.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::String(self.name.trim().to_string()));
        record.insert("price".into(), Value::String(self.price.as_str().trim().to_string()));
        record.insert("img".into(), Value::String(self.image_url.unwrap_or_default()));
        record.insert("desc".into(), Value::String(self.description.unwrap_or_default()));
        record.insert("createdAt".into(), server_timestamp());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, body: Value) -> Document {
        match body {
            Value::Object(map) => Document::new(id, map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn decodes_document_and_blanks_optional_fields() {
        let p = Product::from_document(doc(
            "p1",
            json!({
                "name": "Honey",
                "price": "9.99",
                "img": "",
                "desc": "  ",
                "createdAt": "2024-03-01T10:00:00.000000Z"
            }),
        ))
        .unwrap();

        assert_eq!(p.id, ProductId::from("p1"));
        assert_eq!(p.price.as_str(), "9.99");
        assert_eq!(p.image_url, None);
        assert_eq!(p.description, None);
        assert!(p.created_at.is_some());
    }

    #[test]
    fn missing_created_at_is_tolerated() {
        let p = Product::from_document(doc("p2", json!({"name": "Tea", "price": "3"}))).unwrap();
        assert_eq!(p.created_at, None);
    }

    #[test]
    fn non_string_price_is_rejected() {
        let err = Product::from_document(doc("p3", json!({"name": "Tea", "price": 3}))).unwrap_err();
        assert!(matches!(err, BackendError::Serialization(_)));
    }

    #[test]
    fn new_product_validation() {
        assert!(NewProduct::new("  ", "1").validate().is_err());
        assert!(NewProduct::new("Jam", " ").validate().is_err());
        assert!(NewProduct::new("Jam", "4.50").validate().is_ok());
    }

    #[test]
    fn new_product_record_carries_server_timestamp() {
        let record = NewProduct::new(" Jam ", "4.50")
            .with_description("apricot")
            .into_record();
        assert_eq!(record.get("name"), Some(&json!("Jam")));
        assert_eq!(record.get("img"), Some(&json!("")));
        assert_eq!(record.get("desc"), Some(&json!("apricot")));
        assert_eq!(record.get("createdAt"), Some(&server_timestamp()));
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let p = Product::from_document(doc("x", json!({"name": "Wild Honey", "price": "1"}))).unwrap();
        assert!(p.name_contains("honey"));
        assert!(p.name_contains(""));
        assert!(!p.name_contains("jam"));
    }
}
