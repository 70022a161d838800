use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use storefront_events::SubscriptionHandle;

use crate::error::BackendError;

/// A document body: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Field name of the server-timestamp sentinel object.
pub const SERVER_TIMESTAMP_KEY: &str = "$serverTimestamp";

/// Sentinel value resolved to the commit time by the store when the write is applied.
///
/// Clients never trust their own clock for ordering fields such as `createdAt`.
pub fn server_timestamp() -> Value {
    let mut sentinel = Map::new();
    sentinel.insert(SERVER_TIMESTAMP_KEY.to_string(), Value::Bool(true));
    Value::Object(sentinel)
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.get(SERVER_TIMESTAMP_KEY) == Some(&Value::Bool(true)))
}

/// Serialize a typed value into a document body.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, BackendError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Deserialize a document body into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, BackendError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// A document as returned by reads: the backend-assigned id plus its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Record,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Record) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// The body with the document id injected under `id_field` (ids live outside the body).
    pub fn into_record_with_id(self, id_field: &str) -> Record {
        let mut data = self.data;
        data.insert(id_field.to_string(), Value::String(self.id));
        data
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Collection query: conjunction of equality filters plus an optional ordering.
///
/// Like the managed backend, ordering by a field excludes documents that lack it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let filters_ok = self
            .filters
            .iter()
            .all(|f| record.get(&f.field) == Some(&f.value));
        let order_ok = self
            .order_by
            .as_ref()
            .is_none_or(|o| record.get(&o.field).is_some_and(|v| !v.is_null()));
        filters_ok && order_ok
    }

    /// Filter and order a full collection scan.
    ///
    /// Ties keep their input order (stable sort).
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(&d.data)).collect();
        if let Some(order) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        out
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
///
/// Arrays and objects only compare by type; the backend does not order by them.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Write recorded by an instrumented store (tests assert on merge-write counts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOp {
    pub collection: String,
    pub id: String,
    pub merge: bool,
}

/// Realtime listener: receives the full, ordered result set after every change, or the
/// feed error that interrupted delivery.
pub type FeedCallback = Arc<dyn Fn(Result<Vec<Document>, BackendError>) + Send + Sync>;

/// Document database collaborator.
///
/// ## Write semantics
///
/// - `set(.., merge = false)` replaces the document body.
/// - `set(.., merge = true)` overwrites only the top-level fields present in `record`;
///   every other field of the stored document is preserved (merge-write).
/// - `add` creates a document under a backend-assigned id.
///
/// In all writes, values equal to [`server_timestamp()`] are replaced by the commit time.
///
/// ## Realtime
///
/// `subscribe` delivers the current result set immediately and again after every write
/// touching the collection, in commit order. Dropping or cancelling the returned handle
/// stops delivery.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, BackendError>;

    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: Record,
        merge: bool,
    ) -> Result<(), BackendError>;

    async fn add(&self, collection: &str, record: Record) -> Result<String, BackendError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError>;

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        on_change: FeedCallback,
    ) -> SubscriptionHandle;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, BackendError> {
        (**self).get(collection, id).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: Record,
        merge: bool,
    ) -> Result<(), BackendError> {
        (**self).set(collection, id, record, merge).await
    }

    async fn add(&self, collection: &str, record: Record) -> Result<String, BackendError> {
        (**self).add(collection, record).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        (**self).delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError> {
        (**self).query(collection, query).await
    }

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        on_change: FeedCallback,
    ) -> SubscriptionHandle {
        (**self).subscribe(collection, query, on_change)
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
    fn descending_order_excludes_documents_without_the_field() {
        let docs = vec![
            doc("old", json!({"createdAt": "2024-01-01T00:00:00.000000Z"})),
            doc("pending", json!({"name": "no timestamp"})),
            doc("new", json!({"createdAt": "2024-06-01T00:00:00.000000Z"})),
        ];
        let out = Query::new()
            .order_by("createdAt", Direction::Descending)
            .apply(docs);
        let ids: Vec<_> = out.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn equality_filters_are_conjunctive() {
        let docs = vec![
            doc("a", json!({"email": "x@y.z", "disabled": false})),
            doc("b", json!({"email": "x@y.z", "disabled": true})),
            doc("c", json!({"email": "q@y.z", "disabled": false})),
        ];
        let out = Query::new()
            .where_eq("email", "x@y.z")
            .where_eq("disabled", false)
            .apply(docs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(
            compare_values(Some(&json!(9)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
    }

    #[test]
    fn server_timestamp_sentinel_is_recognised() {
        assert!(is_server_timestamp(&server_timestamp()));
        assert!(!is_server_timestamp(&json!({"$serverTimestamp": false})));
        assert!(!is_server_timestamp(&json!("2024-01-01")));
    }

    #[test]
    fn to_record_rejects_non_objects() {
        assert!(to_record(&vec![1, 2]).is_err());
        let rec = to_record(&json!({"a": 1})).unwrap();
        assert_eq!(rec.get("a"), Some(&json!(1)));
    }
}
