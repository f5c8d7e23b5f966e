use carcare_core::CoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

/// A JSONB document row: primary key plus body.
#[derive(sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub doc: Json<Value>,
}

impl DocumentRow {
    /// Folds the primary key back into the body as `_id` and deserializes the model.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, CoreError> {
        hydrate(self.id, self.doc.0)
    }
}

pub(crate) fn hydrate<T: DeserializeOwned>(id: Uuid, doc: Value) -> Result<T, CoreError> {
    let Value::Object(mut body) = doc else {
        return Err(CoreError::StorageError(format!("Document {} is not a JSON object", id)));
    };
    body.insert("_id".to_string(), Value::String(id.to_string()));

    serde_json::from_value(Value::Object(body))
        .map_err(|e| CoreError::StorageError(format!("Document {} is malformed: {}", id, e)))
}

pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    CoreError::StorageError(err.to_string())
}
