//! Memoized access to a schema in every dialect

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::dialect::{
    CancelToken, ConversionError, Dialect, to_expanded_json_schema, to_mongodb_json_schema,
    to_standard_json_schema,
};
use crate::inference::Schema;

/// A finalized schema plus lazily converted dialect documents
///
/// Each dialect is converted at most once; concurrent callers wait for the
/// conversion in flight and share its result. A cancelled conversion caches
/// nothing, so a later call converts again.
#[derive(Debug)]
pub struct SchemaAccessor {
    schema: Arc<Schema>,
    standard: OnceCell<Arc<JsonValue>>,
    mongodb: OnceCell<Arc<JsonValue>>,
    expanded: OnceCell<Arc<JsonValue>>,
}

impl SchemaAccessor {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            standard: OnceCell::new(),
            mongodb: OnceCell::new(),
            expanded: OnceCell::new(),
        }
    }

    /// The inferred schema itself
    pub fn internal_schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Standard JSON Schema document
    pub async fn standard_schema(
        &self,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<JsonValue>, ConversionError> {
        self.dialect(Dialect::Standard, cancel).await
    }

    /// MongoDB `$jsonSchema` document
    pub async fn mongodb_schema(
        &self,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<JsonValue>, ConversionError> {
        self.dialect(Dialect::MongoDb, cancel).await
    }

    /// Expanded, statistics-annotated JSON Schema document
    pub async fn expanded_schema(
        &self,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<JsonValue>, ConversionError> {
        self.dialect(Dialect::Expanded, cancel).await
    }

    /// Document for `dialect`, converting it on first request
    pub async fn dialect(
        &self,
        dialect: Dialect,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<JsonValue>, ConversionError> {
        let cell = match dialect {
            Dialect::Standard => &self.standard,
            Dialect::MongoDb => &self.mongodb,
            Dialect::Expanded => &self.expanded,
        };

        let document = cell
            .get_or_try_init(|| async {
                let document = match dialect {
                    Dialect::Standard => to_standard_json_schema(&self.schema, cancel)?,
                    Dialect::MongoDb => to_mongodb_json_schema(&self.schema, cancel)?,
                    Dialect::Expanded => to_expanded_json_schema(&self.schema, cancel)?,
                };
                debug!(dialect = ?dialect, "Cached schema dialect");
                Ok::<_, ConversionError>(Arc::new(document))
            })
            .await?;
        Ok(Arc::clone(document))
    }

    /// Whether `dialect` has already been converted
    pub fn is_cached(&self, dialect: Dialect) -> bool {
        match dialect {
            Dialect::Standard => self.standard.initialized(),
            Dialect::MongoDb => self.mongodb.initialized(),
            Dialect::Expanded => self.expanded.initialized(),
        }
    }
}

impl From<Schema> for SchemaAccessor {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}
