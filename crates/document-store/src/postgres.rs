use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::document::ID_FIELD;
use crate::{
    Collection, Document, DocumentId, Filter, Pipeline, Result, StoreError, store::DocumentStore,
};

/// PostgreSQL-backed document store.
///
/// All collections share one `documents` table holding JSONB bodies.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::info!(max_connections, "connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("document store migrations applied");
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("document store pool closed");
    }

    fn row_to_document(row: &PgRow) -> Result<Document> {
        let id: Uuid = row.try_get("id")?;
        match row.try_get::<Value, _>("body")? {
            Value::Object(body) => Ok(Document::new(DocumentId::from_uuid(id), body)),
            other => Err(StoreError::InvalidDocument(format!(
                "document {id} has a non-object body: {other}"
            ))),
        }
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, alias: &str, filter: &Filter) {
        for (field, expected) in &filter.conditions {
            if field == ID_FIELD {
                match expected.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                    Some(id) => {
                        builder.push(format!(" AND {alias}.id = "));
                        builder.push_bind(id);
                    }
                    None => {
                        builder.push(" AND FALSE");
                    }
                }
                continue;
            }

            // `->>` yields NULL for both a missing key and a JSON null.
            let key = key_literal(field);
            match expected {
                Value::Null => {
                    builder.push(format!(" AND {alias}.body ->> {key} IS NULL"));
                }
                Value::String(text) => {
                    builder.push(format!(" AND jsonb_typeof({alias}.body -> {key}) = 'string'"));
                    builder.push(format!(" AND {alias}.body ->> {key} = "));
                    builder.push_bind(text.clone());
                }
                other => {
                    builder.push(format!(" AND {alias}.body -> {key} = "));
                    builder.push_bind(other.clone());
                }
            }
        }
    }
}

/// Renders a body key as a SQL string literal.
///
/// Keys are inlined rather than bound so that the planner can match
/// expression indexes such as `(body ->> 'bookId')`.
fn key_literal(field: &str) -> String {
    format!("'{}'", field.replace('\'', "''"))
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert_one(
        &self,
        collection: Collection,
        body: Map<String, Value>,
    ) -> Result<DocumentId> {
        let id = DocumentId::new();
        let doc = Document::new(id, body);

        sqlx::query("INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(collection.name())
            .bind(Value::Object(doc.body))
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
        let mut builder =
            QueryBuilder::new("SELECT d.id, d.body FROM documents d WHERE d.collection = ");
        builder.push_bind(collection.name());
        Self::push_filter(&mut builder, "d", &filter);
        builder.push(" ORDER BY d.seq ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_document).collect()
    }

    async fn find_one(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn replace_one(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Map<String, Value>,
    ) -> Result<bool> {
        let doc = Document::new(id, body);
        let result = sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id.as_uuid())
            .bind(Value::Object(doc.body))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: DocumentId,
        mut set: Map<String, Value>,
    ) -> Result<bool> {
        set.remove(ID_FIELD);
        let result =
            sqlx::query("UPDATE documents SET body = body || $3 WHERE collection = $1 AND id = $2")
                .bind(collection.name())
                .bind(id.as_uuid())
                .bind(Value::Object(set))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        mut set: Map<String, Value>,
    ) -> Result<u64> {
        set.remove(ID_FIELD);
        let mut builder = QueryBuilder::new("UPDATE documents d SET body = d.body || ");
        builder.push_bind(Value::Object(set));
        builder.push(" WHERE d.collection = ");
        builder.push_bind(collection.name());
        Self::push_filter(&mut builder, "d", &filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_documents(&self, collection: Collection, filter: Filter) -> Result<u64> {
        let mut builder =
            QueryBuilder::new("SELECT COUNT(*) FROM documents d WHERE d.collection = ");
        builder.push_bind(collection.name());
        Self::push_filter(&mut builder, "d", &filter);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn aggregate(&self, collection: Collection, pipeline: Pipeline) -> Result<Vec<Value>> {
        let mut builder: QueryBuilder<'_, Postgres> = match &pipeline.lookup {
            Some(lookup) => {
                let mut builder = QueryBuilder::new(
                    r#"
SELECT d.id, d.body,
    COALESCE(
        jsonb_agg(jsonb_build_object('_id', f.id::text) || f.body ORDER BY f.seq)
            FILTER (WHERE f.id IS NOT NULL),
        '[]'::jsonb
    ) AS joined
FROM documents d
LEFT JOIN documents f ON f.collection = "#,
                );
                builder.push_bind(lookup.from.name());
                let key = key_literal(&lookup.foreign_field);
                builder.push(format!(" AND f.body ->> {key} = d.id::text"));
                builder
            }
            None => {
                QueryBuilder::new("SELECT d.id, d.body, '[]'::jsonb AS joined FROM documents d")
            }
        };

        builder.push(" WHERE d.collection = ");
        builder.push_bind(collection.name());
        if let Some(id) = pipeline.match_id {
            builder.push(" AND d.id = ");
            builder.push_bind(id.as_uuid());
        }
        if pipeline.lookup.is_some() {
            builder.push(" GROUP BY d.seq, d.id, d.body");
        }
        builder.push(" ORDER BY d.seq ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let local = Self::row_to_document(row)?;
                let joined = match row.try_get::<Value, _>("joined")? {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                Ok(pipeline.shape(&local, joined))
            })
            .collect()
    }
}
