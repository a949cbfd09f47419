use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, types::Json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// A schemaless document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// RepoError
///
/// Failures surfaced by the document store.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A write would break id or slug uniqueness within the collection.
    #[error("{0}")]
    Conflict(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    /// The field equals the value.
    Eq(Value),
    /// The field is an array holding the value.
    Contains(Value),
}

/// Filter
///
/// A conjunction of field conditions, mirroring the equality filters a document
/// database accepts. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn by_slug(slug: &str) -> Self {
        Self::new().eq("slug", slug)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    /// Adds an equality condition only when a value is present. Used for optional
    /// query-string filters.
    pub fn eq_opt(self, field: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Contains(value.into())));
        self
    }

    pub fn contains_opt(self, field: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.contains(field, v),
            None => self,
        }
    }

    /// Renders the filter as a JSONB containment document (`data @> $1`).
    pub fn to_containment(&self) -> Value {
        let mut doc = Map::new();
        for (field, condition) in &self.conditions {
            let value = match condition {
                Condition::Eq(v) => v.clone(),
                Condition::Contains(v) => Value::Array(vec![v.clone()]),
            };
            doc.insert(field.clone(), value);
        }
        Value::Object(doc)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| match condition {
            Condition::Eq(expected) => doc.get(field) == Some(expected),
            Condition::Contains(expected) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(expected)),
        })
    }
}

/// FindOptions
///
/// Result shaping for `find`. Lists default to insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub newest_first: bool,
}

impl FindOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            newest_first: false,
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}

/// Repository Trait
///
/// The document-store contract: find / insert / update / delete by filter over
/// named collections. Handlers only talk to this trait, so the Postgres-backed
/// store and the in-memory store are interchangeable.
///
/// Every stored document carries a string `id`; `id` and `slug` are unique per
/// collection, and `username` is unique among users.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> RepoResult<Option<Document>>;

    /// Inserts a new document. Fails with `Conflict` on a duplicate id, slug or
    /// username.
    async fn insert(&self, collection: &str, doc: Document) -> RepoResult<Document>;

    /// Shallow-merges `patch` into the first document matching `filter`, like a
    /// `$set`. The document `id` never changes. Returns the updated document, or
    /// `None` when nothing matched.
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> RepoResult<Option<Document>>;

    /// Replaces the document with the given id, creating it when absent.
    async fn upsert(&self, collection: &str, id: &str, doc: Document) -> RepoResult<Document>;

    /// Deletes every matching document and returns how many were removed.
    async fn delete(&self, collection: &str, filter: &Filter) -> RepoResult<u64>;

    async fn count(&self, collection: &str, filter: &Filter) -> RepoResult<u64>;
}

/// RepositoryState
///
/// The shared handle to the document store held in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

fn document_id(doc: &Document) -> RepoResult<String> {
    match doc.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(RepoError::InvalidDocument(
            "document must carry a non-empty string id".to_string(),
        )),
    }
}

fn document_slug(doc: &Document) -> Option<&str> {
    doc.get("slug").and_then(Value::as_str)
}

/// Collection whose documents also carry a unique `username`.
const USERNAME_COLLECTION: &str = "users";

fn document_username<'d>(collection: &str, doc: &'d Document) -> Option<&'d str> {
    if collection != USERNAME_COLLECTION {
        return None;
    }
    doc.get("username").and_then(Value::as_str)
}

fn without_id(mut patch: Document) -> Document {
    patch.remove("id");
    patch
}

/// PostgresRepository
///
/// Document store on top of a single JSONB table. Filters become containment
/// queries; `seq` preserves insertion order.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// init_schema
    ///
    /// Creates the document table and its uniqueness indexes. Idempotent; called at
    /// every startup.
    pub async fn init_schema(&self) -> RepoResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL,
                seq BIGSERIAL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT documents_pkey PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS documents_slug_key
            ON documents (collection, (data->>'slug'))
            WHERE data ? 'slug'
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS documents_username_key
            ON documents ((data->>'username'))
            WHERE collection = 'users' AND data ? 'username'
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS documents_data_gin ON documents USING GIN (data)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Maps unique-constraint violations to `RepoError::Conflict`.
fn map_write_error(collection: &str, err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let what = match db_err.constraint() {
                Some("documents_slug_key") => "slug",
                Some("documents_username_key") => "username",
                _ => "id",
            };
            return RepoError::Conflict(format!(
                "A document with this {what} already exists in '{collection}'"
            ));
        }
    }
    RepoError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<Document>> {
        let order = if options.newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY seq {order} LIMIT $3"
        );
        let limit = options.limit.map(|l| l as i64).unwrap_or(i64::MAX);

        let rows = sqlx::query_scalar::<_, Json<Document>>(&sql)
            .bind(collection)
            .bind(filter.to_containment())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> RepoResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY seq ASC LIMIT 1",
        )
        .bind(collection)
        .bind(filter.to_containment())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn insert(&self, collection: &str, doc: Document) -> RepoResult<Document> {
        let id = document_id(&doc)?;
        let Json(stored) = sqlx::query_scalar::<_, Json<Document>>(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) RETURNING data",
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> RepoResult<Option<Document>> {
        let patch = without_id(patch);
        let row = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            UPDATE documents SET data = data || $3
            WHERE collection = $1 AND id = (
                SELECT id FROM documents
                WHERE collection = $1 AND data @> $2
                ORDER BY seq ASC LIMIT 1
            )
            RETURNING data
            "#,
        )
        .bind(collection)
        .bind(filter.to_containment())
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn upsert(&self, collection: &str, id: &str, mut doc: Document) -> RepoResult<Document> {
        doc.insert("id".to_string(), Value::String(id.to_string()));
        let Json(stored) = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
            RETURNING data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(stored)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND data @> $2")
            .bind(collection)
            .bind(filter.to_containment())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND data @> $2",
        )
        .bind(collection)
        .bind(filter.to_containment())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}

/// InMemoryRepository
///
/// A process-local document store with the same uniqueness rules as the Postgres
/// store. Backs the integration tests and can run the API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        collection: &str,
        docs: &[Document],
        candidate: &Document,
        skip_id: Option<&str>,
    ) -> RepoResult<()> {
        let id = document_id(candidate)?;
        let slug = document_slug(candidate);
        let username = document_username(collection, candidate);
        for existing in docs {
            let existing_id = existing.get("id").and_then(Value::as_str);
            if skip_id.is_some() && existing_id == skip_id {
                continue;
            }
            if existing_id == Some(id.as_str()) {
                return Err(RepoError::Conflict(format!(
                    "A document with this id already exists in '{collection}'"
                )));
            }
            if slug.is_some() && document_slug(existing) == slug {
                return Err(RepoError::Conflict(format!(
                    "A document with this slug already exists in '{collection}'"
                )));
            }
            if username.is_some() && document_username(collection, existing) == username {
                return Err(RepoError::Conflict(format!(
                    "A document with this username already exists in '{collection}'"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        if options.newest_first {
            docs.reverse();
        }
        if let Some(limit) = options.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> RepoResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert(&self, collection: &str, doc: Document) -> RepoResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        Self::check_unique(collection, docs, &doc, None)?;
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> RepoResult<Option<Document>> {
        let patch = without_id(patch);
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut merged = docs[index].clone();
        merged.extend(patch);
        let id = document_id(&merged)?;
        Self::check_unique(collection, docs, &merged, Some(&id))?;
        docs[index] = merged.clone();
        Ok(Some(merged))
    }

    async fn upsert(&self, collection: &str, id: &str, mut doc: Document) -> RepoResult<Document> {
        doc.insert("id".to_string(), Value::String(id.to_string()));
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        Self::check_unique(collection, docs, &doc, Some(id))?;
        match docs
            .iter()
            .position(|d| d.get("id").and_then(Value::as_str) == Some(id))
        {
            Some(index) => docs[index] = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> RepoResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> RepoResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }
}
