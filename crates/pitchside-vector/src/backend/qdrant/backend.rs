//! Qdrant backend implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, FieldType,
    Filter, GetPointsBuilder, PointId, PointStruct, QueryPointsBuilder, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use uuid::Uuid;

use super::QdrantConfig;
use crate::TRACING_TARGET_BACKEND;
use crate::backend::{QueryShape, VectorBackend};
use crate::config::Distance;
use crate::error::{BackendError, BackendErrorKind, BackendResult, VectorError, VectorResult};
use crate::filter::{FilterValue, SearchFilter};
use crate::schema::SchemaKind;
use crate::types::{CollectionInfo, Payload, Point, SearchHit};

/// [`VectorBackend`] over the Qdrant gRPC API.
///
/// Every client failure is classified by its gRPC status code before it
/// leaves this type, so callers only ever see a [`BackendErrorKind`].
#[derive(Clone)]
pub struct QdrantBackend {
    client: Arc<Qdrant>,
    config: QdrantConfig,
}

impl QdrantBackend {
    /// Builds a client for the configured endpoint.
    ///
    /// No request is sent; connectivity is checked by the first call, usually
    /// the searcher's self-test.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(url = %config.qdrant_url))]
    pub fn connect(config: QdrantConfig) -> VectorResult<Self> {
        config.validate()?;

        let client = Qdrant::from_url(config.qdrant_url.trim())
            .api_key(config.api_key().map(str::to_owned))
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_BACKEND,
                    error = %e,
                    url = %config.qdrant_url,
                    "Failed to create Qdrant client"
                );
                VectorError::connection(e.to_string())
            })?;

        tracing::info!(
            target: TRACING_TARGET_BACKEND,
            url = %config.qdrant_url,
            has_api_key = config.api_key().is_some(),
            "Qdrant client created"
        );

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Returns the configuration this backend was built from.
    pub fn config(&self) -> &QdrantConfig {
        &self.config
    }

    async fn query_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>> {
        let mut request = QueryPointsBuilder::new(collection)
            .query(vector.to_vec())
            .limit(limit as u64)
            .with_payload(true);

        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }

        let response = self
            .client
            .query(request)
            .await
            .map_err(|e| classify(e, "query", collection))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: extract_point_id(point.id),
                payload: to_json_payload(point.payload),
                score: point.score,
            })
            .collect())
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>> {
        let mut request =
            SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true);

        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| classify(e, "search", collection))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: extract_point_id(point.id),
                payload: to_json_payload(point.payload),
                score: point.score,
            })
            .collect())
    }
}

impl std::fmt::Debug for QdrantBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND)]
    async fn list_collections(&self) -> BackendResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| classify(e, "list_collections", "*"))?;

        Ok(response
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection))]
    async fn collection_info(&self, collection: &str) -> BackendResult<CollectionInfo> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| classify(e, "collection_info", collection))?;

        let indexed_fields = response
            .result
            .map(|info| info.payload_schema.into_keys().collect())
            .unwrap_or_default();

        Ok(CollectionInfo { indexed_fields })
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, vector_dim = vector_dim))]
    async fn create_collection(
        &self,
        collection: &str,
        vector_dim: usize,
        distance: Distance,
    ) -> BackendResult<()> {
        let params = VectorParamsBuilder::new(vector_dim as u64, to_qdrant_distance(distance));

        self.client
            .create_collection(CreateCollectionBuilder::new(collection).vectors_config(params))
            .await
            .map_err(|e| classify(e, "create_collection", collection))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, field = %field, schema = %schema))]
    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: SchemaKind,
    ) -> BackendResult<()> {
        let request =
            CreateFieldIndexCollectionBuilder::new(collection, field, to_field_type(schema))
                .wait(true);

        self.client
            .create_field_index(request)
            .await
            .map_err(|e| classify(e, "create_payload_index", collection))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, id = %id))]
    async fn retrieve(&self, collection: &str, id: Uuid) -> BackendResult<Option<Payload>> {
        let request = GetPointsBuilder::new(collection, vec![PointId::from(id.to_string())])
            .with_payload(true)
            .with_vectors(false);

        let response = self
            .client
            .get_points(request)
            .await
            .map_err(|e| classify(e, "retrieve", collection))?;

        Ok(response
            .result
            .into_iter()
            .next()
            .map(|point| to_json_payload(point.payload)))
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, id = %point.id))]
    async fn upsert(&self, collection: &str, point: Point) -> BackendResult<()> {
        let payload: HashMap<String, qdrant::Value> = point
            .payload
            .into_iter()
            .map(|(key, value)| (key, json_to_qdrant_value(value)))
            .collect();

        let point = PointStruct::new(point.id.to_string(), point.vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(|e| classify(e, "upsert", collection))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, shape = %shape, limit = limit))]
    async fn query(
        &self,
        shape: QueryShape,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>> {
        match shape {
            QueryShape::Query => self.query_points(collection, vector, limit, filter).await,
            QueryShape::Search => self.search_points(collection, vector, limit, filter).await,
        }
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_BACKEND, fields(collection = %collection, limit = limit))]
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> BackendResult<Vec<SearchHit>> {
        let mut request = ScrollPointsBuilder::new(collection)
            .limit(u32::try_from(limit).unwrap_or(u32::MAX))
            .with_payload(true)
            .with_vectors(false);

        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }

        let response = self
            .client
            .scroll(request)
            .await
            .map_err(|e| classify(e, "scroll", collection))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: extract_point_id(point.id),
                payload: to_json_payload(point.payload),
                score: 0.0,
            })
            .collect())
    }
}

/// Maps a client failure to a [`BackendError`] by gRPC status code.
fn classify(error: QdrantError, operation: &str, collection: &str) -> BackendError {
    let kind = match &error {
        QdrantError::ResponseError { status } => kind_for_code(status.code() as i32),
        _ => BackendErrorKind::Other,
    };

    tracing::debug!(
        target: TRACING_TARGET_BACKEND,
        operation,
        collection,
        kind = %kind,
        error = %error,
        "Qdrant request failed"
    );

    BackendError::new(kind, format!("{operation} on '{collection}' failed")).with_source(error)
}

/// Status codes as numbered by gRPC.
fn kind_for_code(code: i32) -> BackendErrorKind {
    match code {
        5 => BackendErrorKind::NotFound,
        6 => BackendErrorKind::AlreadyExists,
        7 | 16 => BackendErrorKind::Forbidden,
        12 => BackendErrorKind::SchemaMismatch,
        _ => BackendErrorKind::Other,
    }
}

fn to_qdrant_distance(distance: Distance) -> qdrant::Distance {
    match distance {
        Distance::Cosine => qdrant::Distance::Cosine,
    }
}

fn to_field_type(schema: SchemaKind) -> FieldType {
    match schema {
        SchemaKind::Exact => FieldType::Keyword,
        SchemaKind::Text => FieldType::Text,
        SchemaKind::Integer => FieldType::Integer,
    }
}

fn to_qdrant_filter(filter: &SearchFilter) -> Filter {
    let condition = match &filter.equals {
        FilterValue::Integer(value) => Condition::matches(filter.field.clone(), *value),
        FilterValue::Keyword(value) => Condition::matches(filter.field.clone(), value.clone()),
    };
    Filter::must([condition])
}

fn extract_point_id(id: Option<PointId>) -> String {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(s)) => s,
        None => String::new(),
    }
}

fn to_json_payload(payload: HashMap<String, qdrant::Value>) -> Payload {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_value_to_json(value)))
        .collect()
}

fn json_to_qdrant_value(value: serde_json::Value) -> qdrant::Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Kind::IntegerValue(i),
            (None, Some(f)) => Kind::DoubleValue(f),
            (None, None) => Kind::StringValue(n.to_string()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(values) => Kind::ListValue(qdrant::ListValue {
            values: values.into_iter().map(json_to_qdrant_value).collect(),
        }),
        serde_json::Value::Object(fields) => Kind::StructValue(qdrant::Struct {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant_value(value)))
                .collect(),
        }),
    };

    qdrant::Value { kind: Some(kind) }
}

fn qdrant_value_to_json(value: qdrant::Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Value::from(f),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => serde_json::Value::Array(
            list.values.into_iter().map(qdrant_value_to_json).collect(),
        ),
        Some(Kind::StructValue(object)) => serde_json::Value::Object(
            object
                .fields
                .into_iter()
                .map(|(key, value)| (key, qdrant_value_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_codes_map_to_kinds() {
        assert_eq!(kind_for_code(5), BackendErrorKind::NotFound);
        assert_eq!(kind_for_code(6), BackendErrorKind::AlreadyExists);
        assert_eq!(kind_for_code(7), BackendErrorKind::Forbidden);
        assert_eq!(kind_for_code(16), BackendErrorKind::Forbidden);
        assert_eq!(kind_for_code(12), BackendErrorKind::SchemaMismatch);
        assert_eq!(kind_for_code(3), BackendErrorKind::Other);
        assert_eq!(kind_for_code(14), BackendErrorKind::Other);
    }

    #[test]
    fn test_payload_values_survive_conversion() {
        let original = json!({
            "match_id": 9001,
            "home_team": "A",
            "win_probability": 0.75,
            "announced": true,
            "squads": [{"player_id": 1}],
            "venue": null
        });

        let converted = qdrant_value_to_json(json_to_qdrant_value(original.clone()));
        assert_eq!(converted, original);
    }

    #[test]
    fn test_integer_stays_integer() {
        let value = json_to_qdrant_value(json!(9001));
        assert!(matches!(value.kind, Some(Kind::IntegerValue(9001))));
    }

    #[test]
    fn test_point_id_forms() {
        let uuid = Uuid::nil().to_string();
        assert_eq!(extract_point_id(Some(PointId::from(uuid.clone()))), uuid);
        assert_eq!(extract_point_id(Some(PointId::from(7u64))), "7");
        assert_eq!(extract_point_id(None), "");
    }

    #[test]
    fn test_connect_rejects_invalid_config() {
        assert!(QdrantBackend::connect(QdrantConfig::new("localhost")).is_err());
    }
}
