// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Managed memory backend on a Pinecone serverless index.
//!
//! Talks to the index's data-plane host over REST. Records carry
//! `{session_id, text}` metadata and every query is filtered to one
//! session. Matches return text only unless `include_values` is set.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use minuta_config::model::PineconeConfig;
use minuta_core::{
    AdapterType, Candidate, CandidateSet, HealthStatus, MinutaError, PluginAdapter,
    VectorIndexAdapter,
};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::{
    session_filter, DeleteRequest, QueryRequest, QueryResponse, RecordMetadata, UpsertRequest,
    UpsertResponse, Vector,
};

/// Pinecone index implementing [`VectorIndexAdapter`].
pub struct PineconeIndex {
    http: reqwest::Client,
    host: String,
    namespace: String,
    include_values: bool,
}

impl PineconeIndex {
    /// Creates an adapter from the `[pinecone]` section.
    ///
    /// The API key comes from `pinecone.api_key` or `PINECONE_API_KEY`;
    /// `pinecone.index_host` is required.
    pub fn new(config: &PineconeConfig) -> Result<Self, MinutaError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let host = config
            .index_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| MinutaError::Config("pinecone.index_host is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(&api_key)
                .map_err(|e| MinutaError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MinutaError::Index {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(host, namespace = config.namespace, "Pinecone index initialized");
        Ok(Self {
            http,
            host: normalize_host(host),
            namespace: config.namespace.clone(),
            include_values: config.include_values,
        })
    }

    /// Overrides the data-plane host (for testing with wiremock).
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = normalize_host(host);
        self
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MinutaError> {
        let url = format!("{}{path}", self.host);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MinutaError::Index {
                message: format!("Pinecone request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinutaError::index(format!("Pinecone returned {status}: {body}")));
        }

        response.json().await.map_err(|e| MinutaError::Index {
            message: format!("failed to parse Pinecone response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, MinutaError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("PINECONE_API_KEY").map_err(|_| {
        MinutaError::Config(
            "Pinecone API key not found. Set pinecone.api_key in config or PINECONE_API_KEY environment variable.".into(),
        )
    })
}

#[async_trait]
impl PluginAdapter for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorIndex
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        let stats: Result<serde_json::Value, _> =
            self.post("/describe_index_stats", &serde_json::json!({})).await;
        Ok(match stats {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        Ok(())
    }
}

#[async_trait]
impl VectorIndexAdapter for PineconeIndex {
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Ids are `<session>-<random 0..1_000_000>`; a colliding id overwrites.
    async fn insert(
        &self,
        session_id: &str,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<String, MinutaError> {
        let id = format!("{session_id}-{}", rand::thread_rng().gen_range(0..1_000_000));
        let request = UpsertRequest {
            vectors: vec![Vector {
                id: id.clone(),
                values: embedding,
                metadata: RecordMetadata {
                    session_id: session_id.to_string(),
                    text: Some(text.to_string()),
                },
            }],
            namespace: self.namespace.clone(),
        };

        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        debug!(id = %id, upserted = response.upserted_count, "Pinecone upsert");
        Ok(id)
    }

    async fn query(
        &self,
        session_id: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<CandidateSet, MinutaError> {
        if top_k == 0 {
            return Ok(CandidateSet::empty());
        }

        let request = QueryRequest {
            vector: embedding.to_vec(),
            top_k,
            filter: session_filter(session_id),
            include_metadata: true,
            include_values: self.include_values,
            namespace: self.namespace.clone(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;

        let mut candidates = Vec::with_capacity(response.matches.len());
        for m in response.matches {
            let Some(text) = m.metadata.and_then(|meta| meta.text) else {
                warn!(id = %m.id, "Pinecone match without text metadata skipped");
                continue;
            };
            let embedding = (!m.values.is_empty()).then_some(m.values);
            candidates.push(Candidate { text, embedding });
        }

        let embeddings_included = self.include_values
            && !candidates.is_empty()
            && candidates.iter().all(|c| c.embedding.is_some());
        if !embeddings_included {
            candidates.iter_mut().for_each(|c| c.embedding = None);
        }

        Ok(CandidateSet {
            candidates,
            embeddings_included,
        })
    }

    /// Pinecone does not report how many vectors a filtered delete removed.
    async fn delete_session(&self, session_id: &str) -> Result<Option<u64>, MinutaError> {
        let request = DeleteRequest {
            filter: session_filter(session_id),
            namespace: self.namespace.clone(),
        };
        let _: serde_json::Value = self.post("/vectors/delete", &request).await?;
        Ok(None)
    }
}
