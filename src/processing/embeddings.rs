//! Embedding gateway: the provider contract, request batching, and vector
//! validation

use crate::config::EmbeddingConfig;
use crate::error::{Result, ScreenerError};
use crate::processing::document::Chunk;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Remote model that maps texts to fixed-length vectors. Vectors come back
/// in request order, one per input text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>>;
}

/// Batches texts toward a provider and validates what comes back. Invalid
/// vectors (wrong dimensionality, non-finite or all-zero components) are
/// treated as absent rather than substituted.
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        Self { provider, config }
    }

    /// Embed every text, batch by batch, returning one slot per input.
    /// A failed provider call fails the whole request; a vector that fails
    /// validation only empties its own slot.
    pub async fn embed_validated(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        let mut slots = Vec::with_capacity(texts.len());
        let batch_size = self.config.batch_size.max(1);
        for batch in texts.chunks(batch_size) {
            let vectors = self.provider.embed(batch, &self.config.model).await?;
            if vectors.len() != batch.len() {
                return Err(ScreenerError::EmbeddingsFailed(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in vectors {
                slots.push(self.validate(vector));
            }
        }
        debug!(
            "embedded {} of {} texts",
            slots.iter().filter(|s| s.is_some()).count(),
            texts.len()
        );
        Ok(slots)
    }

    /// Embed the chunks that do not already carry a valid vector, in chunk
    /// order, and return how many chunks end up embedded. Re-embedding is
    /// idempotent: already-embedded chunks are skipped.
    pub async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<usize> {
        let pending: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_embedded())
            .map(|(i, _)| i)
            .collect();

        if !pending.is_empty() {
            let texts: Vec<String> = pending
                .iter()
                .map(|&i| chunks[i].content.clone())
                .collect();
            let slots = self.embed_validated(&texts).await?;
            for (&idx, slot) in pending.iter().zip(slots) {
                match slot {
                    Some(vector) => chunks[idx].embedding = Some(vector),
                    None => warn!("dropping invalid embedding for chunk {}", chunks[idx].id),
                }
            }
        }

        Ok(chunks.iter().filter(|c| c.is_embedded()).count())
    }

    fn validate(&self, vector: Vec<f32>) -> Option<Vec<f32>> {
        if vector.is_empty() {
            return None;
        }
        if let Some(expected) = self.config.expected_dimensions {
            if vector.len() != expected {
                return None;
            }
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return None;
        }
        if vector.iter().all(|x| *x == 0.0) {
            return None;
        }
        Some(vector)
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let api_key = if config.api_key_env.is_empty() {
            None
        } else {
            std::env::var(&config.api_key_env).ok()
        };
        Self::new(config.endpoint.clone(), api_key)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { model, input: texts });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScreenerError::EmbeddingsFailed(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(ScreenerError::EmbeddingsFailed(format!(
                "provider returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ScreenerError::EmbeddingsFailed(format!("bad response body: {}", e)))?;

        let mut rows = body.data;
        rows.sort_by_key(|row| row.index);
        if rows.len() != texts.len() {
            return Err(ScreenerError::EmbeddingsFailed(format!(
                "provider returned {} embeddings for {} inputs",
                rows.len(),
                texts.len()
            )));
        }
        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::Section;
    use std::sync::Mutex;

    struct RecordingProvider {
        dimensions: usize,
        calls: Mutex<Vec<usize>>,
    }

    impl RecordingProvider {
        fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| {
                    let seed = t.len() as f32 + 1.0;
                    (0..self.dimensions).map(|i| seed + i as f32).collect()
                })
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
            Err(ScreenerError::EmbeddingsFailed("quota exceeded".to_string()))
        }
    }

    fn gateway(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, dims: Option<usize>) -> EmbeddingGateway {
        EmbeddingGateway::new(
            provider,
            EmbeddingConfig {
                batch_size,
                expected_dimensions: dims,
                ..EmbeddingConfig::default()
            },
        )
    }

    fn chunk(id: usize, content: &str) -> Chunk {
        Chunk {
            id,
            section: Section::Other,
            content: content.to_string(),
            embedding: None,
        }
    }

    #[tokio::test]
    async fn test_batching_preserves_order() {
        let provider = Arc::new(RecordingProvider::new(4));
        let gw = gateway(provider.clone(), 2, Some(4));

        let texts: Vec<String> = vec!["a", "bb", "ccc", "dddd", "eeeee"]
            .into_iter()
            .map(String::from)
            .collect();
        let slots = gw.embed_validated(&texts).await.unwrap();

        assert_eq!(slots.len(), 5);
        for (text, slot) in texts.iter().zip(&slots) {
            let vector = slot.as_ref().unwrap();
            assert_eq!(vector[0], text.len() as f32 + 1.0);
        }
        assert_eq!(*provider.calls.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_wrong_dimensionality_is_dropped() {
        let provider = Arc::new(RecordingProvider::new(3));
        let gw = gateway(provider, 64, Some(4));

        let slots = gw
            .embed_validated(&["text".to_string()])
            .await
            .unwrap();
        assert!(slots[0].is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let gw = gateway(Arc::new(FailingProvider), 64, None);
        let err = gw.embed_validated(&["text".to_string()]).await.unwrap_err();
        assert!(matches!(err, ScreenerError::EmbeddingsFailed(_)));
    }

    #[tokio::test]
    async fn test_embed_chunks_is_idempotent() {
        let provider = Arc::new(RecordingProvider::new(4));
        let gw = gateway(provider.clone(), 64, Some(4));

        let mut chunks = vec![chunk(0, "alpha"), chunk(1, "beta")];
        chunks[0].embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);

        let embedded = gw.embed_chunks(&mut chunks).await.unwrap();
        assert_eq!(embedded, 2);
        // only the pending chunk went over the wire
        assert_eq!(*provider.calls.lock().unwrap(), vec![1]);
        assert_eq!(chunks[0].embedding.as_ref().unwrap()[0], 1.0);
    }

    #[test]
    fn test_validation_rules() {
        let gw = gateway(Arc::new(FailingProvider), 64, Some(3));
        assert!(gw.validate(vec![1.0, 2.0, 3.0]).is_some());
        assert!(gw.validate(vec![]).is_none());
        assert!(gw.validate(vec![1.0, 2.0]).is_none());
        assert!(gw.validate(vec![0.0, 0.0, 0.0]).is_none());
        assert!(gw.validate(vec![1.0, f32::NAN, 2.0]).is_none());
        assert!(gw.validate(vec![1.0, f32::INFINITY, 2.0]).is_none());
    }
}
