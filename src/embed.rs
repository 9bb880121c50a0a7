//! The embedding provider seam. Concrete transports (Ollama, a local
//! transformers model, an API-backed provider) are external collaborators;
//! this crate only defines the contract and a lexical-only fallback.

use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single piece of text. Called once per chunk during indexing
    /// and once per query during retrieval.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Fixed output width, or 0 for a no-op/lexical-only embedder.
    fn dimensions(&self) -> usize;

    async fn is_available(&self) -> bool {
        true
    }
}

/// Lexical-only embedder: always returns an empty vector. The default when
/// no embedding transport has been wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmbedder;

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Vec::new())
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_embedder_returns_empty_vector() {
        let e = NoopEmbedder;
        assert_eq!(e.embed("hello").await.unwrap(), Vec::<f32>::new());
        assert_eq!(e.dimensions(), 0);
        assert!(e.is_available().await);
    }
}
