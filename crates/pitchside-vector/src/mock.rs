//! Deterministic embedder for tests.

use async_trait::async_trait;

use crate::embed::Embedder;
use crate::error::EmbeddingError;

/// Hashing bag-of-words embedder.
///
/// Each lower-cased alphanumeric token adds one to a bucket chosen by an
/// FNV-1a hash, and the result is L2-normalized. Texts sharing words are
/// therefore closer than texts that do not.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dim: usize,
    fail: bool,
}

impl MockEmbedder {
    /// Creates an embedder producing vectors of `dim` components.
    pub fn new(dim: usize) -> Self {
        Self { dim, fail: false }
    }

    /// Creates an embedder whose every call fails.
    pub fn failing() -> Self {
        Self { dim: 0, fail: true }
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
        (hash % self.dim as u64) as usize
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::new("mock embedder configured to fail"));
        }

        let mut vector = vec![0.0_f32; self.dim];
        if self.dim == 0 {
            return Ok(vector);
        }

        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .for_each(|token| vector[self.bucket(&token.to_lowercase())] += 1.0);

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
