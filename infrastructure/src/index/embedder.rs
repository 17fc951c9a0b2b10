//! Text embedders.

use sha2::{Digest, Sha256};
use tribunal_application::ports::semantic_index::IndexError;

/// Turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;
}

/// Signed feature hashing over words and adjacent word pairs.
///
/// Deterministic and model-free: texts sharing vocabulary land close
/// together, which is enough for same-entity, same-tool recall.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut index = [0u8; 8];
        index.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(index) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

/// Lowercased words; `.` is kept so entity codes like `600519.sh` stay whole.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '.' && c != '_')
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimensions];
        for token in &tokens {
            let (bucket, sign) = self.bucket(token);
            vector[bucket] += sign;
        }
        for pair in tokens.windows(2) {
            let (bucket, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            vector[bucket] += 0.5 * sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

/// Cosine similarity of two unit vectors.
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_entity_codes() {
        assert_eq!(
            tokenize("verified_price for 600519.SH: close."),
            vec!["verified_price", "for", "600519.sh", "close"]
        );
    }

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Moutai closing price").unwrap();
        let b = embedder.embed("Moutai closing price").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("600519.SH closing price").unwrap();
        let related = embedder.embed("verified_price 600519.SH closing price 1710.5").unwrap();
        let unrelated = embedder.embed("shibor overnight rate").unwrap();
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingEmbedder::new(8).embed("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
