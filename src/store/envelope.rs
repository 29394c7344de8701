//! Sealed binary blobs for fitted artifacts
//!
//! Fitted transforms and models are stored as a bincode payload wrapped in
//! an envelope that records what the payload is and guards it with a
//! checksum, so a truncated or mislabelled file is rejected on load.

use super::ArtifactKey;
use crate::error::{PipelineError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Envelope around a serialized artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedArtifact {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Logical key the payload was saved under
    pub kind: ArtifactKey,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// bincode-encoded artifact
    pub payload: Vec<u8>,
    /// FNV-1a checksum of the payload
    pub checksum: u64,
}

impl SealedArtifact {
    const MAGIC: [u8; 4] = [b'C', b'H', b'R', b'N'];
    const VERSION: u32 = 1;

    fn new(kind: ArtifactKey, payload: Vec<u8>) -> Self {
        let checksum = compute_checksum(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            kind,
            created_at: chrono::Utc::now().to_rfc3339(),
            payload,
            checksum,
        }
    }

    fn verify(&self, expected: ArtifactKey) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(PipelineError::SerializationError(
                "not a churn pipeline artifact".to_string(),
            ));
        }
        if self.format_version > Self::VERSION {
            return Err(PipelineError::SerializationError(format!(
                "artifact format version {} is newer than supported version {}",
                self.format_version,
                Self::VERSION
            )));
        }
        if self.kind != expected {
            return Err(PipelineError::SerializationError(format!(
                "expected a {} blob, found a {} blob",
                expected, self.kind
            )));
        }
        if compute_checksum(&self.payload) != self.checksum {
            return Err(PipelineError::SerializationError(format!(
                "checksum mismatch in {} blob",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Serialize `value` and wrap it in an envelope
pub fn seal<T: Serialize>(kind: ArtifactKey, value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)?;
    let sealed = SealedArtifact::new(kind, payload);
    Ok(bincode::serialize(&sealed)?)
}

/// Check the envelope and decode the payload
pub fn open<T: DeserializeOwned>(kind: ArtifactKey, bytes: &[u8]) -> Result<T> {
    let sealed: SealedArtifact = bincode::deserialize(bytes).map_err(|e| {
        PipelineError::SerializationError(format!("unreadable {} blob: {}", kind, e))
    })?;
    sealed.verify(kind)?;
    Ok(bincode::deserialize(&sealed.payload)?)
}

/// FNV-1a hash
fn compute_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights {
        values: Vec<f64>,
        bias: f64,
    }

    #[test]
    fn test_seal_and_open() {
        let weights = Weights {
            values: vec![0.5, -1.25],
            bias: 0.1,
        };
        let bytes = seal(ArtifactKey::SelectedModel, &weights).unwrap();
        let restored: Weights = open(ArtifactKey::SelectedModel, &bytes).unwrap();
        assert_eq!(restored, weights);
    }

    #[test]
    fn test_open_rejects_wrong_kind() {
        let bytes = seal(ArtifactKey::FittedTransform, &1u32).unwrap();
        let err = open::<u32>(ArtifactKey::SelectedModel, &bytes).unwrap_err();
        assert!(err.to_string().contains("expected a selected model blob"));
    }

    #[test]
    fn test_open_rejects_corrupted_payload() {
        let mut sealed = SealedArtifact::new(
            ArtifactKey::SelectedModel,
            bincode::serialize(&vec![1.0f64, 2.0]).unwrap(),
        );
        sealed.payload[0] ^= 0xff;
        let bytes = bincode::serialize(&sealed).unwrap();

        let err = open::<Vec<f64>>(ArtifactKey::SelectedModel, &bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(open::<u32>(ArtifactKey::SelectedModel, b"nope").is_err());
    }

    #[test]
    fn test_checksum_is_stable() {
        assert_eq!(compute_checksum(b""), 14695981039346656037);
        assert_ne!(compute_checksum(b"a"), compute_checksum(b"b"));
    }
}
