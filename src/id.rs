// Identifier generation
// Collaborator seam for minting resource identifiers; handlers depend on the
// trait so tests can inject a failing generator.

use nanoid::nanoid;
use thiserror::Error;

/// Identifier generation failure. Handlers must surface this as a failure
/// outcome, never swallow it.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct IdError {
    pub reason: String,
}

pub trait IdGenerator: Send + Sync {
    /// Mint a new unique resource identifier.
    fn generate(&self) -> Result<String, IdError>;
}

/// Default generator backed by nanoid: 21 URL-safe characters.
pub struct NanoId;

impl IdGenerator for NanoId {
    fn generate(&self) -> Result<String, IdError> {
        Ok(nanoid!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_length() {
        let id = NanoId.generate().unwrap();
        assert_eq!(id.len(), 21);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(NanoId.generate().unwrap(), NanoId.generate().unwrap());
    }
}
