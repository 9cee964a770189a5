//! Object-store credential boundary.
//!
//! Starflow never reads secrets itself. Whoever builds a [`StagingLoader`]
//! hands it a [`CredentialProvider`], and the loader forwards the material
//! to the warehouse as an opaque secret.
//!
//! [`StagingLoader`]: crate::StagingLoader

use std::fmt;

/// Access keys for an object store
#[derive(Clone, PartialEq, Eq)]
pub struct ObjectStoreCredentials {
    /// Access key id
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,

    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl fmt::Debug for ObjectStoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Supplies credential material for object-store reads
pub trait CredentialProvider: Send + Sync {
    /// Credentials to use, or `None` to let the warehouse resolve its own
    /// credential chain
    fn object_store_credentials(&self) -> Option<ObjectStoreCredentials>;
}

impl CredentialProvider for ObjectStoreCredentials {
    fn object_store_credentials(&self) -> Option<ObjectStoreCredentials> {
        Some(self.clone())
    }
}
