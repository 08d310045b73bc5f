mod local_artifact_store;

pub use local_artifact_store::{LocalArtifactStore, LocalArtifactStoreConfig};
