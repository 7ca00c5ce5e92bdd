use discovery_core::DiscoveryError;
use std::io::ErrorKind;
use std::path::Path;

/// Read a transcript file, mapping failures onto input errors
pub async fn read_transcript(path: &Path) -> Result<String, DiscoveryError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        let path = path.display().to_string();
        match e.kind() {
            ErrorKind::NotFound => DiscoveryError::FileNotFound(path),
            _ => DiscoveryError::Extraction {
                path,
                message: e.to_string(),
            },
        }
    })
}
