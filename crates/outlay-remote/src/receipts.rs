//! Receipt image uploads to the file-object storage boundary.

use tracing::debug;
use uuid::Uuid;

use outlay_types::Fault;

use crate::auth::SessionStore;
use crate::config::GatewayConfig;

/// The storage bucket receipts land in.
const RECEIPTS_BUCKET: &str = "receipts";

/// Client for path-based object uploads.
pub struct ReceiptStore {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    sessions: SessionStore,
}

impl ReceiptStore {
    pub fn new(config: &GatewayConfig, sessions: SessionStore) -> Self {
        Self {
            agent: config.build_agent(),
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            sessions,
        }
    }

    /// Upload receipt bytes under `<owner>/<uuid>.<ext>` and return the
    /// storage path. The generated name avoids collisions; the upload
    /// itself refuses to overwrite an existing object.
    pub fn upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, Fault> {
        let owner = self
            .sessions
            .user_id()
            .unwrap_or_else(|| "anonymous".to_string());
        let object_path = format!("{}/{}", owner, object_name(original_name));
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, RECEIPTS_BUCKET, object_path
        );

        let token = self
            .sessions
            .current()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.api_key.clone());
        self.agent
            .post(&url)
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", token))
            .set("Content-Type", content_type_for(original_name))
            .set("x-upsert", "false")
            .send_bytes(bytes)
            .map_err(|e| Fault::upload(format!("{}: {}", object_path, e)))?;

        debug!(path = %object_path, size = bytes.len(), "receipt uploaded");
        Ok(object_path)
    }
}

/// Fresh object name keeping the original extension.
fn object_name(original_name: &str) -> String {
    match extension_of(original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
