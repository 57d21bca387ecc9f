use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::FacemaskError;
use crate::landmarks::LandmarkDetector;
use crate::region::RedactionRect;
use crate::staging::Staging;
use crate::store::ObjectStore;
use crate::upload::{parse_upload_key, upload_key, UploadMetadata};
use crate::Redactor;

/// What the participant sees before confirming an upload.
#[derive(Debug, Clone)]
pub struct PreviewTicket {
    /// The translucent preview as a `data:` URI.
    pub data_uri: String,
    /// Redeems the staged final image in [`UploadService::confirm`].
    pub token: String,
    /// The region that will be blacked out.
    pub rect: RedactionRect,
    /// Whether the region came from a detected face.
    pub face_detected: bool,
}

/// One stored upload as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadEntry {
    /// Object key in the store.
    pub key: String,
    /// Time-limited read link.
    pub url: String,
    /// Upload time parsed from the key, if it has one.
    pub uploaded_at: Option<NaiveDateTime>,
    /// Zone, length and treatment parsed from the key.
    #[serde(flatten)]
    pub metadata: UploadMetadata,
}

/// The upload flow: redact and preview, confirm into storage, list for review.
pub struct UploadService<S> {
    config: Config,
    staging: Staging,
    store: S,
    detector: Arc<dyn LandmarkDetector>,
}

impl<S: ObjectStore> UploadService<S> {
    /// Create the service, preparing the staging directory.
    pub fn new(
        config: Config,
        store: S,
        detector: Arc<dyn LandmarkDetector>,
    ) -> Result<Self, FacemaskError> {
        let staging = Staging::new(&config.staging_dir)?;
        Ok(Self {
            config,
            staging,
            store,
            detector,
        })
    }

    /// The backing object store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Redact `photo`, stage the final image and return its preview.
    pub fn preview(&self, photo: Vec<u8>) -> Result<PreviewTicket, FacemaskError> {
        let redacted = Redactor::new(photo)?
            .settings(self.config.redaction_settings())
            .preview_quality(self.config.preview_quality)
            .final_quality(self.config.final_quality)
            .landmark_detector(Box::new(Arc::clone(&self.detector)))
            .redact()?;

        let token = self.staging.stage(&redacted.final_image)?;
        info!(
            %token,
            width = redacted.width,
            height = redacted.height,
            face_detected = redacted.face_detected,
            "preview generated"
        );

        Ok(PreviewTicket {
            data_uri: redacted.preview_data_uri(),
            token,
            rect: redacted.rect,
            face_detected: redacted.face_detected,
        })
    }

    /// Move the image staged under `token` into the store and return its key.
    pub fn confirm(
        &self,
        token: &str,
        metadata: &UploadMetadata,
        now: DateTime<Utc>,
    ) -> Result<String, FacemaskError> {
        let data = self.staging.read(token)?;
        let key = upload_key(now, metadata);
        // The staged copy stays redeemable until the store has accepted it
        self.store.put(&key, &data)?;
        self.staging.discard(token)?;
        info!(%key, bytes = data.len(), bucket = %self.config.bucket, "upload stored");
        Ok(key)
    }

    /// Delete previews that were never confirmed within the configured age.
    pub fn purge_stale(&self) -> Result<usize, FacemaskError> {
        self.staging.purge_older_than(self.config.staging_max_age())
    }

    /// Every stored upload with a signed link, in key order.
    ///
    /// Requires the configured dashboard password; an empty configured
    /// password keeps the dashboard closed.
    pub fn dashboard(&self, password: &str) -> Result<Vec<UploadEntry>, FacemaskError> {
        if !self.config.dashboard_password_matches(password) {
            warn!("dashboard access denied");
            return Err(FacemaskError::Unauthorized);
        }
        let expiry = self.config.signed_url_expiry();
        self.store
            .list()?
            .into_iter()
            .map(|key| {
                let url = self.store.signed_url(&key, expiry)?;
                let parsed = parse_upload_key(&key);
                Ok(UploadEntry {
                    key,
                    url,
                    uploaded_at: parsed.uploaded_at,
                    metadata: parsed.metadata,
                })
            })
            .collect()
    }
}
