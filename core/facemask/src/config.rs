use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::RedactionSettings;

/// Settings for an [`crate::service::UploadService`], fixed at startup.
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bucket uploads are written to.
    pub bucket: String,
    /// Password for the dashboard listing. Empty keeps the dashboard closed.
    pub dashboard_password: String,
    /// Where redacted images wait between preview and confirmation.
    pub staging_dir: PathBuf,
    /// Age after which an unconfirmed preview is purged, in seconds.
    pub staging_max_age_secs: u64,
    /// Lifetime of dashboard links, in seconds (default: 24 hours).
    pub signed_url_expiry_secs: u64,
    /// Padding around the landmark box as a fraction of its size.
    pub padding: f32,
    /// Minimum side of the redaction rectangle in pixels; 0 disables it.
    pub min_size: u32,
    /// Opacity of the preview overlay.
    pub preview_alpha: f64,
    /// JPEG quality of the preview.
    pub preview_quality: f32,
    /// JPEG quality of the stored image.
    pub final_quality: f32,
}

impl Default for Config {
    fn default() -> Self {
        let settings = RedactionSettings::default();
        Self {
            bucket: "uploads".to_string(),
            dashboard_password: String::new(),
            staging_dir: std::env::temp_dir().join("facemask"),
            staging_max_age_secs: 3_600,
            signed_url_expiry_secs: 86_400,
            padding: settings.padding,
            min_size: settings.min_size,
            preview_alpha: settings.preview_alpha,
            preview_quality: crate::DEFAULT_PREVIEW_QUALITY,
            final_quality: crate::DEFAULT_FINAL_QUALITY,
        }
    }
}

impl Config {
    /// Lifetime of dashboard links.
    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    /// Age after which an unconfirmed preview is purged.
    pub fn staging_max_age(&self) -> Duration {
        Duration::from_secs(self.staging_max_age_secs)
    }

    /// Whether `candidate` is the configured dashboard password.
    ///
    /// Always false while no password is configured. The comparison looks at
    /// every byte so its timing does not reveal the matching prefix.
    pub fn dashboard_password_matches(&self, candidate: &str) -> bool {
        let expected = self.dashboard_password.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.is_empty() || expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }

    /// Redaction geometry, with the default colours.
    pub fn redaction_settings(&self) -> RedactionSettings {
        RedactionSettings {
            padding: self.padding,
            min_size: self.min_size,
            preview_alpha: self.preview_alpha,
            ..RedactionSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.signed_url_expiry(), Duration::from_secs(86_400));
        assert_eq!(config.padding, 0.35);
        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.staging_max_age(), Duration::from_secs(3_600));
        assert_eq!(config.redaction_settings(), RedactionSettings::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"staging_dir": "/srv/staging", "padding": 0.3}"#).unwrap();
        assert_eq!(config.staging_dir, PathBuf::from("/srv/staging"));
        assert_eq!(config.padding, 0.3);
        assert_eq!(config.signed_url_expiry_secs, 86_400);
        assert_eq!(config.final_quality, 0.92);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config: Config = serde_json::from_str(r#"{"region": "eu-central-003"}"#).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bucket_and_password_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"bucket": "wound-photos", "dashboard_password": "s3cret"}"#)
                .unwrap();
        assert_eq!(config.bucket, "wound-photos");
        assert!(config.dashboard_password_matches("s3cret"));
        assert!(!config.dashboard_password_matches("s3cre"));
        assert!(!config.dashboard_password_matches("s3creT"));
        assert!(!config.dashboard_password_matches(""));
    }

    #[test]
    fn empty_password_locks_dashboard() {
        let config = Config::default();
        assert!(config.dashboard_password.is_empty());
        assert!(!config.dashboard_password_matches(""));
    }
}
