use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use crate::error::FacemaskError;

/// Blob storage for confirmed uploads.
///
/// Any key-value store with time-limited read links fits: an S3-compatible
/// bucket, a CDN origin, a local directory behind a signing proxy.
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), FacemaskError>;

    /// All keys in the store, in lexicographic order.
    fn list(&self) -> Result<Vec<String>, FacemaskError>;

    /// A URL granting read access to `key` for `expiry`.
    fn signed_url(&self, key: &str, expiry: Duration) -> Result<String, FacemaskError>;
}

/// In-process store, for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store; `bucket` appears in its URLs.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Read back an object.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), FacemaskError> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, FacemaskError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    fn signed_url(&self, key: &str, expiry: Duration) -> Result<String, FacemaskError> {
        let exists = self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(key);
        if !exists {
            return Err(FacemaskError::NotFound(key.to_string()));
        }
        let expires = Utc::now().timestamp() + expiry.as_secs() as i64;
        Ok(format!("memory://{}/{key}?expires={expires}", self.bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_list_get() {
        let store = MemoryStore::new("uploads");
        store.put("b.jpg", b"2").unwrap();
        store.put("a.jpg", b"1").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a.jpg", "b.jpg"]);
        assert_eq!(store.get("a.jpg").as_deref(), Some(&b"1"[..]));
    }

    #[test]
    fn put_overwrites() {
        let store = MemoryStore::new("uploads");
        store.put("k", b"old").unwrap();
        store.put("k", b"new").unwrap();
        assert_eq!(store.get("k").unwrap(), b"new");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn signed_url_embeds_expiry() {
        let store = MemoryStore::new("uploads");
        store.put("a.jpg", b"1").unwrap();
        let before = Utc::now().timestamp();
        let url = store.signed_url("a.jpg", Duration::from_secs(60)).unwrap();
        let (prefix, expires) = url.split_once("?expires=").unwrap();
        assert_eq!(prefix, "memory://uploads/a.jpg");
        let expires: i64 = expires.parse().unwrap();
        assert!(expires >= before + 60 && expires <= Utc::now().timestamp() + 60);
    }

    #[test]
    fn signed_url_for_missing_key() {
        let store = MemoryStore::new("uploads");
        assert!(matches!(
            store.signed_url("nope", Duration::from_secs(1)),
            Err(FacemaskError::NotFound(_))
        ));
    }
}
