//! Device state store.
//!
//! The set of devices is fixed once the store is built; each device sits
//! behind its own `RwLock`, so reads of one device never block each other,
//! writes to one device are serialised, and different devices are mutated
//! independently.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::device::Device;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("device not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: HashMap<String, RwLock<Device>>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. Returns false if a device with the same artifact URI
    /// was replaced.
    pub fn insert(&mut self, device: Device) -> bool {
        let uri = device.artifact_uri().to_string();
        self.devices.insert(uri, RwLock::new(device)).is_none()
    }

    pub fn contains(&self, artifact_uri: &str) -> bool {
        self.devices.contains_key(artifact_uri)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn artifact_uris(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(|k| k.as_str())
    }

    /// Run `f` under the device's read lock.
    pub fn read<T>(&self, artifact_uri: &str, f: impl FnOnce(&Device) -> T) -> Result<T, StoreError> {
        let lock = self
            .devices
            .get(artifact_uri)
            .ok_or_else(|| StoreError::NotFound(artifact_uri.to_string()))?;
        let guard = lock.read().map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(f(&guard))
    }

    /// Run `f` under the device's write lock.
    pub fn write<T>(&self, artifact_uri: &str, f: impl FnOnce(&mut Device) -> T) -> Result<T, StoreError> {
        let lock = self
            .devices
            .get(artifact_uri)
            .ok_or_else(|| StoreError::NotFound(artifact_uri.to_string()))?;
        let mut guard = lock.write().map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(f(&mut guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::value::{PropertyMap, PropertyValue};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn counter(uri: &str) -> Device {
        let kind = Arc::new(DeviceKind::new("Counter").handler("bump", |state, _| {
            let n = state.get("n").and_then(PropertyValue::as_i64).unwrap_or(0);
            state.insert("n".into(), PropertyValue::Integer(n + 1));
            Ok(())
        }));
        let mut snapshot = PropertyMap::new();
        snapshot.insert("n".into(), PropertyValue::Integer(0));
        let enabled: BTreeSet<String> = ["bump".to_string()].into_iter().collect();
        Device::new(uri, kind, snapshot, enabled).0
    }

    #[test]
    fn test_read_write() {
        let mut store = DeviceStore::new();
        assert!(store.insert(counter("urn:a")));
        store
            .write("urn:a", |d| d.apply("bump", &PropertyMap::new()))
            .unwrap()
            .unwrap();
        let n = store.read("urn:a", |d| d.read("n")).unwrap();
        assert_eq!(n, Some(PropertyValue::Integer(1)));
    }

    #[test]
    fn test_missing_device() {
        let store = DeviceStore::new();
        let err = store.read("urn:none", |_| ()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_concurrent_writes_are_serialised() {
        let mut store = DeviceStore::new();
        store.insert(counter("urn:a"));
        store.insert(counter("urn:b"));
        std::thread::scope(|s| {
            for i in 0..8 {
                let store = &store;
                let uri = if i % 2 == 0 { "urn:a" } else { "urn:b" };
                s.spawn(move || {
                    for _ in 0..100 {
                        store
                            .write(uri, |d| d.apply("bump", &PropertyMap::new()))
                            .unwrap()
                            .unwrap();
                    }
                });
            }
        });
        for uri in ["urn:a", "urn:b"] {
            let n = store.read(uri, |d| d.read("n")).unwrap();
            assert_eq!(n, Some(PropertyValue::Integer(400)));
        }
    }
}
