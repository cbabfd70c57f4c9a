//! Device system properties
//!
//! Scenarios can change system properties for their run (for example limiting
//! the RenderScript thread pool) and must restore them afterwards. [`Device`]
//! keeps a per-property stack of saved values for that.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::{Error, Result};

/// Reads and writes system properties on a device
#[async_trait]
pub trait PropertyStore: Send {
    async fn get_prop(&mut self, name: &str) -> Result<String>;
    async fn set_prop(&mut self, name: &str, value: &str) -> Result<()>;
}

/// Property access through `adb shell`
#[derive(Debug, Clone)]
pub struct Adb {
    adb: PathBuf,
    serial: Option<String>,
}

impl Adb {
    pub fn new(adb: PathBuf, serial: Option<String>) -> Self {
        Self { adb, serial }
    }

    async fn shell(&self, args: &[&str]) -> Result<String> {
        let mut command = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
            .arg("shell")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(adb = %self.adb.display(), args = ?args, "Running adb shell");

        let output = command
            .output()
            .await
            .map_err(|e| Error::Device(format!("failed to run {}: {}", self.adb.display(), e)))?;

        if !output.status.success() {
            return Err(Error::Device(format!(
                "adb shell {} failed with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl PropertyStore for Adb {
    async fn get_prop(&mut self, name: &str) -> Result<String> {
        self.shell(&["getprop", name]).await
    }

    async fn set_prop(&mut self, name: &str, value: &str) -> Result<()> {
        // setprop rejects an empty value; the quoted pair clears the property
        let value = if value.is_empty() { "\"\"" } else { value };
        self.shell(&["setprop", name, value]).await.map(|_| ())
    }
}

/// A device whose property changes can be undone
pub struct Device {
    store: Box<dyn PropertyStore>,
    saved: HashMap<String, Vec<String>>,
}

impl Device {
    pub fn new(store: Box<dyn PropertyStore>) -> Self {
        Self {
            store,
            saved: HashMap::new(),
        }
    }

    /// Device reached through `adb`, optionally a specific serial
    pub fn adb(adb: PathBuf, serial: Option<String>) -> Self {
        Self::new(Box::new(Adb::new(adb, serial)))
    }

    /// Set `name` to `value`, remembering the current value
    pub async fn push_prop(&mut self, name: &str, value: &str) -> Result<()> {
        let current = self.store.get_prop(name).await?;
        self.store.set_prop(name, value).await?;

        tracing::info!(property = name, from = %current, to = value, "Changed device property");
        self.saved.entry(name.to_string()).or_default().push(current);
        Ok(())
    }

    /// Restore the value `name` had before the last [`Device::push_prop`]
    pub async fn pop_prop(&mut self, name: &str) -> Result<()> {
        let previous = self
            .saved
            .get_mut(name)
            .and_then(Vec::pop)
            .ok_or_else(|| Error::Device(format!("no saved value for property '{}'", name)))?;

        self.store.set_prop(name, &previous).await?;
        tracing::info!(property = name, to = %previous, "Restored device property");
        Ok(())
    }

    /// Number of saved values for `name`
    pub fn depth(&self, name: &str) -> usize {
        self.saved.get(name).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device").field("saved", &self.saved).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStore(Arc<Mutex<HashMap<String, String>>>);

    #[async_trait]
    impl PropertyStore for MemoryStore {
        async fn get_prop(&mut self, name: &str) -> Result<String> {
            Ok(self.0.lock().unwrap().get(name).cloned().unwrap_or_default())
        }

        async fn set_prop(&mut self, name: &str, value: &str) -> Result<()> {
            self.0.lock().unwrap().insert(name.to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_push_then_pop_restores_previous_values() {
        let store = MemoryStore::default();
        store
            .0
            .lock()
            .unwrap()
            .insert("debug.rs.max-threads".to_string(), "4".to_string());
        let mut device = Device::new(Box::new(store.clone()));

        device.push_prop("debug.rs.max-threads", "1").await.unwrap();
        device.push_prop("debug.rs.max-threads", "2").await.unwrap();
        assert_eq!(device.depth("debug.rs.max-threads"), 2);

        device.pop_prop("debug.rs.max-threads").await.unwrap();
        assert_eq!(store.0.lock().unwrap()["debug.rs.max-threads"], "1");

        device.pop_prop("debug.rs.max-threads").await.unwrap();
        assert_eq!(store.0.lock().unwrap()["debug.rs.max-threads"], "4");
    }

    #[tokio::test]
    async fn test_pop_without_push_fails() {
        let mut device = Device::new(Box::new(MemoryStore::default()));
        let err = device.pop_prop("debug.rs.max-threads").await.unwrap_err();
        assert!(matches!(err, Error::Device(_)));
    }
}
