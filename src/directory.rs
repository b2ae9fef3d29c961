use crate::error::RelayResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::warn;

/// A reminder recipient and its subscription flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: i64,
    pub subscribed: bool,
}

/// Boundary trait for the subscriber list. The directory is owned by
/// the surrounding system (command handling, administration); the
/// scheduler only reads an atomic snapshot per tick.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Recipients currently subscribed to reminders
    async fn list_subscribed(&self) -> RelayResult<Vec<Subscriber>>;
}

/// File-backed directory mapping recipient ids to subscription flags,
/// stored as a `{ "<id>" = <bool> }` TOML table
pub struct TomlDirectory {
    path: PathBuf,
    subscribers: RwLock<HashMap<i64, bool>>,
}

impl TomlDirectory {
    /// Load the directory from file. A missing file is an empty
    /// directory, not an error.
    pub fn load(path: &str) -> RelayResult<Self> {
        let mut subscribers = HashMap::new();

        if let Ok(content) = fs::read_to_string(path) {
            let parsed: HashMap<String, bool> = toml::from_str(&content)?;
            for (key, value) in parsed {
                match key.parse::<i64>() {
                    Ok(id) => {
                        subscribers.insert(id, value);
                    }
                    Err(_) => warn!("Ignoring subscriber entry with non-numeric id: {}", key),
                }
            }
        } else {
            warn!("Subscriber file {} not found, starting empty", path);
        }

        Ok(Self {
            path: PathBuf::from(path),
            subscribers: RwLock::new(subscribers),
        })
    }

    /// Update one recipient's subscription flag and persist the list
    #[allow(dead_code)]
    pub async fn set_subscribed(&self, id: i64, subscribed: bool) -> RelayResult<()> {
        let snapshot = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, subscribed);
            subscribers.clone()
        };
        self.save(&snapshot)
    }

    /// Save the subscriber list back to file
    #[allow(dead_code)]
    fn save(&self, subscribers: &HashMap<i64, bool>) -> RelayResult<()> {
        let by_key: HashMap<String, bool> = subscribers
            .iter()
            .map(|(id, subscribed)| (id.to_string(), *subscribed))
            .collect();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_str = toml::to_string(&by_key)?;
        fs::write(&self.path, toml_str)?;

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for TomlDirectory {
    async fn list_subscribed(&self) -> RelayResult<Vec<Subscriber>> {
        let subscribers = self.subscribers.read().await;
        let mut subscribed: Vec<Subscriber> = subscribers
            .iter()
            .filter(|(_, &flag)| flag)
            .map(|(&id, &flag)| Subscriber {
                id,
                subscribed: flag,
            })
            .collect();
        subscribed.sort_by_key(|subscriber| subscriber.id);
        Ok(subscribed)
    }
}
