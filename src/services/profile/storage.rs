//! Profile persistence port and adapters.
//!
//! The engine treats profile storage as an external collaborator behind
//! the [`ProfileStorage`] trait: `load` returning absent is a valid empty
//! profile, never an error. Two adapters ship with the crate: an
//! in-process map for tests and embedders without infrastructure, and a
//! Redis adapter for shared deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use tracing::debug;
use uuid::Uuid;

use super::{AffinityProfile, ProfileError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    /// Load a viewer's profile. `Ok(None)` means no profile exists yet.
    async fn load(&self, viewer_id: Uuid) -> Result<Option<AffinityProfile>>;

    /// Persist a viewer's profile, replacing any previous version.
    async fn save(&self, viewer_id: Uuid, profile: &AffinityProfile) -> Result<()>;
}

/// In-process storage backed by a concurrent map. Saves are atomic
/// per-entry replacements.
#[derive(Debug, Default)]
pub struct MemoryProfileStorage {
    profiles: DashMap<Uuid, AffinityProfile>,
}

impl MemoryProfileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStorage for MemoryProfileStorage {
    async fn load(&self, viewer_id: Uuid) -> Result<Option<AffinityProfile>> {
        Ok(self.profiles.get(&viewer_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, viewer_id: Uuid, profile: &AffinityProfile) -> Result<()> {
        self.profiles.insert(viewer_id, profile.clone());
        Ok(())
    }
}

/// Redis-backed storage. Profiles are stored as JSON under
/// `{prefix}:{viewer_id}`, optionally with a TTL.
pub struct RedisProfileStorage {
    redis: redis::Client,
    key_prefix: String,
    ttl_secs: Option<u64>,
}

impl RedisProfileStorage {
    pub fn new(redis: redis::Client) -> Self {
        Self {
            redis,
            key_prefix: "ranking:profile".to_string(),
            ttl_secs: None,
        }
    }

    /// Expire stored profiles after `ttl_secs` of inactivity.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn profile_key(&self, viewer_id: Uuid) -> String {
        format!("{}:{}", self.key_prefix, viewer_id)
    }
}

#[async_trait]
impl ProfileStorage for RedisProfileStorage {
    async fn load(&self, viewer_id: Uuid) -> Result<Option<AffinityProfile>> {
        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ProfileError::Storage(e.to_string()))?;

        let raw: Option<String> = conn
            .get(self.profile_key(viewer_id))
            .await
            .map_err(|e| ProfileError::Storage(e.to_string()))?;

        match raw {
            Some(json) => {
                let profile = serde_json::from_str(&json)
                    .map_err(|e| ProfileError::Serialization(e.to_string()))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, viewer_id: Uuid, profile: &AffinityProfile) -> Result<()> {
        let json = serde_json::to_string(profile)
            .map_err(|e| ProfileError::Serialization(e.to_string()))?;

        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ProfileError::Storage(e.to_string()))?;

        let key = self.profile_key(viewer_id);
        match self.ttl_secs {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(&key, json, ttl)
                    .await
                    .map_err(|e| ProfileError::Storage(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(&key, json)
                    .await
                    .map_err(|e| ProfileError::Storage(e.to_string()))?;
            }
        }

        debug!(viewer_id = %viewer_id, key = %key, "Profile persisted");
        Ok(())
    }
}
