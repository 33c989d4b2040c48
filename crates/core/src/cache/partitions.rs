//! Partition naming and partition-level store operations.
//!
//! Every generation owns four partitions named `{prefix}-{kind}-{generation}`,
//! e.g. `lombasku-static-v3`. Anything else found in the store belongs to a
//! previous generation and is removed on activation.

use std::fmt;

use super::connection::CacheStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Resource class a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Critical assets, documents, styles and scripts.
    Static,
    /// Default-strategy responses and backend-service calls.
    Dynamic,
    Images,
    /// Same-origin API responses.
    Api,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 4] =
        [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Images, PartitionKind::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Images => "images",
            PartitionKind::Api => "api",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four partition names of one cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    generation: String,
    names: [String; 4],
}

impl CacheNames {
    pub fn new(prefix: &str, generation: &str) -> Self {
        let names = PartitionKind::ALL.map(|kind| format!("{prefix}-{}-{generation}", kind.as_str()));
        Self { generation: generation.to_string(), names }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn name(&self, kind: PartitionKind) -> &str {
        let idx = PartitionKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        &self.names[idx]
    }

    /// Whether `name` is one of this generation's partitions.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl CacheStore {
    /// Open a partition, creating it if it doesn't exist.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a partition with this name exists.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and all of its entries.
    ///
    /// Returns false if no such partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition regardless of generation.
    ///
    /// Returns the number of partitions removed.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM partitions", [])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a partition.
    pub async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_names_v3() {
        let names = CacheNames::new("lombasku", "v3");
        assert_eq!(names.name(PartitionKind::Static), "lombasku-static-v3");
        assert_eq!(names.name(PartitionKind::Dynamic), "lombasku-dynamic-v3");
        assert_eq!(names.name(PartitionKind::Images), "lombasku-images-v3");
        assert_eq!(names.name(PartitionKind::Api), "lombasku-api-v3");
        assert_eq!(names.generation(), "v3");
    }

    #[test]
    fn test_cache_names_contains() {
        let names = CacheNames::new("lombasku", "v3");
        assert!(names.contains("lombasku-images-v3"));
        assert!(!names.contains("lombasku-images-v2"));
        assert!(!names.contains("other-static-v3"));
        assert_eq!(names.iter().count(), 4);
    }

    #[tokio::test]
    async fn test_open_is_idempotent_and_ordered() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.open_partition("b").await.unwrap();
        store.open_partition("a").await.unwrap();
        store.open_partition("b").await.unwrap();

        assert_eq!(store.partition_names().await.unwrap(), vec!["b", "a"]);
        assert!(store.has_partition("a").await.unwrap());
        assert!(!store.has_partition("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.open_partition("old").await.unwrap();

        assert!(store.delete_partition("old").await.unwrap());
        assert!(!store.delete_partition("old").await.unwrap());
        assert!(store.partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.open_partition("lombasku-static-v2").await.unwrap();
        store.open_partition("lombasku-static-v3").await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.partition_names().await.unwrap().is_empty());
    }
}
