//! Response storage and lookup.
//!
//! Entries are keyed by request identity within a partition. A put always
//! overwrites; there is no per-entry expiry.

use super::connection::CacheStore;
use super::hash::compute_request_key;
use crate::Error;
use crate::http::{Request, Response, ResponseKind};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Raw column values of a stored entry, decoded off the database thread.
struct StoredRow {
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    kind: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            status_text: row.get(1)?,
            headers_json: row.get(2)?,
            body: row.get(3)?,
            kind: row.get(4)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Response {
            status,
            status_text: self.status_text,
            headers,
            body: Bytes::from(self.body),
            kind: self.kind.parse::<ResponseKind>()?,
        })
    }
}

impl CacheStore {
    /// Store a response for a request, opening the partition if needed.
    pub async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let method = request.method.clone();
        let url = request.url.to_string();
        let key = compute_request_key(&method, &url);
        let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let status = i64::from(response.status);
        let status_text = response.status_text.clone();
        let body = response.body.to_vec();
        let kind = response.kind.as_str();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, &now],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                    partition, key_hash, method, url, status, status_text,
                    headers_json, body, kind, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(partition, key_hash) DO UPDATE SET
                    status = excluded.status,
                    status_text = excluded.status_text,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    kind = excluded.kind,
                    stored_at = excluded.stored_at",
                    params![&partition, &key, &method, &url, status, &status_text, &headers_json, &body, kind, &now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in one partition.
    pub async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let key = compute_request_key(&request.method, request.url.as_str());
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body, kind
                         FROM entries WHERE partition = ?1 AND key_hash = ?2",
                        params![partition, key],
                        StoredRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }

    /// Look up a request across every partition.
    ///
    /// Partitions are searched in creation order and the first hit wins.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_request_key(&request.method, request.url.as_str());
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body, e.kind
                         FROM entries e JOIN partitions p ON p.name = e.partition
                         WHERE e.key_hash = ?1
                         ORDER BY p.seq ASC LIMIT 1",
                        params![key],
                        StoredRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> Request {
        Request::get(url).unwrap()
    }

    #[tokio::test]
    async fn test_put_and_match_in() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://example.com/a");
        let resp = Response::ok(vec![0u8, 159, 146, 150]).with_header("Content-Type", "application/octet-stream");

        store.put("lombasku-static-v3", &req, &resp).await.unwrap();

        let hit = store.match_in("lombasku-static-v3", &req).await.unwrap().unwrap();
        assert_eq!(hit, resp);
        assert!(store.has_partition("lombasku-static-v3").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_in_other_partition_misses() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://example.com/a");
        store.put("static", &req, &Response::ok("a")).await.unwrap();

        assert!(store.match_in("dynamic", &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://example.com/a");
        store.put("static", &req, &Response::ok("old")).await.unwrap();
        store.put("static", &req, &Response::ok("new")).await.unwrap();

        let hit = store.match_in("static", &req).await.unwrap().unwrap();
        assert_eq!(hit.body_text(), "new");
        assert_eq!(store.entry_count("static").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_partition() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://example.com/a");
        store.put("first", &req, &Response::ok("first")).await.unwrap();
        store.put("second", &req, &Response::ok("second")).await.unwrap();

        let hit = store.match_any(&req).await.unwrap().unwrap();
        assert_eq!(hit.body_text(), "first");
    }

    #[tokio::test]
    async fn test_match_any_miss() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert!(store.match_any(&page("https://example.com/none")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_partition_cascades_entries() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://example.com/a");
        store.put("static", &req, &Response::ok("a")).await.unwrap();

        store.delete_partition("static").await.unwrap();
        assert!(store.match_any(&req).await.unwrap().is_none());
        assert_eq!(store.entry_count("static").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_status_text_and_kind_preserved() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = page("https://cdn.example.com/lib.js");
        let resp = Response::ok("x").with_kind(ResponseKind::Cors);
        store.put("static", &req, &resp).await.unwrap();

        let hit = store.match_in("static", &req).await.unwrap().unwrap();
        assert_eq!(hit.status_text, "OK");
        assert_eq!(hit.kind, ResponseKind::Cors);
    }
}
