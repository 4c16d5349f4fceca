//! Redis-backed cache store.
//!
//! Every key is stored as `<prefix>:<key>` so several deployments can share
//! one Redis database. Prefix deletion walks the keyspace with `SCAN MATCH`
//! and removes matches in batches; Redis expires entries natively.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::CacheError;
use crate::store::CacheStore;

/// Keys requested per `SCAN` round trip and removed per `DEL`.
const SCAN_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisStore {
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            namespace: format!("{key_prefix}:"),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let keys = self.scan(pattern).await?;
        let mut conn = self.conn.clone();
        let mut removed = 0u64;
        for chunk in keys.chunks(SCAN_BATCH) {
            let n: u64 = conn.del(chunk.to_vec()).await?;
            removed += n;
        }
        Ok(removed)
    }

    fn pattern_for(&self, prefix: &str) -> String {
        format!("{}{}*", escape_glob(&self.namespace), escape_glob(prefix))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(self.full_key(key), value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(self.full_key(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_matching(&self, prefix: &str) -> Result<u64, CacheError> {
        self.delete_pattern(&self.pattern_for(prefix)).await
    }

    async fn clear_all(&self) -> Result<u64, CacheError> {
        self.delete_pattern(&self.pattern_for("")).await
    }

    async fn purge_expired(&self) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn len(&self) -> Result<u64, CacheError> {
        Ok(self.scan(&self.pattern_for("")).await?.len() as u64)
    }
}

/// Escape Redis glob metacharacters so `s` matches literally.
fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("beats:"), "beats:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
        assert_eq!(escape_glob("x\\y"), "x\\\\y");
    }
}
