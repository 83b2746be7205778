use crate::domain_model::PrincipalId;
use crate::domain_port::{CacheError, CredentialCache, TakeOutcome, cache_key};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const REFRESH_CONSUME: &str = include_str!("refresh_consume.lua");

pub struct RedisCredentialCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisCredentialCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisCredentialCache {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, principal: &PrincipalId) -> String {
        cache_key(&self.prefix, principal)
    }
}

#[async_trait::async_trait]
impl CredentialCache for RedisCredentialCache {
    async fn put(
        &self,
        principal: &PrincipalId,
        token: &str,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let key = self.key(principal);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, token, ttl_secs)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, principal: &PrincipalId) -> Result<Option<String>, CacheError> {
        let key = self.key(principal);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn take_if_match(
        &self,
        principal: &PrincipalId,
        presented: &str,
    ) -> Result<TakeOutcome, CacheError> {
        let key = self.key(principal);
        let mut conn = self.conn.clone();
        // the script runs GET, compare and DEL as one unit on the server,
        // so racing rotations for a principal serialize on this key
        let script = Script::new(REFRESH_CONSUME);
        let status: i64 = script
            .key(&key)
            .arg(presented)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;

        match status {
            1 => Ok(TakeOutcome::Consumed),
            0 => Ok(TakeOutcome::Mismatch),
            -1 => Ok(TakeOutcome::Missing),
            other => Err(CacheError::Store(format!(
                "unknown consume script status {other}"
            ))),
        }
    }
}
