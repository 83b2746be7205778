mod credential_cache_redis;

pub use credential_cache_redis::*;
