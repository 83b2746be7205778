mod credential_cache;

pub use credential_cache::*;
