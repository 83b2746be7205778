mod credential_cache_memory;
mod identity_fake;
mod token_codec_hs256;
mod token_service_fake;
mod token_service_impl;

pub use credential_cache_memory::*;
pub use identity_fake::*;
pub use token_codec_hs256::*;
pub use token_service_fake::*;
pub use token_service_impl::*;
