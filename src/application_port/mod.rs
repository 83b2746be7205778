mod identity;
mod token_service;

pub use identity::*;
pub use token_service::*;
