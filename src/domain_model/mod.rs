mod principal;
mod token;

pub use principal::*;
pub use token::*;
