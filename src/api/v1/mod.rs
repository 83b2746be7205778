mod cookies;
mod error;
mod guard;
mod handler;
mod router;

pub use cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use error::{ApiErrorCode, recover_error};
pub use guard::{looks_like_signed_token, with_principal};
pub use handler::{ApiResponse, CallbackQuery, complete_login, refresh, session};
pub use router::routes;
