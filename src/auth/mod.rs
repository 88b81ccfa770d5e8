//! Authentication: password hashing, JWT pair, session cookies, auth endpoints.

mod cookies;
mod handlers;
mod jwt;
mod password;

pub use cookies::{clear_session_cookies, set_session_cookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use handlers::{change_password, login, logout, refresh_token, register};
pub use jwt::{AccessClaims, RefreshClaims, TokenConfig, TokenError, TokenPair, TokenService};
pub use password::{validate_email, Passwords};
