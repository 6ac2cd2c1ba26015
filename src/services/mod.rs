pub mod auth;
pub mod password;

pub use auth::AuthService;
pub use password::PasswordScheme;
