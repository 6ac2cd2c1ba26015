use serde::Serialize;
use sqlx::FromRow;

use crate::models::Timestamp;

/// 登録・ログイン応答で返すユーザー
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub created_at: Timestamp,
}

/// argon2 方式のログイン照合用（ハッシュはシリアライズしない）
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl From<UserCredentials> for User {
    fn from(credentials: UserCredentials) -> Self {
        Self {
            id: credentials.id,
            email: credentials.email,
            created_at: credentials.created_at,
        }
    }
}

/// ユーザー一覧の1行
///
/// # Security
/// 平文パスワードを含む。既存クライアントとの互換のためだけに残している。
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserListing {
    pub id: i32,
    pub email: String,
    pub password: String,
    pub created_at: Timestamp,
}
