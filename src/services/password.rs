use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// パスワードダイジェスト方式
///
/// - `Sha256`: ソルトなし SHA-256（16進小文字）。ログイン照合は SQL 側で行う。
/// - `Argon2`: argon2id の PHC 文字列。ソルト付きのためログイン照合はアプリ側で行う。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    #[default]
    Sha256,
    Argon2,
}

impl PasswordScheme {
    /// SQL の等値比較でログイン照合できるか
    pub fn is_deterministic(self) -> bool {
        matches!(self, Self::Sha256)
    }

    /// パスワードをハッシュ化
    pub fn hash(self, password: &str) -> Result<String, AppError> {
        match self {
            Self::Sha256 => Ok(sha256_hex(password)),
            Self::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| {
                        tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
                        AppError::Internal(anyhow::anyhow!("password hash error"))
                    })?;
                Ok(hash.to_string())
            }
        }
    }

    /// 保存済みハッシュとパスワードを照合
    pub fn verify(self, password: &str, stored: &str) -> Result<bool, AppError> {
        match self {
            Self::Sha256 => Ok(sha256_hex(password) == stored),
            Self::Argon2 => {
                let parsed = PasswordHash::new(stored).map_err(|e| {
                    tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
                    AppError::Internal(anyhow::anyhow!("password hash parse error"))
                })?;
                Ok(Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok())
            }
        }
    }
}

fn sha256_hex(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
