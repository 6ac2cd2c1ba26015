use serde::Serialize;

use crate::models::ResponseEvent;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Пользователь с таким email уже существует")]
    EmailAlreadyExists,

    #[error("Неверный email или пароль")]
    Authentication,

    #[error("Неизвестное действие")]
    UnknownAction,

    #[error("Метод не поддерживается")]
    MethodNotAllowed,

    #[error(transparent)]
    InvalidBody(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::EmailAlreadyExists | Self::UnknownAction => 400,
            Self::Authentication => 401,
            Self::MethodNotAllowed => 405,
            Self::InvalidBody(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// `{"error": ...}` 形式のレスポンスへ変換
    ///
    /// 5xx はエラー文字列をそのまま返す（既存クライアントの互換のため）。
    pub fn into_response_event(self) -> ResponseEvent {
        let status = self.status_code();
        match &self {
            Self::InvalidBody(e) => tracing::error!(error = ?e, "リクエストボディのパースに失敗"),
            Self::Database(e) => tracing::error!(error = ?e, "データベースエラー"),
            Self::Internal(e) => tracing::error!(error = ?e, "内部エラー"),
            other => tracing::warn!(status, error = %other, "リクエスト拒否"),
        }

        ResponseEvent::json(
            status,
            &ErrorResponse {
                error: self.to_string(),
            },
        )
    }

    /// UNIQUE 制約違反（email 重複）かどうか
    pub fn is_unique_violation(e: &sqlx::Error) -> bool {
        match e {
            sqlx::Error::Database(db_err) => {
                db_err.constraint() == Some("users_email_key")
                    || db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}
