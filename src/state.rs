use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::{Connection, PgConnection};

use crate::config::Config;
use crate::error::AppError;
use crate::services::{AuthService, PasswordScheme};

/// 関数の実行コンテキスト
///
/// 起動時に一度だけ設定から構築し、全呼び出しで共有する。
/// 呼び出し間で共有する可変状態は持たない。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 認証サービス
    pub auth_service: AuthService,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(config: Config) -> Self {
        let auth_service = AuthService::new(config.password_scheme);
        Self {
            config: Arc::new(config),
            auth_service,
        }
    }

    pub fn password_scheme(&self) -> PasswordScheme {
        self.config.password_scheme
    }

    /// リクエスト単位のコネクションを開く
    ///
    /// 呼び出し側は全ての終了経路で [`release`] すること。
    pub async fn connect(&self) -> Result<PgConnection, AppError> {
        let conn = PgConnection::connect(self.config.database_url.expose_secret()).await?;
        tracing::debug!("データベース接続完了");
        Ok(conn)
    }
}

/// コネクションを閉じる（失敗はログのみ）
pub async fn release(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::warn!(error = ?e, "データベース切断に失敗");
    }
}
