pub mod login;
pub mod register;
pub mod users;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use crate::error::AppError;
use crate::models::{RequestContext, RequestEvent, ResponseEvent, User};
use crate::state::AppState;

pub use login::login;
pub use register::register;
pub use users::list_users;

/// POST ボディの email / password
///
/// `action` など他のフィールドは無視する。
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// 前後の空白を除去し小文字化した email
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// 登録・ログイン成功時のレスポンス
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
}

/// 関数のエントリーポイント
///
/// メソッドで分岐し、POST はさらに `action` で分岐する。
pub async fn handle(
    state: &AppState,
    event: RequestEvent,
    context: RequestContext,
) -> ResponseEvent {
    let span = tracing::info_span!(
        "invoke",
        request_id = %context.request_id,
        function_name = %context.function_name,
        method = %event.http_method,
    );

    async move {
        let result = match event.http_method.as_str() {
            "OPTIONS" => return ResponseEvent::preflight(),
            "POST" => dispatch_action(state, event.body.as_deref()).await,
            "GET" => list_users(state).await,
            _ => Err(AppError::MethodNotAllowed),
        };

        let response = result.unwrap_or_else(AppError::into_response_event);
        tracing::info!(status = response.status_code, "レスポンス返却");
        response
    }
    .instrument(span)
    .await
}

/// POST ボディを解析して `action` ごとの処理へ振り分ける
///
/// `null` ボディはパース不能として 500 にする。
async fn dispatch_action(state: &AppState, body: Option<&str>) -> Result<ResponseEvent, AppError> {
    let body = body.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("request body must be a JSON string, not null"))
    })?;
    let payload: Value = serde_json::from_str(body)?;
    let action = match &payload {
        Value::Object(fields) => fields.get("action").and_then(Value::as_str),
        _ => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "request body must be a JSON object"
            )));
        }
    };

    match action {
        Some("register") => {
            let credentials = Credentials::deserialize(&payload)?;
            register(state, credentials).await
        }
        Some("login") => {
            let credentials = Credentials::deserialize(&payload)?;
            login(state, credentials).await
        }
        _ => Err(AppError::UnknownAction),
    }
}
