use crate::error::AppError;
use crate::handlers::{AuthResponse, Credentials};
use crate::models::ResponseEvent;
use crate::repositories::UserRepository;
use crate::state::{AppState, release};

/// ログインリクエスト
#[derive(Debug)]
pub struct LoginRequest {
    /// 正規化済みメールアドレス
    pub email: String,
    pub password: String,
}

impl From<Credentials> for LoginRequest {
    fn from(credentials: Credentials) -> Self {
        Self {
            email: credentials.normalized_email(),
            password: credentials.password,
        }
    }
}

/// ログイン
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. ユーザー認証（DB照合）
/// 3. ユーザー情報を返却
pub async fn login(state: &AppState, credentials: Credentials) -> Result<ResponseEvent, AppError> {
    let request = LoginRequest::from(credentials);

    // 1. リクエストバリデーション
    validate_login_request(&request)?;

    // 2. ユーザー認証（DB照合）
    let mut conn = state.connect().await?;
    let result = {
        let mut user_repo = UserRepository::new(&mut conn);
        state
            .auth_service
            .authenticate(&mut user_repo, &request.email, &request.password)
            .await
    };
    release(conn).await;
    let user = result?;

    // 3. ユーザー情報を返却
    Ok(ResponseEvent::json(
        200,
        &AuthResponse {
            success: true,
            user,
        },
    ))
}

/// ログインリクエストのバリデーション
///
/// 長さは登録時のみ検査する。
fn validate_login_request(request: &LoginRequest) -> Result<(), AppError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email и пароль обязательны".to_string(),
        ));
    }
    Ok(())
}
