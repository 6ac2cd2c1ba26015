use sqlx::{Connection, PgConnection};

use crate::error::AppError;
use crate::handlers::{AuthResponse, Credentials};
use crate::models::{ResponseEvent, User};
use crate::repositories::UserRepository;
use crate::state::{AppState, release};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl From<Credentials> for RegisterRequest {
    fn from(credentials: Credentials) -> Self {
        Self {
            email: credentials.normalized_email(),
            password: credentials.password,
        }
    }
}

/// ユーザー登録
///
/// # Security
/// - パスワードはログに出力しない
/// - 平文パスワードも保存される（一覧 API の互換のため）
pub async fn register(
    state: &AppState,
    credentials: Credentials,
) -> Result<ResponseEvent, AppError> {
    let request = RegisterRequest::from(credentials);

    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = state.password_scheme().hash(&request.password)?;

    let mut conn = state.connect().await?;
    let result = create_user(&mut conn, &request, &password_hash).await;
    release(conn).await;
    let user = result?;

    tracing::info!(user_id = user.id, email = %user.email, "ユーザー登録成功");

    Ok(ResponseEvent::json(
        200,
        &AuthResponse {
            success: true,
            user,
        },
    ))
}

/// トランザクション内で重複確認と作成を行う（失敗時はロールバック）
async fn create_user(
    conn: &mut PgConnection,
    request: &RegisterRequest,
    password_hash: &str,
) -> Result<User, AppError> {
    let mut tx = conn.begin().await?;

    match insert_new_user(&mut tx, request, password_hash).await {
        Ok(user) => {
            tx.commit().await?;
            Ok(user)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = ?rollback_err, "ロールバックに失敗");
            }
            Err(e)
        }
    }
}

async fn insert_new_user(
    conn: &mut PgConnection,
    request: &RegisterRequest,
    password_hash: &str,
) -> Result<User, AppError> {
    let mut user_repo = UserRepository::new(conn);

    if user_repo.exists_by_email(&request.email).await? {
        return Err(AppError::EmailAlreadyExists);
    }

    // 確認と挿入の間に別リクエストが登録した場合は UNIQUE 制約で弾かれる
    user_repo
        .create_user(&request.email, password_hash, &request.password)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email и пароль обязательны".to_string(),
        ));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(
            "Пароль должен быть минимум 6 символов".to_string(),
        ));
    }
    Ok(())
}
