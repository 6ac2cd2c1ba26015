use serde::Serialize;

use crate::error::AppError;
use crate::models::{ResponseEvent, UserListing};
use crate::repositories::UserRepository;
use crate::state::{AppState, release};

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserListing>,
}

/// ユーザー一覧（新しい順）
///
/// 認証・ページングなし。
pub async fn list_users(state: &AppState) -> Result<ResponseEvent, AppError> {
    let mut conn = state.connect().await?;
    let result = UserRepository::new(&mut conn).list_all().await;
    release(conn).await;
    let users = result?;

    tracing::debug!(count = users.len(), "ユーザー一覧取得");

    Ok(ResponseEvent::json(200, &UsersResponse { users }))
}
