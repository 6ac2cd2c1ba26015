use crate::error::AppError;
use crate::models::User;
use crate::repositories::UserRepository;
use crate::services::password::PasswordScheme;

/// 認証サービス
#[derive(Debug, Clone, Copy)]
pub struct AuthService {
    scheme: PasswordScheme,
}

impl AuthService {
    pub fn new(scheme: PasswordScheme) -> Self {
        Self { scheme }
    }

    /// ユーザー認証を実行
    ///
    /// `email` は正規化済みであること。
    /// 決定的方式は SQL でハッシュを照合し、ソルト付き方式は行を取得してから照合する。
    pub async fn authenticate(
        &self,
        user_repo: &mut UserRepository<'_>,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let user = if self.scheme.is_deterministic() {
            let password_hash = self.scheme.hash(password)?;
            user_repo.find_by_credentials(email, &password_hash).await?
        } else {
            match user_repo.find_credentials_by_email(email).await? {
                Some(credentials) => self
                    .scheme
                    .verify(password, &credentials.password_hash)?
                    .then(|| User::from(credentials)),
                None => None,
            }
        };

        match user {
            Some(user) => {
                tracing::info!(user_id = user.id, "認証成功");
                Ok(user)
            }
            None => {
                tracing::warn!(email = %email, "認証失敗");
                Err(AppError::Authentication)
            }
        }
    }
}
