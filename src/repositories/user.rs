use sqlx::PgConnection;

use crate::models::{User, UserCredentials, UserListing};

/// リクエスト単位のコネクション（またはトランザクション）上で動くユーザーリポジトリ
pub struct UserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// メールアドレスが登録済みか
    pub async fn exists_by_email(&mut self, email: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.is_some())
    }

    /// 新しいユーザーを作成
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   呼び出し側で `AppError::EmailAlreadyExists` に変換すること
    pub async fn create_user(
        &mut self,
        email: &str,
        password_hash: &str,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, password)
            VALUES ($1, $2, $3)
            RETURNING id, email, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(password)
        .fetch_one(&mut *self.conn)
        .await
    }

    /// メールアドレスとハッシュの組でユーザーを検索（決定的ハッシュ方式用）
    pub async fn find_by_credentials(
        &mut self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, created_at
            FROM users
            WHERE email = $1 AND password_hash = $2
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// メールアドレスでハッシュ付きのユーザーを検索（ソルト付き方式用）
    pub async fn find_credentials_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// 全ユーザーを作成日時の降順で取得
    pub async fn list_all(&mut self) -> Result<Vec<UserListing>, sqlx::Error> {
        sqlx::query_as::<_, UserListing>(
            r#"
            SELECT id, email, password, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await
    }
}
