//! DB を使う登録・ログイン・一覧のフロー
//!
//! `DATABASE_URL` が必要なため `#[ignore]` 付き。
//! 実行: `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::collections::HashMap;

use authfn::{
    config::Config,
    handlers::handle,
    models::{RequestContext, RequestEvent, ResponseEvent},
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

/// `created_at` 列の型ごとにスキーマを分ける
#[derive(Debug, Clone, Copy)]
enum CreatedAtColumn {
    /// `TIMESTAMPTZ DEFAULT NOW()`
    Zoned,
    /// `TIMESTAMP DEFAULT CURRENT_TIMESTAMP`
    Naive,
}

impl CreatedAtColumn {
    fn schema(self) -> &'static str {
        match self {
            Self::Zoned => "authfn_zoned",
            Self::Naive => "authfn_naive",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Zoned => "TIMESTAMPTZ NOT NULL DEFAULT NOW()",
            Self::Naive => "TIMESTAMP DEFAULT CURRENT_TIMESTAMP",
        }
    }
}

async fn prepare_schema(database_url: &str, column: CreatedAtColumn) {
    let mut conn = PgConnection::connect(database_url).await.unwrap();
    // 並列実行時の CREATE 競合を避ける
    sqlx::query("SELECT pg_advisory_lock(727001)")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", column.schema()))
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.users (
            id SERIAL PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password TEXT NOT NULL,
            created_at {}
        )
        "#,
        column.schema(),
        column.column()
    ))
    .execute(&mut conn)
    .await
    .unwrap();
    sqlx::query("SELECT pg_advisory_unlock(727001)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}

/// 接続 URL に search_path を付けて対象スキーマの `users` を使わせる
fn with_search_path(database_url: &str, schema: &str) -> String {
    let separator = if database_url.contains('?') { '&' } else { '?' };
    format!("{database_url}{separator}options=-c%20search_path%3D{schema}")
}

async fn test_state(scheme: &str, column: CreatedAtColumn) -> AppState {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for store-backed tests");
    prepare_schema(&database_url, column).await;

    let config = Config::from_iter([
        (
            "DATABASE_URL".to_string(),
            with_search_path(&database_url, column.schema()),
        ),
        ("PASSWORD_SCHEME".to_string(), scheme.to_string()),
    ])
    .unwrap();
    AppState::new(config)
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4().simple())
}

async fn post(state: &AppState, body: Value) -> (ResponseEvent, Value) {
    let event = RequestEvent::new("POST", Some(body.to_string()));
    let response = handle(state, event, RequestContext::default()).await;
    let body = response.json_body().unwrap();
    (response, body)
}

async fn list(state: &AppState) -> (ResponseEvent, Value) {
    let event = RequestEvent::new("GET", None);
    let response = handle(state, event, RequestContext::default()).await;
    let body = response.json_body().unwrap();
    (response, body)
}

async fn register(state: &AppState, email: &str, password: &str) -> (ResponseEvent, Value) {
    post(
        state,
        json!({"action": "register", "email": email, "password": password}),
    )
    .await
}

async fn login(state: &AppState, email: &str, password: &str) -> (ResponseEvent, Value) {
    post(
        state,
        json!({"action": "login", "email": email, "password": password}),
    )
    .await
}

async fn register_login_scenario(column: CreatedAtColumn) {
    let state = test_state("sha256", column).await;
    let email = unique_email();
    let mixed_case = format!("  {} ", email.to_uppercase());

    let (response, body) = register(&state, &mixed_case, "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.as_str());
    let id = body["user"]["id"].as_i64().unwrap();
    let created_at = body["user"]["created_at"].as_str().unwrap().to_string();
    assert!(created_at.contains('T'));

    let (response, body) = login(&state, &format!("{} ", email), "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(body["user"]["id"].as_i64().unwrap(), id);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["created_at"], created_at.as_str());

    let (response, body) = login(&state, &email, "wrong").await;
    assert_eq!(response.status_code, 401);
    assert_eq!(body["error"], "Неверный email или пароль");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_login_scenario() {
    register_login_scenario(CreatedAtColumn::Zoned).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_login_scenario_with_naive_timestamp() {
    register_login_scenario(CreatedAtColumn::Naive).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_naive_timestamp_has_no_offset() {
    let state = test_state("sha256", CreatedAtColumn::Naive).await;
    let email = unique_email();

    let (response, body) = register(&state, &email, "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    let created_at = body["user"]["created_at"].as_str().unwrap();
    assert!(!created_at.ends_with('Z'), "{created_at}");
    assert!(!created_at.contains('+'), "{created_at}");

    let (response, body) = list(&state).await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    let listed = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == email.as_str())
        .unwrap();
    assert_eq!(listed["created_at"], created_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_login_unknown_email() {
    let state = test_state("sha256", CreatedAtColumn::Zoned).await;

    let (response, _) = login(&state, &unique_email(), "secret").await;
    assert_eq!(response.status_code, 401);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_registration_ignores_case_and_whitespace() {
    let state = test_state("sha256", CreatedAtColumn::Zoned).await;
    let email = unique_email();

    let (response, _) = register(&state, &email, "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);

    let (response, body) = register(&state, &format!(" {}", email.to_uppercase()), "другой").await;
    assert_eq!(response.status_code, 400);
    assert_eq!(body["error"], "Пользователь с таким email уже существует");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_password_length_boundary() {
    let state = test_state("sha256", CreatedAtColumn::Zoned).await;

    let (response, _) = register(&state, &unique_email(), "12345").await;
    assert_eq!(response.status_code, 400);

    let (response, _) = register(&state, &unique_email(), "123456").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_users_newest_first_with_passwords() {
    let state = test_state("sha256", CreatedAtColumn::Zoned).await;
    let older = unique_email();
    let newer = unique_email();

    let (response, _) = register(&state, &older, "first-secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    let (response, _) = register(&state, &newer, "second-secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);

    let (response, body) = list(&state).await;
    assert_eq!(response.status_code, 200);
    let users = body["users"].as_array().unwrap();

    let position = |email: &str| users.iter().position(|u| u["email"] == email).unwrap();
    assert!(position(newer.as_str()) < position(older.as_str()));
    assert_eq!(users[position(older.as_str())]["password"], "first-secret");
    assert_eq!(users[position(newer.as_str())]["password"], "second-secret");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_argon2_scheme_flow() {
    let state = test_state("argon2", CreatedAtColumn::Zoned).await;
    let email = unique_email();

    let (response, body) = register(&state, &email, "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    let id = body["user"]["id"].as_i64().unwrap();

    let (response, body) = login(&state, &email, "secret").await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(body["user"]["id"].as_i64().unwrap(), id);

    let (response, _) = login(&state, &email, "wrong").await;
    assert_eq!(response.status_code, 401);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_registration_single_winner() {
    const CONCURRENT: usize = 8;
    let state = test_state("sha256", CreatedAtColumn::Zoned).await;

    for round in 0..5 {
        let email = unique_email();
        let tasks: Vec<_> = (0..CONCURRENT)
            .map(|_| {
                let state = state.clone();
                let email = email.clone();
                tokio::spawn(async move { register(&state, &email, "secret").await })
            })
            .collect();

        let mut statuses: HashMap<u16, usize> = HashMap::new();
        for task in tasks {
            let (response, body) = task.await.unwrap();
            if response.status_code == 400 {
                assert_eq!(body["error"], "Пользователь с таким email уже существует");
            }
            *statuses.entry(response.status_code).or_default() += 1;
        }

        println!("[<] round {round}: {statuses:?}");
        assert_eq!(statuses.get(&200), Some(&1), "round {round}: {statuses:?}");
        assert_eq!(
            statuses.get(&400),
            Some(&(CONCURRENT - 1)),
            "round {round}: {statuses:?}"
        );
    }
}
