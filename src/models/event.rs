use std::collections::{BTreeMap, HashMap};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// 関数に渡されるリクエストイベント
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    #[serde(default = "default_method")]
    pub http_method: String,
    /// キーなしは `"{}"`、明示的な `null` は `None`
    #[serde(default = "default_body")]
    pub body: Option<String>,
    /// 現行ロジックでは未使用
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_body() -> Option<String> {
    Some("{}".to_string())
}

impl RequestEvent {
    pub fn new(http_method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            http_method: http_method.into(),
            body,
            query_string_parameters: None,
        }
    }
}

/// リクエストコンテキスト（トレース用の識別子のみ）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub request_id: String,
    pub function_name: String,
}

/// 関数が返すレスポンスレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ResponseEvent {
    /// JSON ボディ付きレスポンス
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        // Value / 派生 Serialize の構造体はシリアライズに失敗しない
        let body = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
        Self {
            status_code,
            headers: json_headers(),
            body,
            is_base64_encoded: false,
        }
    }

    /// CORS プリフライト応答
    pub fn preflight() -> Self {
        let headers = [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type, X-User-Id"),
            ("Access-Control-Max-Age", "86400"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// ボディを JSON として読む（テスト・呼び出し側の検証用）
    pub fn json_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
    ])
}

/// ローカル起動時に HTTP レスポンスへ変換する
impl IntoResponse for ResponseEvent {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "不正なヘッダーを破棄"),
            }
        }

        response
    }
}
