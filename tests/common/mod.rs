//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;

use atheno_data::adapters::mock::{MockHttpClient, MockResponse};
use atheno_data::adapters::MemoryStorage;
use atheno_data::backend::SupabaseClient;
use atheno_data::cache::CacheStore;
use atheno_data::traits::{Headers, Response};

pub const BASE_URL: &str = "https://project.supabase.co";

pub fn supabase(http: MockHttpClient) -> SupabaseClient {
    SupabaseClient::new(BASE_URL, "anon-key", Arc::new(http))
}

pub fn cache(storage: &Arc<MemoryStorage>) -> CacheStore {
    CacheStore::new(storage.clone() as Arc<dyn atheno_data::traits::KeyValueStorage>)
}

pub fn rest_url(table: &str) -> String {
    format!("{}/rest/v1/{}", BASE_URL, table)
}

/// 200 with a JSON body.
pub fn json_ok(body: &str) -> MockResponse {
    MockResponse::Success(Response::new(200, Bytes::from(body.to_string())))
}

/// 204 with no body, the usual PATCH answer.
pub fn no_content() -> MockResponse {
    MockResponse::Success(Response::new(204, Bytes::new()))
}

/// 200 with an empty row set and a `Content-Range` total.
pub fn counted(total: u64) -> MockResponse {
    let mut headers = Headers::new();
    headers.insert("content-range".to_string(), format!("0-0/{}", total));
    MockResponse::Success(Response::with_headers(200, headers, Bytes::from("[]")))
}

/// A GoTrue password-grant response for user `u1`.
pub fn sign_in_ok() -> MockResponse {
    json_ok(
        r#"{
            "access_token": "jwt-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "user": { "id": "u1", "email": "student@example.com" }
        }"#,
    )
}

pub fn course_rows() -> &'static str {
    r#"[
        {
            "id": "c1",
            "user_id": "u1",
            "title": "Calculus II",
            "description": "Integrals and series",
            "created_at": "2026-02-01T08:00:00Z"
        },
        {
            "id": "c2",
            "user_id": "u1",
            "title": "Organic Chemistry",
            "created_at": "2026-01-15T08:00:00Z"
        }
    ]"#
}
