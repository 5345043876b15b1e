//! PostgREST query builder.
//!
//! Builds the `?select=...&col=op.value` URLs PostgREST expects, including
//! embedded-resource selects like `*,course:courses(title)`, and executes
//! them through the shared [`SupabaseClient`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::SupabaseClient;
use crate::error::{AthenoError, AthenoResult, BackendError};

/// A single column filter.
#[derive(Debug, Clone)]
struct Filter {
    column: String,
    /// PostgREST operator: `eq`, `neq`, `gte`, ...
    op: &'static str,
    value: String,
}

/// Builder for one request against a table.
///
/// Obtained from [`SupabaseClient::table`]. Filters accumulate; execution
/// methods consume the builder.
#[derive(Clone)]
pub struct QueryBuilder {
    client: SupabaseClient,
    table: String,
    select: String,
    filters: Vec<Filter>,
    order: Option<(String, bool)>,
    limit: Option<u32>,
    count_exact: bool,
}

impl QueryBuilder {
    pub(crate) fn new(client: SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            count_exact: false,
        }
    }

    /// Set the select list, including embedded resources
    /// (e.g. `*,course:courses(id,title)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    /// Filter rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: "eq",
            value: value.to_string(),
        });
        self
    }

    /// Filter rows where `column` does not equal `value`.
    pub fn neq(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: "neq",
            value: value.to_string(),
        });
        self
    }

    /// Filter rows where `column` is greater than or equal to `value`.
    pub fn gte(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: "gte",
            value: value.to_string(),
        });
        self
    }

    /// Order by `column`; `ascending = false` gives newest-first.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    /// Limit the number of returned rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask PostgREST for an exact row count alongside the rows.
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Build the request URL.
    fn url(&self) -> String {
        let mut params: Vec<String> =
            vec![format!("select={}", urlencoding::encode(&self.select))];

        for filter in &self.filters {
            params.push(format!(
                "{}={}.{}",
                filter.column,
                filter.op,
                urlencoding::encode(&filter.value)
            ));
        }

        if let Some((column, ascending)) = &self.order {
            let direction = if *ascending { "asc" } else { "desc" };
            params.push(format!("order={}.{}", column, direction));
        }

        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }

        format!(
            "{}/rest/v1/{}?{}",
            self.client.base_url(),
            self.table,
            params.join("&")
        )
    }

    fn headers(&self) -> crate::traits::Headers {
        let mut headers = self.client.rest_headers();
        if self.count_exact {
            headers.insert("Prefer".to_string(), "count=exact".to_string());
        }
        headers
    }

    /// Total row count from a `Content-Range` header (`0-24/3245`).
    fn parse_total(headers: &crate::traits::Headers) -> Option<u64> {
        let range = headers
            .get("content-range")
            .or_else(|| headers.get("Content-Range"))?;
        range.rsplit('/').next()?.parse().ok()
    }

    /// Execute the query, deserializing the returned rows.
    pub async fn execute<T: DeserializeOwned>(self) -> AthenoResult<Vec<T>> {
        let (rows, _) = self.execute_with_count().await?;
        Ok(rows)
    }

    /// Execute the query, returning rows plus the exact total when
    /// [`count_exact`](Self::count_exact) was requested.
    pub async fn execute_with_count<T: DeserializeOwned>(
        self,
    ) -> AthenoResult<(Vec<T>, Option<u64>)> {
        let url = self.url();
        let headers = self.headers();
        tracing::debug!("GET {}", url);

        let response = self.client.http().get(&url, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }

        let total = Self::parse_total(&response.headers);
        let rows = response.json::<Vec<T>>().map_err(AthenoError::from)?;
        Ok((rows, total))
    }

    /// Count matching rows without fetching their contents.
    pub async fn count(mut self) -> AthenoResult<u64> {
        self.select = "id".to_string();
        self.count_exact = true;
        self.limit = Some(1);

        let url = self.url();
        let headers = self.headers();
        tracing::debug!("GET {} (count)", url);

        let response = self.client.http().get(&url, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }

        Self::parse_total(&response.headers).ok_or_else(|| {
            BackendError::MissingField {
                field: "Content-Range".to_string(),
            }
            .into()
        })
    }

    /// Insert a row, returning the stored representation.
    pub async fn insert<I: Serialize, T: DeserializeOwned>(self, row: &I) -> AthenoResult<Vec<T>> {
        let url = format!("{}/rest/v1/{}", self.client.base_url(), self.table);
        let body = serde_json::to_string(row).map_err(AthenoError::from)?;
        let mut headers = self.client.rest_headers();
        headers.insert("Prefer".to_string(), "return=representation".to_string());
        tracing::debug!("POST {}", url);

        let response = self.client.http().post(&url, &body, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }
        response.json::<Vec<T>>().map_err(AthenoError::from)
    }

    /// Insert a row without asking for the representation back.
    pub async fn insert_only<I: Serialize>(self, row: &I) -> AthenoResult<()> {
        let url = format!("{}/rest/v1/{}", self.client.base_url(), self.table);
        let body = serde_json::to_string(row).map_err(AthenoError::from)?;
        let headers = self.client.rest_headers();
        tracing::debug!("POST {}", url);

        let response = self.client.http().post(&url, &body, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }
        Ok(())
    }

    /// Patch rows matching the accumulated filters.
    pub async fn update<U: Serialize>(self, changes: &U) -> AthenoResult<()> {
        let url = self.url();
        let body = serde_json::to_string(changes).map_err(AthenoError::from)?;
        let headers = self.client.rest_headers();
        tracing::debug!("PATCH {}", url);

        let response = self.client.http().patch(&url, &body, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }
        Ok(())
    }

    /// Delete rows matching the accumulated filters.
    pub async fn delete(self) -> AthenoResult<()> {
        let url = self.url();
        let headers = self.client.rest_headers();
        tracing::debug!("DELETE {}", url);

        let response = self.client.http().delete(&url, &headers).await?;
        if !response.is_success() {
            return Err(SupabaseClient::error_from_response(&response).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::{Headers, Response};
    use bytes::Bytes;
    use std::sync::Arc;

    fn client(http: MockHttpClient) -> SupabaseClient {
        SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(http))
    }

    #[test]
    fn test_url_building() {
        let builder = client(MockHttpClient::new())
            .table("tasks")
            .select("*,course:courses(id,title)")
            .eq("user_id", "u1")
            .neq("status", "completed")
            .order("created_at", false)
            .limit(10);

        let url = builder.url();
        assert!(url.starts_with("https://p.supabase.co/rest/v1/tasks?"));
        assert!(url.contains("select=%2A%2Ccourse%3Acourses%28id%2Ctitle%29"));
        assert!(url.contains("user_id=eq.u1"));
        assert!(url.contains("status=neq.completed"));
        assert!(url.contains("order=created_at.desc"));
        assert!(url.contains("limit=10"));
    }

    #[test]
    fn test_parse_total() {
        let mut headers = Headers::new();
        headers.insert("content-range".to_string(), "0-24/3245".to_string());
        assert_eq!(QueryBuilder::parse_total(&headers), Some(3245));

        let mut headers = Headers::new();
        headers.insert("Content-Range".to_string(), "*/12".to_string());
        assert_eq!(QueryBuilder::parse_total(&headers), Some(12));

        assert_eq!(QueryBuilder::parse_total(&Headers::new()), None);
    }

    #[tokio::test]
    async fn test_execute_deserializes_rows() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Row {
            id: String,
        }

        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/courses",
            MockResponse::Success(Response::new(200, Bytes::from(r#"[{"id":"c1"},{"id":"c2"}]"#))),
        );

        let rows: Vec<Row> = client(http)
            .table("courses")
            .eq("user_id", "u1")
            .execute()
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Row { id: "c1".to_string() });
    }

    #[tokio::test]
    async fn test_count_reads_content_range() {
        let http = MockHttpClient::new();
        let mut headers = Headers::new();
        headers.insert("content-range".to_string(), "0-0/7".to_string());
        http.set_response(
            "https://p.supabase.co/rest/v1/tasks",
            MockResponse::Success(Response::with_headers(200, headers, Bytes::from("[]"))),
        );

        let total = client(http.clone())
            .table("tasks")
            .eq("user_id", "u1")
            .count()
            .await
            .unwrap();
        assert_eq!(total, 7);

        // The count request asks for the exact total.
        let requests = http.get_requests();
        assert_eq!(requests[0].headers.get("Prefer").unwrap(), "count=exact");
    }

    #[tokio::test]
    async fn test_update_sends_patch_with_filters() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/roadmaps",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        client(http.clone())
            .table("roadmaps")
            .eq("id", "r1")
            .update(&serde_json::json!({ "progress": 55 }))
            .await
            .unwrap();

        let requests = http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert!(requests[0].url.contains("id=eq.r1"));
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"progress":55}"#));
    }

    #[tokio::test]
    async fn test_insert_requests_representation() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/courses",
            MockResponse::Success(Response::new(
                201,
                Bytes::from(r#"[{"id":"c9"}]"#),
            )),
        );

        #[derive(Debug, serde::Deserialize)]
        struct Row {
            id: String,
        }

        let rows: Vec<Row> = client(http.clone())
            .table("courses")
            .insert(&serde_json::json!({ "title": "Physics" }))
            .await
            .unwrap();
        assert_eq!(rows[0].id, "c9");

        let requests = http.get_requests();
        assert_eq!(
            requests[0].headers.get("Prefer").unwrap(),
            "return=representation"
        );
    }

    #[tokio::test]
    async fn test_delete_targets_filtered_rows() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/tasks",
            MockResponse::Success(Response::new(204, Bytes::new())),
        );

        client(http.clone())
            .table("tasks")
            .eq("id", "t1")
            .delete()
            .await
            .unwrap();

        let requests = http.get_requests();
        assert_eq!(requests[0].method, "DELETE");
        assert!(requests[0].url.contains("id=eq.t1"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_backend_error() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/rest/v1/courses",
            MockResponse::Success(Response::new(401, Bytes::from(r#"{"message":"JWT expired"}"#))),
        );

        let err = client(http)
            .table("courses")
            .execute::<serde_json::Value>()
            .await
            .unwrap_err();
        assert!(err.requires_reauth());
    }
}
