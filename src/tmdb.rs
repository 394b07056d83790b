use std::time::Duration;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct TMDBSearchResponse {
    #[serde(default)]
    results: Vec<MovieRecord>,
}

/// One entry of the `results` array. TMDB leaves fields out or sends
/// `null`, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MovieRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::blocking::Client,
    api_key: String,
    search_url: String,
}

impl TmdbClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(AppError::MissingApiKey);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(TmdbClient {
            http,
            api_key: config.api_key.clone(),
            search_url: config.search_url.clone(),
        })
    }

    pub fn search_url_for(&self, query: &str) -> String {
        format!(
            "{}?api_key={}&query={}",
            self.search_url,
            self.api_key,
            urlencoding::encode(query)
        )
    }

    pub fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::EmptyQuery);
        }

        tracing::debug!("GET {} query={:?}", self.search_url, query);
        let response = self.http.get(self.search_url_for(query)).send()?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Search for {:?} failed with {}", query, status);
            return Err(AppError::Status(status.as_u16()));
        }

        let body: TMDBSearchResponse = response.json()?;
        tracing::info!("Search for {:?} returned {} results", query, body.results.len());
        Ok(body.results)
    }

    /// Downloads raw image bytes. Decoding happens on the UI thread.
    pub fn fetch_poster(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> TmdbClient {
        let config = AppConfig {
            api_key: "test-key".into(),
            search_url: server.url("/3/search/movie"),
            request_timeout_secs: 5,
            ..AppConfig::default()
        };
        TmdbClient::new(&config).unwrap()
    }

    #[test]
    fn search_returns_records_in_api_order() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/3/search/movie")
                .query_param("api_key", "test-key")
                .query_param("query", "the matrix");
            then.status(200).json_body(serde_json::json!({
                "page": 1,
                "results": [
                    {"id": 603, "title": "The Matrix", "release_date": "1999-03-30",
                     "overview": "A hacker learns the truth.", "poster_path": "/matrix.jpg",
                     "vote_average": 8.2},
                    {"id": 604, "title": "The Matrix Reloaded", "poster_path": null}
                ]
            }));
        });

        let records = client_for(&server).search_movies("  the matrix ").unwrap();
        mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(603));
        assert_eq!(records[0].poster_path.as_deref(), Some("/matrix.jpg"));
        assert_eq!(records[1].title.as_deref(), Some("The Matrix Reloaded"));
        assert_eq!(records[1].poster_path, None);
        assert_eq!(records[1].overview, None);
    }

    #[test]
    fn non_success_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/3/search/movie");
            then.status(401)
                .json_body(serde_json::json!({"status_message": "Invalid API key"}));
        });

        let err = client_for(&server).search_movies("alien").unwrap_err();
        assert!(matches!(err, AppError::Status(401)));
        assert_eq!(err.user_message(), crate::error::FETCH_FAILED_MESSAGE);
    }

    #[test]
    fn empty_query_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/3/search/movie");
            then.status(200).json_body(serde_json::json!({"results": []}));
        });

        let err = client_for(&server).search_movies("   ").unwrap_err();
        assert!(matches!(err, AppError::EmptyQuery));
        mock.assert_hits(0);
    }

    #[test]
    fn missing_results_key_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/3/search/movie");
            then.status(200).json_body(serde_json::json!({"page": 1}));
        });

        let records = client_for(&server).search_movies("nothing").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn non_json_body_is_an_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/3/search/movie");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = client_for(&server).search_movies("dune").unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }

    #[test]
    fn client_requires_api_key() {
        let err = TmdbClient::new(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, AppError::MissingApiKey));
    }

    #[test]
    fn query_is_url_encoded() {
        let server = MockServer::start();
        let client = client_for(&server);
        let url = client.search_url_for("Amélie & friends");
        assert!(url.ends_with("?api_key=test-key&query=Am%C3%A9lie%20%26%20friends"));
    }

    #[test]
    fn poster_fetch_returns_bytes_or_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/t/p/w200/ok.jpg");
            then.status(200).body(vec![0xFF, 0xD8, 0xFF]);
        });
        server.mock(|when, then| {
            when.method(GET).path("/t/p/w200/gone.jpg");
            then.status(404);
        });

        let client = client_for(&server);
        let bytes = client.fetch_poster(&server.url("/t/p/w200/ok.jpg")).unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);

        let err = client.fetch_poster(&server.url("/t/p/w200/gone.jpg")).unwrap_err();
        assert!(matches!(err, AppError::Status(404)));
    }
}
