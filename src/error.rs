use thiserror::Error;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a movie name.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch movies. Please try again.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("empty search query")]
    EmptyQuery,

    #[error("search returned HTTP status {0}")]
    Status(u16),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("No TMDB API key configured")]
    MissingApiKey,

    #[error("Image error: {0}")]
    Image(#[from] gtk::glib::Error),

    #[error("Audio error: {0}")]
    Audio(String),
}

impl AppError {
    /// Text shown in the error dialog when a search fails with this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::EmptyQuery => EMPTY_QUERY_MESSAGE,
            _ => FETCH_FAILED_MESSAGE,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_asks_for_a_name() {
        assert_eq!(AppError::EmptyQuery.user_message(), EMPTY_QUERY_MESSAGE);
    }

    #[test]
    fn failed_search_uses_generic_message() {
        assert_eq!(AppError::Status(401).user_message(), FETCH_FAILED_MESSAGE);
        assert_eq!(
            AppError::Audio("no device".into()).user_message(),
            FETCH_FAILED_MESSAGE
        );
    }

    #[test]
    fn status_error_names_the_code() {
        assert_eq!(
            AppError::Status(503).to_string(),
            "search returned HTTP status 503"
        );
    }
}
