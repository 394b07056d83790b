use chrono::{Datelike, NaiveDate};
use gdk_pixbuf::prelude::*;
use gdk_pixbuf::{InterpType, Pixbuf, PixbufLoader};

use crate::config::AppConfig;
use crate::error::Result;
use crate::tmdb::MovieRecord;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const NO_OVERVIEW: &str = "No description available.";
pub const NO_RELEASE_DATE: &str = "N/A";

pub const POSTER_WIDTH: i32 = 100;
pub const POSTER_HEIGHT: i32 = 150;

/// Display-ready view of a search result.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub year: Option<i32>,
    pub poster_url: Option<String>,
    pub page_url: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MovieCard {
    pub fn from_record(record: &MovieRecord, config: &AppConfig) -> Self {
        let release_date = present(&record.release_date);
        MovieCard {
            title: present(&record.title).unwrap_or(UNKNOWN_TITLE).to_string(),
            overview: present(&record.overview).unwrap_or(NO_OVERVIEW).to_string(),
            release_date: release_date.unwrap_or(NO_RELEASE_DATE).to_string(),
            year: release_date
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(|d| d.year()),
            poster_url: present(&record.poster_path)
                .map(|p| format!("{}{}", config.poster_base_url, p)),
            page_url: record
                .id
                .map(|id| format!("{}{}", config.movie_page_base_url, id)),
        }
    }

    pub fn heading(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    pub fn release_line(&self) -> String {
        format!("Release Date: {}", self.release_date)
    }
}

fn load_pixbuf(bytes: &[u8]) -> Result<Option<Pixbuf>> {
    let loader = PixbufLoader::new();
    loader.write(bytes)?;
    loader.close()?;
    Ok(loader.pixbuf())
}

/// Decodes and scales poster bytes; `None` means "show the blank placeholder".
pub fn decode_poster(bytes: &[u8]) -> Option<Pixbuf> {
    match load_pixbuf(bytes) {
        Ok(Some(pixbuf)) => {
            pixbuf.scale_simple(POSTER_WIDTH, POSTER_HEIGHT, InterpType::Bilinear)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::debug!("Could not decode poster: {}", e);
            None
        }
    }
}
