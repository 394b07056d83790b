use crate::card::MovieCard;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::tmdb::TmdbClient;

/// Messages from the search worker thread to the UI thread.
pub enum SearchEvent {
    Results(Vec<MovieCard>),
    Poster { index: usize, bytes: Vec<u8> },
    Failed(AppError),
}

/// Fetches results and then posters in card order. Stops early once the
/// receiving side is gone.
pub fn run_search(
    client: &TmdbClient,
    config: &AppConfig,
    query: &str,
    sender: &async_channel::Sender<SearchEvent>,
) {
    let records = match client.search_movies(query) {
        Ok(records) => records,
        Err(e) => {
            let _ = sender.send_blocking(SearchEvent::Failed(e));
            return;
        }
    };

    let cards: Vec<MovieCard> = records
        .iter()
        .map(|record| MovieCard::from_record(record, config))
        .collect();
    let poster_urls: Vec<Option<String>> = cards.iter().map(|c| c.poster_url.clone()).collect();

    if sender.send_blocking(SearchEvent::Results(cards)).is_err() {
        return;
    }

    for (index, url) in poster_urls.into_iter().enumerate() {
        let Some(url) = url else { continue };
        match client.fetch_poster(&url) {
            Ok(bytes) => {
                if sender.send_blocking(SearchEvent::Poster { index, bytes }).is_err() {
                    return;
                }
            }
            Err(e) => tracing::debug!("Poster {} unavailable: {}", url, e),
        }
    }
}

/// Which search was asked for last, and which one's cards are on screen.
/// These differ while a newer search is in flight or after it failed.
#[derive(Debug, Default)]
pub struct SearchTracker {
    latest: u64,
    shown: u64,
    shown_count: usize,
}

impl SearchTracker {
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.latest
    }

    /// Whether a non-empty result list should replace the cards on screen.
    pub fn accept_results(&mut self, generation: u64, count: usize) -> bool {
        if !self.is_latest(generation) {
            return false;
        }
        self.shown = generation;
        self.shown_count = count;
        true
    }

    pub fn accepts_poster(&self, generation: u64) -> bool {
        generation == self.shown
    }

    /// A search can't deliver anything more once a newer one has put its
    /// cards up, or once it is superseded without ever showing cards.
    pub fn is_finished(&self, generation: u64) -> bool {
        self.shown > generation || (generation < self.latest && generation != self.shown)
    }

    pub fn status_text(&self) -> String {
        match self.shown_count {
            0 => String::new(),
            1 => "1 movie found".to_string(),
            n => format!("{} movies found", n),
        }
    }
}
