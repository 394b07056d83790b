use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use gdk_pixbuf::Pixbuf;
use gtk::prelude::*;
use gtk::{gdk, gio, glib};
use gtk::{
    AlertDialog, Align, Application, ApplicationWindow, Box, Button, ContentFit, CssProvider,
    Entry, Frame, Label, Orientation, Overlay, Picture, ScrolledWindow, Stack,
    StackTransitionType, UriLauncher, Window,
};

use crate::audio::BackgroundMusic;
use crate::card::{decode_poster, MovieCard, POSTER_HEIGHT, POSTER_WIDTH};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::search::{run_search, SearchEvent, SearchTracker};
use crate::tmdb::TmdbClient;

const APP_TITLE: &str = "Movie Search App";

const CSS: &str = "
.screen { background-color: rgba(0, 31, 63, 0.88); }
.screen label { color: #FFFFFF; }
.welcome { font-size: 24pt; font-weight: bold; }
.subtitle { font-size: 14pt; }
.card { background-color: #001F3F; border: 2px groove #4A6A8A; border-radius: 4px; }
";

fn show_message(window: &ApplicationWindow, title: &str, detail: &str) {
    let dialog = AlertDialog::builder()
        .message(title)
        .detail(detail)
        .modal(true)
        .buttons(vec!["OK"])
        .build();
    dialog.show(Some(window));
}

fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_data(CSS);
    match gdk::Display::default() {
        Some(display) => gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => tracing::warn!("No display available, skipping stylesheet"),
    }
}

fn set_margins(widget: &impl IsA<gtk::Widget>, margin: i32) {
    widget.set_margin_start(margin);
    widget.set_margin_end(margin);
    widget.set_margin_top(margin);
    widget.set_margin_bottom(margin);
}

fn background_picture(config: &AppConfig) -> Option<Picture> {
    let path = &config.background_image;
    match Pixbuf::from_file_at_scale(path, config.window_width, config.window_height, false) {
        Ok(pixbuf) => {
            let picture = Picture::new();
            picture.set_paintable(Some(&gdk::Texture::for_pixbuf(&pixbuf)));
            picture.set_content_fit(ContentFit::Cover);
            picture.set_can_shrink(true);
            Some(picture)
        }
        Err(e) => {
            tracing::warn!("Error loading background image {}: {}", path.display(), e);
            None
        }
    }
}

fn start_music(config: &AppConfig) -> Option<BackgroundMusic> {
    if !config.play_music {
        return None;
    }
    match BackgroundMusic::start(&config.background_audio) {
        Ok(music) => Some(music),
        Err(e) => {
            tracing::warn!("Background music disabled: {}", e);
            None
        }
    }
}

/// Asks for a TMDB key in a small modal window. Resolves to `None` if the
/// window is closed without one.
async fn prompt_api_key(window: &ApplicationWindow) -> Option<String> {
    let prompt = Window::builder()
        .title("TMDB API Key Required")
        .modal(true)
        .transient_for(window)
        .default_width(480)
        .build();

    let content = Box::new(Orientation::Vertical, 10);
    set_margins(&content, 14);

    let hint = Label::new(Some(
        "Searching needs a TMDB API key (free at https://www.themoviedb.org/settings/api).\n\
        Set TMDB_API_KEY or api_key in the config file to skip this step.",
    ));
    hint.set_wrap(true);
    hint.set_xalign(0.0);

    let key_entry = Entry::new();
    key_entry.set_placeholder_text(Some("API key"));
    key_entry.set_activates_default(true);

    let continue_btn = Button::with_label("Continue");
    continue_btn.set_halign(Align::End);
    continue_btn.add_css_class("suggested-action");
    prompt.set_default_widget(Some(&continue_btn));

    content.append(&hint);
    content.append(&key_entry);
    content.append(&continue_btn);
    prompt.set_child(Some(&content));

    let (sender, receiver) = async_channel::bounded::<Option<String>>(1);

    let key_sender = sender.clone();
    let prompt_clone = prompt.clone();
    continue_btn.connect_clicked(move |_| {
        let key = key_entry.text().trim().to_string();
        if key.is_empty() {
            return;
        }
        let _ = key_sender.try_send(Some(key));
        prompt_clone.close();
    });
    prompt.connect_close_request(move |_| {
        // Already full when Continue sent the key.
        let _ = sender.try_send(None);
        glib::Propagation::Proceed
    });

    prompt.present();
    receiver.recv().await.ok().flatten()
}

fn build_start_screen(on_start: impl Fn() + 'static) -> Box {
    let screen = Box::new(Orientation::Vertical, 0);
    screen.add_css_class("screen");
    screen.set_valign(Align::Fill);

    let welcome = Label::new(Some("Welcome to Movie Search App"));
    welcome.add_css_class("welcome");
    welcome.set_margin_top(50);

    let subtitle = Label::new(Some(
        "Search for movies, view details, and save to favourites!",
    ));
    subtitle.add_css_class("subtitle");
    subtitle.set_margin_top(10);

    let start_button = Button::with_label("Start");
    start_button.set_halign(Align::Center);
    start_button.set_margin_top(20);
    start_button.connect_clicked(move |_| on_start());

    screen.append(&welcome);
    screen.append(&subtitle);
    screen.append(&start_button);
    screen
}

pub struct MovieApp {
    window: ApplicationWindow,
    config: AppConfig,
    client: TmdbClient,
    stack: Stack,
    search_entry: Entry,
    search_button: Button,
    status_label: Label,
    results_box: Box,
    searches: RefCell<SearchTracker>,
    _music: Option<BackgroundMusic>,
}

impl MovieApp {
    fn build_search_screen(&self) -> Box {
        let screen = Box::new(Orientation::Vertical, 0);
        screen.add_css_class("screen");

        let search_bar = Box::new(Orientation::Horizontal, 10);
        set_margins(&search_bar, 10);
        let prompt = Label::new(Some("Search Movies:"));
        prompt.add_css_class("subtitle");
        search_bar.append(&prompt);
        search_bar.append(&self.search_entry);
        search_bar.append(&self.search_button);
        screen.append(&search_bar);

        self.status_label.set_xalign(0.0);
        self.status_label.set_margin_start(20);
        screen.append(&self.status_label);

        let scrolled = ScrolledWindow::new();
        scrolled.set_vexpand(true);
        scrolled.set_hexpand(true);
        set_margins(&scrolled, 10);
        scrolled.set_child(Some(&self.results_box));
        screen.append(&scrolled);

        screen
    }

    fn connect_signals(self: &Rc<Self>) {
        let app = self.clone();
        self.search_button.connect_clicked(move |_| app.start_search());

        let app = self.clone();
        self.search_entry.connect_activate(move |_| app.start_search());
    }

    fn clear_results(&self) {
        while let Some(child) = self.results_box.first_child() {
            self.results_box.remove(&child);
        }
    }

    fn start_search(self: &Rc<Self>) {
        let query = self.search_entry.text().trim().to_string();
        if query.is_empty() {
            show_message(&self.window, "Error", AppError::EmptyQuery.user_message());
            return;
        }

        let generation = self.searches.borrow_mut().begin();
        self.status_label.set_text(&format!("Searching for: {}", query));
        tracing::info!("Searching for {:?}", query);

        let (sender, receiver) = async_channel::unbounded::<SearchEvent>();
        let client = self.client.clone();
        let config = self.config.clone();
        std::thread::spawn(move || run_search(&client, &config, &query, &sender));

        let app = self.clone();
        glib::spawn_future_local(async move {
            futures::pin_mut!(receiver);
            let mut posters: Vec<Picture> = Vec::new();

            while let Some(event) = receiver.next().await {
                if app.searches.borrow().is_finished(generation) {
                    tracing::debug!("Search {} superseded, dropping its events", generation);
                    break;
                }
                match event {
                    SearchEvent::Failed(e) => {
                        if app.searches.borrow().is_latest(generation) {
                            tracing::error!("Search failed: {}", e);
                            app.restore_status();
                            show_message(&app.window, "Error", e.user_message());
                        }
                    }
                    SearchEvent::Results(cards) if cards.is_empty() => {
                        if app.searches.borrow().is_latest(generation) {
                            app.restore_status();
                            show_message(
                                &app.window,
                                "No Results",
                                "No movies found for your search.",
                            );
                        }
                    }
                    SearchEvent::Results(cards) => {
                        if !app.searches.borrow_mut().accept_results(generation, cards.len()) {
                            break;
                        }
                        app.clear_results();
                        app.restore_status();
                        posters = cards.iter().map(|card| app.append_card(card)).collect();
                    }
                    SearchEvent::Poster { index, bytes } => {
                        if !app.searches.borrow().accepts_poster(generation) {
                            continue;
                        }
                        if let (Some(picture), Some(pixbuf)) =
                            (posters.get(index), decode_poster(&bytes))
                        {
                            picture.set_paintable(Some(&gdk::Texture::for_pixbuf(&pixbuf)));
                        }
                    }
                }
            }
        });
    }

    /// Shows the count for whichever cards are currently on screen.
    fn restore_status(&self) {
        self.status_label.set_text(&self.searches.borrow().status_text());
    }

    /// Adds a card to the results list and returns its poster slot,
    /// which stays blank until poster bytes arrive and decode.
    fn append_card(self: &Rc<Self>, card: &MovieCard) -> Picture {
        let frame = Frame::new(None);
        frame.add_css_class("card");
        frame.set_margin_start(10);
        frame.set_margin_end(10);
        frame.set_margin_top(5);
        frame.set_margin_bottom(5);

        let hbox = Box::new(Orientation::Horizontal, 12);
        set_margins(&hbox, 5);

        let poster = Picture::new();
        poster.set_size_request(POSTER_WIDTH, POSTER_HEIGHT);
        poster.set_valign(Align::Start);
        hbox.append(&poster);

        let details = Box::new(Orientation::Vertical, 4);
        details.set_hexpand(true);

        let title_label = Label::new(None);
        title_label.set_markup(&format!(
            "<span size='large' weight='bold'>{}</span>",
            glib::markup_escape_text(&card.heading())
        ));
        title_label.set_xalign(0.0);

        let date_label = Label::new(None);
        date_label.set_markup(&format!(
            "<i>{}</i>",
            glib::markup_escape_text(&card.release_line())
        ));
        date_label.set_xalign(0.0);

        let overview_label = Label::new(Some(&card.overview));
        overview_label.set_wrap(true);
        overview_label.set_max_width_chars(90);
        overview_label.set_xalign(0.0);

        let button_box = Box::new(Orientation::Horizontal, 8);
        button_box.set_margin_top(5);
        let favourite_btn = Button::with_label("Save to Favourites");
        let watch_btn = Button::with_label("Watch Now");
        button_box.append(&favourite_btn);
        button_box.append(&watch_btn);

        let window = self.window.clone();
        let title = card.title.clone();
        favourite_btn.connect_clicked(move |_| on_save_favourite(&window, &title));

        match card.page_url.clone() {
            Some(url) => {
                let window = self.window.clone();
                watch_btn.connect_clicked(move |_| on_watch_now(&window, &url));
            }
            None => watch_btn.set_sensitive(false),
        }

        details.append(&title_label);
        details.append(&date_label);
        details.append(&overview_label);
        details.append(&button_box);
        hbox.append(&details);

        frame.set_child(Some(&hbox));
        self.results_box.append(&frame);
        poster
    }
}

fn on_save_favourite(window: &ApplicationWindow, title: &str) {
    tracing::info!("Favourite: {}", title);
    show_message(window, "Favourites", &format!("{} added to favourites!", title));
}

fn on_watch_now(window: &ApplicationWindow, url: &str) {
    tracing::info!("Opening {}", url);
    let parent = window.clone();
    let url_owned = url.to_string();
    let launcher = UriLauncher::builder().uri(url).build();
    launcher.launch(Some(window), None::<&gio::Cancellable>, move |result| {
        if let Err(e) = result {
            tracing::error!("Could not open {}: {}", url_owned, e);
            show_message(&parent, "Error", &format!("Could not open {}", url_owned));
        }
    });
}

pub fn build_ui(gtk_app: &Application, mut config: AppConfig) {
    if let Some(window) = gtk_app.active_window() {
        window.present();
        return;
    }

    load_css();

    let window = ApplicationWindow::builder()
        .application(gtk_app)
        .title(APP_TITLE)
        .default_width(config.window_width)
        .default_height(config.window_height)
        .build();

    if config.has_api_key() {
        show_main_window(&window, config);
        return;
    }

    glib::spawn_future_local(async move {
        match prompt_api_key(&window).await {
            Some(key) => {
                config.api_key = key;
                show_main_window(&window, config);
            }
            None => {
                tracing::error!("No API key provided. Exiting.");
                window.destroy();
            }
        }
    });
}

fn show_main_window(window: &ApplicationWindow, config: AppConfig) {
    let client = match TmdbClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Could not create HTTP client: {}", e);
            window.destroy();
            return;
        }
    };

    let search_entry = Entry::new();
    search_entry.set_width_chars(50);
    search_entry.set_placeholder_text(Some("Movie title"));

    let stack = Stack::new();
    stack.set_transition_type(StackTransitionType::Crossfade);

    let app = Rc::new(MovieApp {
        window: window.clone(),
        client,
        stack: stack.clone(),
        search_entry,
        search_button: Button::with_label("Search"),
        status_label: Label::new(None),
        results_box: Box::new(Orientation::Vertical, 0),
        searches: RefCell::new(SearchTracker::default()),
        _music: start_music(&config),
        config,
    });

    let stack_clone = stack.clone();
    let entry_clone = app.search_entry.clone();
    let start_screen = build_start_screen(move || {
        stack_clone.set_visible_child_name("search");
        entry_clone.grab_focus();
    });
    stack.add_named(&start_screen, Some("start"));
    stack.add_named(&app.build_search_screen(), Some("search"));
    app.stack.set_visible_child_name("start");
    app.connect_signals();

    let overlay = Overlay::new();
    match background_picture(&app.config) {
        Some(background) => {
            overlay.set_child(Some(&background));
            overlay.add_overlay(&stack);
        }
        None => overlay.set_child(Some(&stack)),
    }

    window.set_child(Some(&overlay));
    window.present();
    tracing::info!("Window ready");
}
