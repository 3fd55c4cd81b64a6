use anyhow::Result;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::cache::SearchCache;
use crate::config::Config;
use crate::constants::constants;
use crate::notes::{Note, NoteStore, next_seq};
use crate::theme::THEMES;
use crate::youtube::{self, SortMode, Video};

// --- Types ---

/// Result of one search fetch: the generation it was spawned under, the
/// (query, sort) it ran for, and the merged video list.
pub(crate) type SearchOutcome = (u64, String, SortMode, Result<Vec<Video>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Welcome,
  Home,
  Search,
  Details,
  Settings,
}

// --- Per-screen view state ---

/// One horizontally scrolling category rail on the home screen.
pub struct Rail {
  pub category: String,
  pub videos: Vec<Video>,
  pub selected: usize,
  pub loading: bool,
}

pub struct HomeState {
  pub rails: Vec<Rail>,
  pub selected_rail: usize,
  /// Set once the initial per-category fan-out has been issued.
  pub loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
  Input,
  Results,
}

pub struct SearchState {
  pub query: String,
  pub cursor: usize,
  pub scroll: usize,
  pub sort: SortMode,
  pub focus: SearchFocus,
  pub results: Vec<Video>,
  pub list_state: ListState,
  /// The (query, sort) the displayed results belong to.
  pub results_for: Option<(String, SortMode)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsTab {
  Description,
  Notes,
}

pub struct DetailsState {
  pub video: Video,
  pub tab: DetailsTab,
  pub notes: Vec<Note>,
  pub note_input: String,
  pub note_cursor: usize,
  /// Whether keystrokes currently edit the note input.
  pub editing_note: bool,
  pub scroll: u16,
}

/// A search waiting out the debounce quiet period. A newer keystroke
/// replaces the whole thing, deadline included.
struct PendingSearch {
  query: String,
  sort: SortMode,
  deadline: Instant,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<SearchOutcome>>,
  pub(crate) home_rx: Option<mpsc::Receiver<(usize, Result<Vec<Video>>)>>,
}

// --- App ---

pub struct App {
  pub screen_stack: Vec<Screen>,
  pub home: HomeState,
  pub search: SearchState,
  pub details: Option<DetailsState>,
  pub config: Config,
  pub theme_index: usize,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  pub http_client: Client,
  api_key: Option<String>,
  cache: SearchCache,
  notes: Option<NoteStore>,
  /// Bumped on every search initiation; results stamped with an older
  /// value are dropped so a slow response can't overwrite newer results.
  generation: u64,
  pending_search: Option<PendingSearch>,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set — used for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(cli_api_key: Option<String>) -> Self {
    let config = Config::load();
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };
    let api_key = config.resolve_api_key(cli_api_key.as_deref());

    let rails = constants()
      .categories
      .iter()
      .map(|category| Rail { category: category.clone(), videos: Vec::new(), selected: 0, loading: false })
      .collect();

    Self {
      screen_stack: vec![Screen::Welcome],
      home: HomeState { rails, selected_rail: 0, loaded: false },
      search: SearchState {
        query: String::new(),
        cursor: 0,
        scroll: 0,
        sort: SortMode::default(),
        focus: SearchFocus::Input,
        results: Vec::new(),
        list_state: ListState::default(),
        results_for: None,
      },
      details: None,
      config,
      theme_index,
      last_error: None,
      status_message: None,
      should_quit: false,
      http_client: Client::new(),
      api_key,
      cache: SearchCache::new(),
      notes: NoteStore::open_default(),
      generation: 0,
      pending_search: None,
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  fn save_config(&mut self) {
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  // --- Status / errors ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Navigation ---

  pub fn screen(&self) -> Screen {
    self.screen_stack.last().copied().unwrap_or(Screen::Welcome)
  }

  pub fn push_screen(&mut self, screen: Screen) {
    self.screen_stack.push(screen);
  }

  /// Pop back to the previous screen. The bottom of the stack stays put.
  pub fn pop_screen(&mut self) {
    if self.screen_stack.len() > 1 {
      if let Some(Screen::Details) = self.screen_stack.pop() {
        self.details = None;
      }
    }
  }

  /// Leave the welcome splash for the home feed.
  pub fn finish_welcome(&mut self) {
    self.screen_stack = vec![Screen::Home];
    self.trigger_home_fetch();
  }

  /// Toggle between the two top-level tabs (Home, Search).
  pub fn switch_tab(&mut self) {
    match self.screen() {
      Screen::Home => {
        self.screen_stack = vec![Screen::Search];
      }
      Screen::Search => {
        self.screen_stack = vec![Screen::Home];
        self.trigger_home_fetch();
      }
      _ => {}
    }
  }

  // --- Search / fetch / cache ---

  /// Reschedule the debounce deadline after a query edit. The fetch fires
  /// from `tick` once the quiet period elapses with no further edits.
  pub fn schedule_search(&mut self) {
    if self.search.query.is_empty() {
      self.pending_search = None;
      return;
    }
    self.pending_search = Some(PendingSearch {
      query: self.search.query.clone(),
      sort: self.search.sort,
      deadline: Instant::now() + Duration::from_millis(constants().debounce_ms),
    });
  }

  /// Enter in the search field: fetch immediately, superseding any
  /// pending debounce.
  pub fn submit_search(&mut self) {
    self.pending_search = None;
    let query = self.search.query.clone();
    if query.is_empty() {
      return;
    }
    self.run_search(query, self.search.sort);
  }

  /// Cycle the sort mode and re-run the protocol for the current query.
  /// Sort is part of the cache key, so a pair fetched before is served
  /// from cache and a new pair fetches.
  pub fn cycle_sort(&mut self) {
    self.search.sort = self.search.sort.next();
    self.pending_search = None;
    let query = self.search.query.clone();
    if !query.is_empty() {
      self.run_search(query, self.search.sort);
    }
  }

  /// Jump to the search tab with a pre-filled category query and fetch it
  /// right away ("show more" on a home rail).
  pub fn open_search_with(&mut self, query: String) {
    self.search.cursor = query.chars().count();
    self.search.scroll = 0;
    self.search.query = query.clone();
    self.search.focus = SearchFocus::Input;
    self.screen_stack = vec![Screen::Search];
    self.pending_search = None;
    self.run_search(query, self.search.sort);
  }

  /// Run the fetch protocol for one (query, sort) pair: serve from cache
  /// when the exact pair was fetched before, otherwise spawn the two-call
  /// network fetch stamped with a fresh generation.
  fn run_search(&mut self, query: String, sort: SortMode) {
    self.generation += 1;
    let generation = self.generation;
    self.clear_error();

    if let Some(cached) = self.cache.get(&query, sort) {
      debug!(query = %query, order = sort.api_order(), "search cache hit");
      self.status_message = None;
      let videos = cached.to_vec();
      self.apply_search_results(query, sort, videos);
      return;
    }

    let Some(api_key) = self.api_key.clone() else {
      self.set_error(format!("No YouTube API key. Set {} or add api_key to prefs.toml.", constants().api_key_env));
      return;
    };

    info!(query = %query, order = sort.api_order(), generation, "search triggered");
    self.status_message = Some(format!("Searching '{}'…", query));

    let client = self.http_client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = youtube::search_videos(&client, &api_key, &query, sort, constants().max_results).await;
      let _ = tx.send((generation, query, sort, result));
    });
    self.tasks.search_rx = Some(rx);
  }

  fn apply_search_results(&mut self, query: String, sort: SortMode, videos: Vec<Video>) {
    if videos.is_empty() {
      self.set_error("No results found.".to_string());
    }
    self.search.list_state.select(if videos.is_empty() { None } else { Some(0) });
    self.search.results = videos;
    self.search.results_for = Some((query, sort));
  }

  // --- Home feed ---

  /// Issue the initial per-category fetches, bounded fan-out. Categories
  /// already in the cache are served without network work.
  pub fn trigger_home_fetch(&mut self) {
    if self.home.loaded {
      return;
    }
    self.home.loaded = true;

    let mut missing: Vec<(usize, String)> = Vec::new();
    for (idx, rail) in self.home.rails.iter_mut().enumerate() {
      if let Some(cached) = self.cache.get(&rail.category, SortMode::default()) {
        rail.videos = cached.to_vec();
      } else {
        rail.loading = true;
        missing.push((idx, rail.category.clone()));
      }
    }
    if missing.is_empty() {
      return;
    }

    let Some(api_key) = self.api_key.clone() else {
      for rail in &mut self.home.rails {
        rail.loading = false;
      }
      self.set_error(format!("No YouTube API key. Set {} or add api_key to prefs.toml.", constants().api_key_env));
      return;
    };

    info!(categories = missing.len(), "home feed fetch");
    let client = self.http_client.clone();
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
      use futures::stream::{self, StreamExt};

      stream::iter(missing)
        .map(|(idx, category)| {
          let client = client.clone();
          let api_key = api_key.clone();
          let tx = tx.clone();
          async move {
            let result =
              youtube::search_videos(&client, &api_key, &category, SortMode::default(), constants().max_results).await;
            let _ = tx.send((idx, result)).await;
          }
        })
        .buffer_unordered(constants().home_fetch_concurrency)
        .collect::<()>()
        .await;
    });
    self.tasks.home_rx = Some(rx);
  }

  // --- Details + notes ---

  /// Open the details screen for a video, loading its note log.
  pub fn open_details(&mut self, video: Video) {
    let notes = self.notes.as_ref().map(|store| store.load(&video.video_id)).unwrap_or_default();
    self.details = Some(DetailsState {
      video,
      tab: DetailsTab::Description,
      notes,
      note_input: String::new(),
      note_cursor: 0,
      editing_note: false,
      scroll: 0,
    });
    self.push_screen(Screen::Details);
  }

  /// Commit the note input: trim, drop if empty, append to the log.
  /// A failed write keeps the note in memory (logged inside the store).
  pub fn add_note(&mut self) {
    let Some(details) = self.details.as_mut() else { return };
    let appended = match &self.notes {
      Some(store) => store.append(&details.video.video_id, &details.notes, &details.note_input),
      // No resolvable data dir: the note lives only in memory.
      None => Note::create(next_seq(&details.notes), &details.note_input),
    };
    if let Some(note) = appended {
      details.notes.push(note);
    }
    details.note_input.clear();
    details.note_cursor = 0;
    details.editing_note = false;
  }

  // --- Settings ---

  pub fn toggle_reminder(&mut self) {
    self.config.reminder_enabled = !self.config.reminder_enabled;
    info!(enabled = self.config.reminder_enabled, "reminder toggled");
    self.config.save();
  }

  // --- Event loop hooks ---

  /// Per-tick housekeeping: expire stale errors and fire a debounced
  /// search whose quiet period has elapsed.
  pub fn tick(&mut self) {
    self.expire_error();
    if let Some(pending) = self.pending_search.take_if(|p| Instant::now() >= p.deadline) {
      self.run_search(pending.query, pending.sort);
    }
  }

  /// Poll in-flight async work. Called once per event-loop tick.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok((generation, query, sort, result)) => {
          if generation != self.generation {
            debug!(generation, current = self.generation, "dropping superseded search result");
          } else {
            self.status_message = None;
            match result {
              Ok(videos) => {
                self.cache.insert(query.clone(), sort, videos.clone());
                self.apply_search_results(query, sort, videos);
              }
              Err(e) => {
                // Stale-if-error: the displayed list stays as it was.
                warn!(query = %query, err = %format!("{:#}", e), "search failed");
                self.set_error(format!("Search failed: {:#}", e));
              }
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    // Drain per-category home feed results as they arrive.
    let mut disconnected = false;
    if let Some(ref mut rx) = self.tasks.home_rx {
      loop {
        match rx.try_recv() {
          Ok((idx, result)) => {
            let Some(rail) = self.home.rails.get_mut(idx) else { continue };
            rail.loading = false;
            match result {
              Ok(videos) => {
                self.cache.insert(rail.category.clone(), SortMode::default(), videos.clone());
                rail.videos = videos;
              }
              Err(e) => {
                warn!(category = %rail.category, err = %format!("{:#}", e), "home rail fetch failed");
              }
            }
          }
          Err(mpsc::error::TryRecvError::Empty) => break,
          Err(mpsc::error::TryRecvError::Disconnected) => {
            disconnected = true;
            break;
          }
        }
      }
    }
    if disconnected {
      self.tasks.home_rx = None;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> App {
    App::new(Some("test-key".to_string()))
  }

  fn video(id: &str) -> Video {
    Video {
      video_id: id.to_string(),
      title: format!("video {id}"),
      description: String::new(),
      channel_title: "chan".to_string(),
      published_at: "2024-01-01T00:00:00Z".to_string(),
      thumbnail_url: String::new(),
      view_count: Some("10".to_string()),
      like_count: None,
    }
  }

  fn type_query(app: &mut App, text: &str) {
    for i in 1..=text.chars().count() {
      app.search.query = text.chars().take(i).collect();
      app.search.cursor = i;
      app.schedule_search();
    }
  }

  fn force_deadline(app: &mut App) {
    if let Some(pending) = app.pending_search.as_mut() {
      pending.deadline = Instant::now() - Duration::from_millis(1);
    }
  }

  // --- Debounce ---

  #[tokio::test]
  async fn debounce_coalesces_keystrokes_into_one_fetch() {
    let mut app = app();
    type_query(&mut app, "rustl");
    // Nothing fires while the quiet period is still running.
    assert!(app.tasks.search_rx.is_none());
    assert_eq!(app.pending_search.as_ref().unwrap().query, "rustl");

    force_deadline(&mut app);
    app.tick();
    assert!(app.tasks.search_rx.is_some());
    assert!(app.pending_search.is_none());
    assert_eq!(app.generation, 1);

    // A later tick with no edits must not fire again.
    app.tick();
    assert_eq!(app.generation, 1);
  }

  #[tokio::test]
  async fn clearing_the_query_cancels_the_pending_fetch() {
    let mut app = app();
    type_query(&mut app, "rust");
    app.search.query.clear();
    app.search.cursor = 0;
    app.schedule_search();
    assert!(app.pending_search.is_none());

    app.tick();
    assert!(app.tasks.search_rx.is_none());
  }

  // --- Cache interaction ---

  #[tokio::test]
  async fn cached_query_is_served_without_network() {
    let mut app = app();
    app.cache.insert("rust".to_string(), SortMode::MostPopular, vec![video("a"), video("b")]);

    app.search.query = "rust".to_string();
    app.submit_search();

    assert!(app.tasks.search_rx.is_none());
    assert_eq!(app.search.results.len(), 2);
    assert_eq!(app.search.list_state.selected(), Some(0));
    assert_eq!(app.search.results_for, Some(("rust".to_string(), SortMode::MostPopular)));
  }

  #[tokio::test]
  async fn cache_key_is_exact_so_trailing_space_fetches() {
    let mut app = app();
    app.cache.insert("react".to_string(), SortMode::MostPopular, vec![video("a")]);

    app.search.query = "react ".to_string();
    app.submit_search();
    // "react " is a different key than "react": a fetch is spawned.
    assert!(app.tasks.search_rx.is_some());
  }

  #[tokio::test]
  async fn sort_change_refetches_under_new_key_and_keeps_old_entry() {
    let mut app = app();
    app.cache.insert("rust".to_string(), SortMode::MostPopular, vec![video("popular")]);
    app.cache.insert("rust".to_string(), SortMode::Newest, vec![video("fresh")]);

    app.search.query = "rust".to_string();
    app.submit_search();
    assert_eq!(app.search.results[0].video_id, "popular");

    app.cycle_sort();
    assert_eq!(app.search.sort, SortMode::Newest);
    assert!(app.tasks.search_rx.is_none());
    assert_eq!(app.search.results[0].video_id, "fresh");

    // The old entry is untouched.
    assert_eq!(app.cache.get("rust", SortMode::MostPopular).unwrap()[0].video_id, "popular");
  }

  #[tokio::test]
  async fn uncached_sort_change_spawns_a_fetch() {
    let mut app = app();
    app.cache.insert("rust".to_string(), SortMode::MostPopular, vec![video("popular")]);

    app.search.query = "rust".to_string();
    app.submit_search();
    assert!(app.tasks.search_rx.is_none());

    app.cycle_sort();
    assert!(app.tasks.search_rx.is_some());
  }

  // --- Generation guard ---

  #[tokio::test]
  async fn stale_generation_result_is_dropped() {
    let mut app = app();
    app.generation = 5;

    let (tx, rx) = oneshot::channel();
    app.tasks.search_rx = Some(rx);
    tx.send((4u64, "old".to_string(), SortMode::MostPopular, Ok(vec![video("stale")]))).ok();

    app.check_pending();
    assert!(app.search.results.is_empty());
    assert!(app.cache.get("old", SortMode::MostPopular).is_none());
  }

  #[tokio::test]
  async fn current_generation_result_is_applied_and_cached() {
    let mut app = app();
    app.generation = 5;

    let (tx, rx) = oneshot::channel();
    app.tasks.search_rx = Some(rx);
    tx.send((5u64, "rust".to_string(), SortMode::Newest, Ok(vec![video("a")]))).ok();

    app.check_pending();
    assert_eq!(app.search.results.len(), 1);
    assert_eq!(app.cache.get("rust", SortMode::Newest).unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_fetch_leaves_previous_results_in_place() {
    let mut app = app();
    app.search.results = vec![video("kept")];

    let (tx, rx) = oneshot::channel();
    app.tasks.search_rx = Some(rx);
    app.generation = 1;
    tx.send((1u64, "rust".to_string(), SortMode::MostPopular, Err(anyhow::anyhow!("boom")))).ok();

    app.check_pending();
    assert_eq!(app.search.results.len(), 1);
    assert_eq!(app.search.results[0].video_id, "kept");
    assert!(app.last_error.as_deref().unwrap_or_default().contains("Search failed"));
  }

  // --- Navigation ---

  #[tokio::test]
  async fn welcome_leads_to_home_and_tabs_toggle() {
    let mut app = App::new(None);
    assert_eq!(app.screen(), Screen::Welcome);
    app.finish_welcome();
    assert_eq!(app.screen(), Screen::Home);
    app.switch_tab();
    assert_eq!(app.screen(), Screen::Search);
    app.switch_tab();
    assert_eq!(app.screen(), Screen::Home);
  }

  #[tokio::test]
  async fn settings_pushes_and_pops() {
    let mut app = App::new(None);
    app.finish_welcome();
    app.push_screen(Screen::Settings);
    assert_eq!(app.screen(), Screen::Settings);
    app.pop_screen();
    assert_eq!(app.screen(), Screen::Home);
    // The bottom of the stack never pops.
    app.pop_screen();
    assert_eq!(app.screen(), Screen::Home);
  }

  #[tokio::test]
  async fn show_more_prefills_search_and_fetches() {
    let mut app = app();
    app.finish_welcome();
    app.open_search_with("React".to_string());
    assert_eq!(app.screen(), Screen::Search);
    assert_eq!(app.search.query, "React");
    assert_eq!(app.search.cursor, 5);
    assert!(app.tasks.search_rx.is_some());
  }

  #[tokio::test]
  async fn home_rails_use_cached_categories() {
    let mut app = app();
    for category in &constants().categories {
      app.cache.insert(category.clone(), SortMode::default(), vec![video("c")]);
    }
    app.trigger_home_fetch();
    // Everything was cached: no fan-out task needed.
    assert!(app.tasks.home_rx.is_none());
    assert!(app.home.rails.iter().all(|r| r.videos.len() == 1 && !r.loading));
  }
}
