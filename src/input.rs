use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, DetailsTab, Screen, SearchFocus};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn open_in_browser(app: &mut App, url: &str) {
  // Use platform-appropriate command to open URL in default browser.
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  match app.screen() {
    Screen::Welcome => handle_welcome_key(app, key),
    Screen::Home => handle_home_key(app, key),
    Screen::Search => handle_search_key(app, key),
    Screen::Details => handle_details_key(app, key),
    Screen::Settings => handle_settings_key(app, key),
  }
  Ok(())
}

fn handle_welcome_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.finish_welcome(),
    KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

fn handle_home_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  let rail_idx = app.home.selected_rail;
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => {
      if let Some(rail) = app.home.rails.get_mut(rail_idx) {
        rail.selected = rail.selected.saturating_sub(1);
      }
    }
    KeyCode::Right | KeyCode::Char('l') => {
      if let Some(rail) = app.home.rails.get_mut(rail_idx)
        && rail.selected + 1 < rail.videos.len()
      {
        rail.selected += 1;
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.home.selected_rail = rail_idx.saturating_sub(1);
    }
    KeyCode::Down | KeyCode::Char('j') => {
      if rail_idx + 1 < app.home.rails.len() {
        app.home.selected_rail = rail_idx + 1;
      }
    }
    KeyCode::Enter => {
      if let Some(rail) = app.home.rails.get(rail_idx)
        && let Some(video) = rail.videos.get(rail.selected)
      {
        app.open_details(video.clone());
      }
    }
    KeyCode::Char('s') => {
      if let Some(rail) = app.home.rails.get(rail_idx) {
        let category = rail.category.clone();
        app.open_search_with(category);
      }
    }
    KeyCode::Char('g') => app.push_screen(Screen::Settings),
    KeyCode::Tab => app.switch_tab(),
    KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    app.cycle_sort();
    return;
  }
  if key.code == KeyCode::Tab {
    app.switch_tab();
    return;
  }
  match app.search.focus {
    SearchFocus::Input => handle_search_input_key(app, key),
    SearchFocus::Results => handle_search_results_key(app, key),
  }
}

fn handle_search_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.submit_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.search.query, app.search.cursor);
      app.search.query.insert(byte_idx, c);
      app.search.cursor += 1;
      app.schedule_search();
    }
    KeyCode::Backspace => {
      if app.search.cursor > 0 {
        app.search.cursor -= 1;
        let byte_idx = char_to_byte_index(&app.search.query, app.search.cursor);
        app.search.query.remove(byte_idx);
        app.schedule_search();
      }
    }
    KeyCode::Delete => {
      if app.search.cursor < app.search.query.chars().count() {
        let byte_idx = char_to_byte_index(&app.search.query, app.search.cursor);
        app.search.query.remove(byte_idx);
        app.schedule_search();
      }
    }
    KeyCode::Left => {
      app.search.cursor = app.search.cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.search.cursor < app.search.query.chars().count() {
        app.search.cursor += 1;
      }
    }
    KeyCode::Home => {
      app.search.cursor = 0;
    }
    KeyCode::End => {
      app.search.cursor = app.search.query.chars().count();
    }
    KeyCode::Down => {
      if !app.search.results.is_empty() {
        app.search.focus = SearchFocus::Results;
      }
    }
    KeyCode::Esc => {
      if !app.search.query.is_empty() {
        app.search.query.clear();
        app.search.cursor = 0;
        app.search.scroll = 0;
        app.schedule_search();
      } else {
        app.switch_tab();
      }
    }
    _ => {}
  }
}

fn handle_search_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      if let Some(selected) = app.search.list_state.selected()
        && let Some(video) = app.search.results.get(selected)
      {
        app.open_details(video.clone());
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.search.results.len();
      if count > 0 {
        let i = app.search.list_state.selected().map_or(0, |i| (i + 1) % count);
        app.search.list_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.search.results.len();
      if count > 0 {
        let i =
          app.search.list_state.selected().map_or(0, |i| if i == 0 { count.saturating_sub(1) } else { i - 1 });
        app.search.list_state.select(Some(i));
      }
    }
    KeyCode::Esc => {
      app.search.focus = SearchFocus::Input;
    }
    _ => {}
  }
}

fn handle_details_key(app: &mut App, key: event::KeyEvent) {
  let editing = app.details.as_ref().is_some_and(|d| d.editing_note);
  if editing {
    handle_note_input_key(app, key);
    return;
  }

  match key.code {
    KeyCode::Left | KeyCode::Right => {
      if let Some(details) = app.details.as_mut() {
        details.tab =
          if details.tab == DetailsTab::Description { DetailsTab::Notes } else { DetailsTab::Description };
      }
    }
    KeyCode::Char('a') => {
      if let Some(details) = app.details.as_mut() {
        details.tab = DetailsTab::Notes;
        details.editing_note = true;
      }
    }
    KeyCode::Char('o') => {
      if let Some(url) = app.details.as_ref().map(|d| d.video.watch_url()) {
        open_in_browser(app, &url);
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      if let Some(details) = app.details.as_mut() {
        details.scroll = details.scroll.saturating_sub(1);
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      if let Some(details) = app.details.as_mut() {
        details.scroll = details.scroll.saturating_add(1);
      }
    }
    KeyCode::Esc => app.pop_screen(),
    _ => {}
  }
}

fn handle_settings_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char(' ') => app.toggle_reminder(),
    KeyCode::Esc => app.pop_screen(),
    _ => {}
  }
}

fn handle_note_input_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.add_note();
    }
    KeyCode::Esc => {
      if let Some(details) = app.details.as_mut() {
        details.note_input.clear();
        details.note_cursor = 0;
        details.editing_note = false;
      }
    }
    KeyCode::Char(c) => {
      if let Some(details) = app.details.as_mut() {
        let byte_idx = char_to_byte_index(&details.note_input, details.note_cursor);
        details.note_input.insert(byte_idx, c);
        details.note_cursor += 1;
      }
    }
    KeyCode::Backspace => {
      if let Some(details) = app.details.as_mut()
        && details.note_cursor > 0
      {
        details.note_cursor -= 1;
        let byte_idx = char_to_byte_index(&details.note_input, details.note_cursor);
        details.note_input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if let Some(details) = app.details.as_mut()
        && details.note_cursor < details.note_input.chars().count()
      {
        let byte_idx = char_to_byte_index(&details.note_input, details.note_cursor);
        details.note_input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      if let Some(details) = app.details.as_mut() {
        details.note_cursor = details.note_cursor.saturating_sub(1);
      }
    }
    KeyCode::Right => {
      if let Some(details) = app.details.as_mut()
        && details.note_cursor < details.note_input.chars().count()
      {
        details.note_cursor += 1;
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ratatui::crossterm::event::KeyEvent;

  fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn search_app() -> App {
    let mut app = App::new(Some("test-key".to_string()));
    app.finish_welcome();
    app.switch_tab();
    app
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- Key dispatch ---

  #[tokio::test]
  async fn typing_edits_the_query() {
    let mut app = search_app();
    for c in ['r', 'u', 's', 't'] {
      handle_key_event(&mut app, press(KeyCode::Char(c))).unwrap();
    }
    assert_eq!(app.search.query, "rust");
    assert_eq!(app.search.cursor, 4);

    handle_key_event(&mut app, press(KeyCode::Backspace)).unwrap();
    assert_eq!(app.search.query, "rus");
  }

  #[tokio::test]
  async fn escape_clears_query_then_leaves_search() {
    let mut app = search_app();
    handle_key_event(&mut app, press(KeyCode::Char('r'))).unwrap();
    handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
    assert_eq!(app.search.query, "");
    assert_eq!(app.screen(), Screen::Search);

    handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
    assert_eq!(app.screen(), Screen::Home);
  }

  #[tokio::test]
  async fn escape_quits_from_home() {
    let mut app = App::new(None);
    app.finish_welcome();
    handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn note_editing_captures_keys_until_cancelled() {
    let mut app = App::new(None);
    app.finish_welcome();
    app.open_details(crate::youtube::Video {
      video_id: "vid1".to_string(),
      title: "t".to_string(),
      description: String::new(),
      channel_title: "c".to_string(),
      published_at: "2024-01-01T00:00:00Z".to_string(),
      thumbnail_url: String::new(),
      view_count: None,
      like_count: None,
    });

    handle_key_event(&mut app, press(KeyCode::Char('a'))).unwrap();
    let details = app.details.as_ref().unwrap();
    assert!(details.editing_note);
    assert_eq!(details.tab, DetailsTab::Notes);

    handle_key_event(&mut app, press(KeyCode::Char('h'))).unwrap();
    handle_key_event(&mut app, press(KeyCode::Char('i'))).unwrap();
    assert_eq!(app.details.as_ref().unwrap().note_input, "hi");

    // Esc cancels the input instead of popping the screen.
    handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
    let details = app.details.as_ref().unwrap();
    assert!(!details.editing_note);
    assert_eq!(details.note_input, "");
    assert_eq!(app.screen(), Screen::Details);
  }
}
