use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, DetailsTab, Screen, SearchFocus};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Truncate and right-pad to exactly `width` characters.
fn pad_to_width(s: &str, width: usize) -> String {
  let truncated = truncate_str(s, width);
  let len = truncated.chars().count();
  format!("{}{}", truncated, " ".repeat(width.saturating_sub(len)))
}

/// Date portion of an RFC 3339 timestamp for list rows.
fn short_date(published_at: &str) -> String {
  chrono::DateTime::parse_from_rfc3339(published_at)
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|_| published_at.chars().take(10).collect())
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  match app.screen() {
    Screen::Welcome => render_welcome(frame, app.theme(), main_area),
    Screen::Home => render_home(frame, app, main_area),
    Screen::Search => render_search(frame, app, main_area),
    Screen::Details => render_details(frame, app, main_area),
    Screen::Settings => render_settings(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans =
    vec![Span::styled(" ▶ devtube ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if matches!(app.screen(), Screen::Home | Screen::Search) {
    let tab = |label: &str, active: bool| {
      if active {
        Span::styled(format!(" {} ", label), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))
      } else {
        Span::styled(format!(" {} ", label), Style::default().fg(theme.muted))
      }
    };
    spans.push(tab("Home", app.screen() == Screen::Home));
    spans.push(Span::styled("·", Style::default().fg(theme.muted)));
    spans.push(tab("Search", app.screen() == Screen::Search));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  Welcome to devtube", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Browse developer videos. Take notes. In the terminal.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Press Enter to get started.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered()
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

// --- Home ---

const CARD_WIDTH: usize = 30;

fn render_home(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let rail_count = app.home.rails.len().max(1) as u16;
  let rail_height = (area.height / rail_count).clamp(3, 6);
  let constraints: Vec<Constraint> = app.home.rails.iter().map(|_| Constraint::Length(rail_height)).collect();
  let rail_areas = Layout::vertical(constraints).split(area);

  for (idx, rail_area) in rail_areas.iter().enumerate() {
    let Some(rail) = app.home.rails.get(idx) else { continue };
    let focused = idx == app.home.selected_rail;
    let border_color = if focused { theme.accent } else { theme.border };

    let mut title = vec![Span::styled(
      format!(" {} ", rail.category),
      Style::default().fg(border_color).add_modifier(Modifier::BOLD),
    )];
    if focused && !rail.videos.is_empty() {
      title.push(Span::styled("Show more (s) ", Style::default().fg(theme.muted)));
    }

    let block = Block::bordered()
      .title(Line::from(title))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(border_color));
    let inner = block.inner(*rail_area);
    frame.render_widget(block, *rail_area);

    if rail.loading {
      frame.render_widget(Paragraph::new(" Loading…").style(Style::default().fg(theme.muted)), inner);
      continue;
    }
    if rail.videos.is_empty() {
      frame.render_widget(Paragraph::new(" No videos.").style(Style::default().fg(theme.muted)), inner);
      continue;
    }

    render_rail_cards(frame, theme, rail, focused, inner);
  }
}

/// Render one rail as a horizontal strip of fixed-width cards, windowed so
/// the selected card stays visible.
fn render_rail_cards(frame: &mut Frame, theme: &Theme, rail: &crate::app::Rail, focused: bool, area: Rect) {
  let visible = ((area.width as usize) / CARD_WIDTH).max(1);
  let start = rail.selected.saturating_sub(visible.saturating_sub(1));
  let card_text_w = CARD_WIDTH - 2;

  let mut title_spans: Vec<Span> = Vec::new();
  let mut meta_spans: Vec<Span> = Vec::new();
  for (offset, video) in rail.videos.iter().enumerate().skip(start).take(visible) {
    let selected = focused && offset == rail.selected;
    let title_style = if selected {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg)
    };
    title_spans.push(Span::styled(format!(" {}", pad_to_width(&video.title, card_text_w)), title_style));
    title_spans.push(Span::raw(" "));

    let views = video.view_count.as_deref().map(|v| format!("{} views", v)).unwrap_or_default();
    let meta = if views.is_empty() {
      video.channel_title.clone()
    } else {
      format!("{} — {}", video.channel_title, views)
    };
    meta_spans.push(Span::styled(format!(" {}", pad_to_width(&meta, card_text_w)), Style::default().fg(theme.muted)));
    meta_spans.push(Span::raw(" "));
  }

  let lines = vec![Line::from(title_spans), Line::from(meta_spans)];
  frame.render_widget(Paragraph::new(lines), area);
}

// --- Search ---

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let [input_area, meta_area, results_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Length(1), Constraint::Min(1)]).areas(area);

  render_search_input(frame, app, input_area);
  render_search_meta(frame, app, meta_area);
  render_search_results(frame, app, results_area);
}

fn render_search_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.search.focus == SearchFocus::Input;
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search videos ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.search.query, app.search.cursor);

  if cursor_col < app.search.scroll {
    app.search.scroll = cursor_col;
  } else if cursor_col >= app.search.scroll + inner_w {
    app.search.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .search
    .query
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.search.scroll)
    .take_while(|(start, _, _)| *start < app.search.scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - app.search.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_search_meta(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = if let Some((ref query, _)) = app.search.results_for {
    format!(" {} results found for \"{}\"", app.search.results.len(), query)
  } else {
    String::new()
  };
  frame.render_widget(Paragraph::new(left).style(Style::default().fg(theme.muted)), area);

  let sort_label = format!("Sort: {} (^s) ", app.search.sort.label());
  let right_area = Rect {
    x: area.x + area.width.saturating_sub(sort_label.len() as u16),
    width: sort_label.len().min(area.width as usize) as u16,
    ..area
  };
  frame.render_widget(
    Paragraph::new(sort_label).style(Style::default().fg(theme.accent)),
    right_area,
  );
}

fn render_search_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .search
    .results
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = app.search.focus == SearchFocus::Results && Some(i) == app.search.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let title = truncate_str(&video.title, inner_w);
      let views = video.view_count.as_deref().map(|v| format!("{} views", v)).unwrap_or_default();
      let meta = if views.is_empty() {
        format!("{}  {}", video.channel_title, short_date(&video.published_at))
      } else {
        format!("{}  {}  {}", video.channel_title, views, short_date(&video.published_at))
      };
      let lines = vec![
        Line::from(Span::styled(title, Style::default().fg(fg))),
        Line::from(Span::styled(truncate_str(&meta, inner_w), Style::default().fg(theme.muted))),
      ];
      ListItem::new(lines).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(" Results ")
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.search.list_state);
}

// --- Details ---

fn render_details(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(details) = app.details.as_mut() else {
    return;
  };

  let [title_area, tabs_area, content_area] =
    Layout::vertical([Constraint::Length(4), Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let inner_w = title_area.width.saturating_sub(4) as usize;
  let views = details.video.view_count.as_deref().unwrap_or("–");
  let likes = details.video.like_count.as_deref().unwrap_or("–");
  let header_lines = vec![
    Line::from(Span::styled(
      truncate_str(&details.video.title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(vec![
      Span::styled(details.video.channel_title.clone(), Style::default().fg(theme.accent)),
      Span::styled(
        format!("  {}  {} views  {} likes", short_date(&details.video.published_at), views, likes),
        Style::default().fg(theme.muted),
      ),
    ]),
  ];
  frame.render_widget(
    Paragraph::new(header_lines).block(
      Block::bordered()
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .padding(Padding::horizontal(1)),
    ),
    title_area,
  );

  let tab = |label: &str, active: bool| {
    if active {
      Span::styled(format!(" {} ", label), Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg))
    } else {
      Span::styled(format!(" {} ", label), Style::default().fg(theme.muted))
    }
  };
  let tabs = Line::from(vec![
    Span::raw(" "),
    tab("Description", details.tab == DetailsTab::Description),
    Span::raw(" "),
    tab(&format!("Notes ({})", details.notes.len()), details.tab == DetailsTab::Notes),
  ]);
  frame.render_widget(tabs, tabs_area);

  match details.tab {
    DetailsTab::Description => {
      let mut lines: Vec<Line> = if details.video.description.is_empty() {
        vec![Line::from(Span::styled("No description.", Style::default().fg(theme.muted)))]
      } else {
        details.video.description.lines().map(|l| Line::from(l.to_string())).collect()
      };
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(
        details.video.watch_url(),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      )));
      if !details.video.thumbnail_url.is_empty() {
        lines.push(Line::from(Span::styled(details.video.thumbnail_url.clone(), Style::default().fg(theme.muted))));
      }
      let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg))
        .wrap(Wrap { trim: false })
        .scroll((details.scroll, 0))
        .block(
          Block::bordered()
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(Style::default().fg(theme.border))
            .padding(Padding::horizontal(1)),
        );
      frame.render_widget(paragraph, content_area);
    }
    DetailsTab::Notes => render_notes(frame, theme, details, content_area),
  }
}

fn render_notes(frame: &mut Frame, theme: &Theme, details: &crate::app::DetailsState, area: Rect) {
  let [list_area, input_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(area);

  let inner_w = list_area.width.saturating_sub(4) as usize;
  let lines: Vec<Line> = if details.notes.is_empty() {
    vec![Line::from(Span::styled("No notes yet. Press 'a' to add one.", Style::default().fg(theme.muted)))]
  } else {
    details
      .notes
      .iter()
      .map(|note| {
        let date = short_date(&note.created_at);
        let text_w = inner_w.saturating_sub(date.chars().count() + 2);
        Line::from(vec![
          Span::styled(truncate_str(&note.text, text_w), Style::default().fg(theme.fg)),
          Span::raw("  "),
          Span::styled(date, Style::default().fg(theme.muted)),
        ])
      })
      .collect()
  };
  frame.render_widget(
    Paragraph::new(lines).block(
      Block::bordered()
        .title(" Notes ")
        .title_style(Style::default().fg(theme.accent))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .padding(Padding::horizontal(1)),
    ),
    list_area,
  );

  let (title, border_color) = if details.editing_note {
    (" Add note — Enter to save, Esc to cancel ", theme.accent)
  } else {
    (" Add note (a) ", theme.border)
  };
  let input = Paragraph::new(details.note_input.as_str()).style(Style::default().fg(theme.fg)).block(
    Block::bordered()
      .title(title)
      .title_style(Style::default().fg(border_color))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(border_color))
      .padding(Padding::horizontal(1)),
  );
  frame.render_widget(input, input_area);

  if details.editing_note {
    let cursor_col = display_width(&details.note_input, details.note_cursor);
    frame.set_cursor_position((input_area.x + 2 + cursor_col as u16, input_area.y + 1));
  }
}

// --- Settings ---

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let switch = if app.config.reminder_enabled {
    Span::styled(" ON ", Style::default().fg(theme.highlight_fg).bg(theme.accent).add_modifier(Modifier::BOLD))
  } else {
    Span::styled(" OFF ", Style::default().fg(theme.muted).add_modifier(Modifier::BOLD))
  };

  let lines = vec![
    Line::from(""),
    Line::from(Span::styled("  ● John Doe", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("  Learning reminders", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(vec![
      Span::styled(format!("  Repeat everyday at: {}  ", app.config.repeat_time()), Style::default().fg(theme.fg)),
      switch,
      Span::styled("  (Space to toggle)", Style::default().fg(theme.muted)),
    ]),
    Line::from(""),
    Line::from(Span::styled(
      "  You will receive a friendly reminder to remember to study.",
      Style::default().fg(theme.muted),
    )),
  ];
  let paragraph = Paragraph::new(lines).block(
    Block::bordered()
      .title(" Settings ")
      .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

// --- Status / footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.screen() {
    Screen::Welcome => vec![("Enter", "Start"), ("^t", "Theme"), ("Esc", "Quit")],
    Screen::Home => vec![
      ("←→", "Browse"),
      ("↑↓", "Rail"),
      ("Enter", "Open"),
      ("s", "Show more"),
      ("Tab", "Search"),
      ("g", "Settings"),
      ("Esc", "Quit"),
    ],
    Screen::Search => match app.search.focus {
      SearchFocus::Input => vec![("Enter", "Search"), ("^s", "Sort"), ("↓", "Results"), ("Tab", "Home")],
      SearchFocus::Results => vec![("Enter", "Open"), ("j/k", "Navigate"), ("^s", "Sort"), ("Esc", "Input")],
    },
    Screen::Details => {
      let editing = app.details.as_ref().is_some_and(|d| d.editing_note);
      if editing {
        vec![("Enter", "Save note"), ("Esc", "Cancel")]
      } else {
        vec![("←→", "Tab"), ("a", "Add note"), ("o", "Browser"), ("Esc", "Back")]
      }
    }
    Screen::Settings => vec![("Space", "Toggle"), ("Esc", "Back")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
