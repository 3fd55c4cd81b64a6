use ratatui::style::Color;

/// A named color theme. Cycled with Ctrl+T; the choice persists in the config file.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "slate",
    bg: Color::Rgb(24, 26, 32),
    fg: Color::Rgb(220, 223, 228),
    accent: Color::Rgb(97, 175, 239),
    muted: Color::Rgb(110, 118, 129),
    border: Color::Rgb(58, 63, 75),
    status: Color::Rgb(152, 195, 121),
    error: Color::Rgb(224, 108, 117),
    highlight_fg: Color::Rgb(24, 26, 32),
    highlight_bg: Color::Rgb(97, 175, 239),
    stripe_bg: Color::Rgb(30, 33, 40),
    key_fg: Color::Rgb(24, 26, 32),
    key_bg: Color::Rgb(110, 118, 129),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 248, 243),
    fg: Color::Rgb(45, 52, 64),
    accent: Color::Rgb(191, 97, 106),
    muted: Color::Rgb(144, 144, 138),
    border: Color::Rgb(210, 205, 195),
    status: Color::Rgb(76, 125, 89),
    error: Color::Rgb(180, 60, 60),
    highlight_fg: Color::Rgb(250, 248, 243),
    highlight_bg: Color::Rgb(191, 97, 106),
    stripe_bg: Color::Rgb(243, 240, 233),
    key_fg: Color::Rgb(250, 248, 243),
    key_bg: Color::Rgb(144, 144, 138),
  },
  Theme {
    name: "mono",
    bg: Color::Black,
    fg: Color::Gray,
    accent: Color::White,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    status: Color::Gray,
    error: Color::White,
    highlight_fg: Color::Black,
    highlight_bg: Color::Gray,
    stripe_bg: Color::Black,
    key_fg: Color::Black,
    key_bg: Color::DarkGray,
  },
];
