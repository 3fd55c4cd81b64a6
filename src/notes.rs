use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::path::PathBuf;
use tracing::warn;

use crate::constants::constants;

/// One note in a per-video append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
  /// Per-video sequence number; replay drops duplicates by this value.
  pub seq: u64,
  pub text: String,
  /// RFC 3339 creation timestamp.
  pub created_at: String,
}

impl Note {
  /// Build a note from raw input. Returns `None` for whitespace-only text.
  pub fn create(seq: u64, text: &str) -> Option<Self> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    Some(Self { seq, text: text.to_string(), created_at: Utc::now().to_rfc3339() })
  }
}

/// The sequence number the next appended note should carry.
pub fn next_seq(existing: &[Note]) -> u64 {
  existing.iter().map(|n| n.seq + 1).max().unwrap_or(0)
}

/// Per-video note storage under the platform data directory.
///
/// Each video gets one `notes_<videoId>.jsonl` file holding one JSON
/// record per line. Appending a note writes a single line; loading
/// replays the log in order, skipping corrupt lines and duplicate
/// sequence numbers. Notes are never edited or deleted.
pub struct NoteStore {
  dir: PathBuf,
}

impl NoteStore {
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  /// The store rooted at the platform data dir, or `None` when no home
  /// directory can be resolved (notes then live only in memory).
  pub fn open_default() -> Option<Self> {
    let proj_dirs = ProjectDirs::from("", "", "devtube")?;
    Some(Self::new(proj_dirs.data_dir().join("notes")))
  }

  fn log_path(&self, video_id: &str) -> PathBuf {
    self.dir.join(format!("{}{}.jsonl", constants().notes_file_prefix, video_id))
  }

  /// Replay the log for a video. A missing file yields an empty list; a
  /// corrupt line or duplicate sequence number is skipped with a warning.
  pub fn load(&self, video_id: &str) -> Vec<Note> {
    let path = self.log_path(video_id);
    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
      Err(e) => {
        warn!(video_id = %video_id, err = %e, "notes: failed to read log");
        return Vec::new();
      }
    };

    let mut seen = std::collections::HashSet::new();
    let mut notes = Vec::new();
    for line in content.lines() {
      if line.trim().is_empty() {
        continue;
      }
      match serde_json::from_str::<Note>(line) {
        Ok(note) => {
          if seen.insert(note.seq) {
            notes.push(note);
          }
        }
        Err(e) => {
          warn!(video_id = %video_id, err = %e, "notes: skipping corrupt log line");
        }
      }
    }
    notes
  }

  /// Trim and append a note for a video. Returns `None` for
  /// whitespace-only text. The returned note is already persisted when
  /// possible; a failed write is logged and the note is still returned,
  /// so the in-memory list stays ahead of the log until the next run.
  pub fn append(&self, video_id: &str, existing: &[Note], text: &str) -> Option<Note> {
    let note = Note::create(next_seq(existing), text)?;
    if let Err(e) = self.persist(video_id, &note) {
      warn!(video_id = %video_id, err = %e, "notes: failed to persist note");
    }
    Some(note)
  }

  fn persist(&self, video_id: &str, note: &Note) -> std::io::Result<()> {
    std::fs::create_dir_all(&self.dir)?;
    let line = serde_json::to_string(note).map_err(std::io::Error::other)?;
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(self.log_path(video_id))?;
    writeln!(file, "{}", line)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn store(dir: &tempfile::TempDir) -> NoteStore {
    NoteStore::new(dir.path().join("notes"))
  }

  #[test]
  fn whitespace_only_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    assert!(store.append("vid1", &[], "   ").is_none());
    assert!(store.append("vid1", &[], "\t\n").is_none());
    assert!(store.load("vid1").is_empty());
  }

  #[test]
  fn append_trims_and_survives_reload() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    let note = store.append("vid1", &[], "  remember the borrow checker  ").unwrap();
    assert_eq!(note.text, "remember the borrow checker");
    assert_eq!(note.seq, 0);

    let loaded = store.load("vid1");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "remember the borrow checker");
  }

  #[test]
  fn sequence_advances_and_order_is_preserved() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    let mut notes = Vec::new();
    for text in ["first", "second", "third"] {
      let note = store.append("vid1", &notes, text).unwrap();
      notes.push(note);
    }
    let loaded = store.load("vid1");
    assert_eq!(loaded.iter().map(|n| n.text.as_str()).collect::<Vec<_>>(), vec!["first", "second", "third"]);
    assert_eq!(loaded.iter().map(|n| n.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
  }

  #[test]
  fn notes_are_scoped_per_video() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    store.append("vid1", &[], "about vid1").unwrap();
    store.append("vid2", &[], "about vid2").unwrap();
    assert_eq!(store.load("vid1").len(), 1);
    assert_eq!(store.load("vid2").len(), 1);
    assert_eq!(store.load("vid3").len(), 0);
  }

  #[test]
  fn replay_is_idempotent_on_duplicate_records() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    let note = store.append("vid1", &[], "only once").unwrap();
    // Simulate a replayed append by writing the same record again.
    store.persist("vid1", &note).unwrap();
    let loaded = store.load("vid1");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "only once");
  }

  #[test]
  fn corrupt_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let store = store(&dir);
    store.append("vid1", &[], "good").unwrap();
    std::fs::write(
      store.log_path("vid1"),
      "{\"seq\":0,\"text\":\"good\",\"created_at\":\"2024-01-01T00:00:00Z\"}\nnot json\n",
    )
    .unwrap();
    let loaded = store.load("vid1");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "good");
  }
}
