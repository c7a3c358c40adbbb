//! Script persistence
//!
//! Scripts are written as `<n>.txt` into the output directory, numbered one
//! past the highest existing script. Files are written through a temporary
//! file and linked into place without ever replacing an existing script.

use crate::recorder::buffer::SessionBuffer;
use crate::recorder::channel::RecordingResult;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Markers of window-activation lines older scripts carried
pub const WINDOW_ARTIFACTS: [&str; 4] = ["tt :=", "WinWait", "WinActive", "WinActivate"];

/// A successfully written script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedScript {
    pub path: PathBuf,
    pub file_name: String,
    pub sequence: u64,
    pub lines: usize,
}

fn is_sleep_line(line: &str) -> bool {
    line.trim_start_matches(';').starts_with("Sleep,")
}

/// True for `Send, {<key> Down|Up}` lines naming `key`.
fn references_key(line: &str, key: &str) -> bool {
    let Some(start) = line.find('{') else {
        return false;
    };
    let Some(end) = line[start..].find('}') else {
        return false;
    };
    let token = &line[start + 1..start + end];
    let name = token.rsplit_once(' ').map_or(token, |(name, _)| name);
    name.eq_ignore_ascii_case(key)
}

fn is_window_artifact(line: &str) -> bool {
    WINDOW_ARTIFACTS.iter().any(|marker| line.contains(marker))
}

/// Drop hotkey lines, the `Sleep` lines around them and window-activation
/// artifacts. Order is preserved and applying it twice changes nothing.
pub fn filter_lines(lines: &[String], hotkey: &str) -> Vec<String> {
    let mut keep = vec![true; lines.len()];
    let is_hotkey: Vec<bool> = lines.iter().map(|line| references_key(line, hotkey)).collect();

    let mut i = 0;
    while i < lines.len() {
        if !is_hotkey[i] {
            if is_window_artifact(&lines[i]) {
                keep[i] = false;
            }
            i += 1;
            continue;
        }
        let run_start = i;
        while i < lines.len() && is_hotkey[i] {
            keep[i] = false;
            i += 1;
        }
        if run_start > 0 && is_sleep_line(&lines[run_start - 1]) {
            keep[run_start - 1] = false;
        }
        if i < lines.len() && is_sleep_line(&lines[i]) {
            keep[i] = false;
            i += 1;
        }
    }

    lines
        .iter()
        .zip(keep)
        .filter_map(|(line, keep)| keep.then(|| line.clone()))
        .collect()
}

/// Next free script number: one past the highest `<n>.txt` file in `dir`.
pub fn scan_next_sequence(dir: &Path) -> std::io::Result<u64> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(e),
    };

    let mut highest = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(number) = name
            .to_str()
            .and_then(|n| n.strip_suffix(".txt"))
            .and_then(|n| n.parse::<u64>().ok())
        else {
            continue;
        };
        highest = highest.max(number);
    }
    Ok(highest + 1)
}

fn header_path(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

pub struct Persister {
    dir: PathBuf,
    next_sequence: u64,
}

impl Persister {
    pub fn new(dir: impl Into<PathBuf>) -> RecordingResult<Self> {
        let dir = dir.into();
        let next_sequence = scan_next_sequence(&dir)?;
        tracing::info!("Scripts go to {:?}, next is {}.txt", dir, next_sequence);
        Ok(Self { dir, next_sequence })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Pick up scripts written by someone else since the last scan.
    pub fn refresh(&mut self) -> RecordingResult<u64> {
        self.next_sequence = self.next_sequence.max(scan_next_sequence(&self.dir)?);
        Ok(self.next_sequence)
    }

    /// Filter and write the buffer; advances the sequence only on success.
    pub fn persist(
        &mut self,
        buffer: &SessionBuffer,
        hotkey: &str,
    ) -> RecordingResult<SavedScript> {
        let lines = filter_lines(&buffer.render(), hotkey);
        self.write(&lines)
    }

    pub fn write(&mut self, lines: &[String]) -> RecordingResult<SavedScript> {
        std::fs::create_dir_all(&self.dir)?;
        let sequence = self.next_sequence.max(scan_next_sequence(&self.dir)?);
        let file_name = format!("{}.txt", sequence);
        let path = self.dir.join(&file_name);

        let mut output = String::new();
        output.push('@');
        output.push_str(&header_path(&path));
        output.push('\n');
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(output.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| e.error)?;

        self.next_sequence = sequence + 1;
        tracing::info!("Saved {} lines to {:?}", lines.len(), path);

        Ok(SavedScript {
            path,
            file_name,
            sequence,
            lines: lines.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::encoder::CommandLine;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_removes_hotkey_and_adjacent_sleeps() {
        let lines = strings(&[
            "Click, 1, 1 Left, , Down",
            "Sleep, 900",
            "Send, {F6 Down}",
            "Send, {f6 Up}",
            ";Sleep, 300",
            "Send, {a Down}",
            "Sleep, 120",
            "Send, {F60 Down}",
        ]);
        assert_eq!(
            filter_lines(&lines, "F6"),
            strings(&[
                "Click, 1, 1 Left, , Down",
                "Send, {a Down}",
                "Sleep, 120",
                "Send, {F60 Down}"
            ])
        );
    }

    #[test]
    fn test_filter_removes_window_artifacts() {
        let lines = strings(&["tt := Untitled", "WinWait, %tt%", "Sleep, 60", "MouseWheel up"]);
        assert_eq!(filter_lines(&lines, "F6"), strings(&["Sleep, 60", "MouseWheel up"]));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let lines = strings(&[
            "Sleep, 70",
            "Send, {F6 Down}",
            "Sleep, 80",
            "Sleep, 90",
            "IfWinActive, x",
            "Send, {F6 Up}",
            "Click, 3, 4, 0",
        ]);
        let once = filter_lines(&lines, "F6");
        let twice = filter_lines(&once, "F6");
        assert_eq!(once, twice);
        assert_eq!(once, strings(&["Sleep, 90", "Click, 3, 4, 0"]));
    }

    #[test]
    fn test_sequence_starts_past_highest_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.txt", "2.txt", "7.txt", "notes.txt", "8.md"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("9.txt")).unwrap();
        assert_eq!(scan_next_sequence(dir.path()).unwrap(), 8);
        assert_eq!(scan_next_sequence(&dir.path().join("missing")).unwrap(), 1);
    }

    #[test]
    fn test_failed_write_does_not_advance() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=3 {
            std::fs::write(dir.path().join(format!("{}.txt", n)), "x").unwrap();
        }
        let mut persister = Persister::new(dir.path()).unwrap();
        assert_eq!(persister.next_sequence(), 4);

        let mut buffer = SessionBuffer::new();
        buffer.append(CommandLine::Key {
            name: "a".to_string(),
            pressed: true,
        });

        // A directory squatting on 4.txt makes the final link fail
        std::fs::create_dir(dir.path().join("4.txt")).unwrap();
        assert!(persister.persist(&buffer, "F6").is_err());
        assert_eq!(persister.next_sequence(), 4);

        std::fs::remove_dir(dir.path().join("4.txt")).unwrap();
        let saved = persister.persist(&buffer, "F6").unwrap();
        assert_eq!(saved.file_name, "4.txt");
        assert_eq!(persister.next_sequence(), 5);
    }

    #[test]
    fn test_written_file_has_header_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = Persister::new(dir.path().join("scripts")).unwrap();
        let saved = persister
            .write(&strings(&["Sleep, 60", "MouseWheel down"]))
            .unwrap();

        let content = std::fs::read_to_string(&saved.path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('@'));
        assert!(lines[0].ends_with("/scripts/1.txt"));
        assert!(!lines[0].contains('\\'));
        assert_eq!(&lines[1..], &["Sleep, 60", "MouseWheel down"]);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_existing_script_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = Persister::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("1.txt"), "keep me").unwrap();

        let saved = persister.write(&strings(&["MouseWheel up"])).unwrap();
        assert_eq!(saved.sequence, 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("1.txt")).unwrap(), "keep me");
    }
}
