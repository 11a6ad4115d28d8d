//! The persisted `.env` representation.
//!
//! The file is regenerated from scratch on every write: header, then one
//! labelled section per category. Output is a pure function of the entries
//! and the timestamp, so two writes of the same values differ only in the
//! `# Updated:` line.
//!
//! Values are quoted where needed so that `dotenvy` reads back exactly what
//! was written.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::settings::keys::{self, Category};

/// First header line, identifying the file.
pub const FILE_IDENTITY: &str = "# kiro2api configuration file";

/// Prefix of the header line carrying the write time.
pub const TIMESTAMP_PREFIX: &str = "# Updated: ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An assembled persisted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    lines: Vec<String>,
}

impl PersistedFile {
    /// Build the file from resolved values.
    ///
    /// A key mapped to `None` has no line at all (used for tokens that have
    /// no value to carry forward). Keys missing from `values` are written empty.
    pub fn render(values: &HashMap<&'static str, Option<String>>, updated_at: NaiveDateTime) -> Self {
        let mut lines = vec![
            FILE_IDENTITY.to_string(),
            format!("{}{}", TIMESTAMP_PREFIX, updated_at.format(TIMESTAMP_FORMAT)),
        ];

        for category in Category::ALL {
            lines.push(String::new());
            lines.push(category.label().to_string());
            for setting in keys::in_category(category) {
                match values.get(setting.key) {
                    Some(None) => {}
                    Some(Some(value)) => {
                        lines.push(format!("{}={}", setting.key, encode_value(value)))
                    }
                    None => lines.push(format!("{}=", setting.key)),
                }
            }
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// File content: lines joined by `\n`, no trailing newline.
    pub fn contents(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace whatever is at `path` with this file.
    ///
    /// The content goes to a sibling temp file first, is synced, then renamed
    /// over `path`. On error the previous file is left as it was.
    pub fn write_to(&self, path: &Path) -> io::Result<String> {
        let contents = self.contents();
        let temp = temp_path(path)?;

        let result = File::create(&temp).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, path)
        });
        if let Err(e) = result {
            if temp.is_file() {
                let _ = fs::remove_file(&temp);
            }
            return Err(e);
        }

        Ok(contents)
    }
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "settings path has no file name")
    })?;
    let mut temp = name.to_os_string();
    temp.push(".tmp");
    Ok(path.with_file_name(temp))
}

/// Render a value so `dotenvy` parses it back unchanged.
///
/// Plain values are written bare. Anything with whitespace, `$`, `#`, quotes
/// or backslashes is single-quoted, which `dotenvy` takes literally. Values
/// that themselves contain `'` or `\` are double-quoted with `\`, `"` and
/// `$` escaped.
pub fn encode_value(value: &str) -> Cow<'_, str> {
    let needs_quoting = |c: char| c.is_whitespace() || matches!(c, '$' | '#' | '\'' | '"' | '\\');
    if !value.contains(needs_quoting) {
        return Cow::Borrowed(value);
    }
    if !value.contains(['\'', '\\']) {
        return Cow::Owned(format!("'{}'", value));
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
