use crate::error::{PracticeError, Result};
use crate::wordset::Wordset;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::fs;
use std::path::Path;

static LANG_DIR: Dir = include_dir!("src/lang");

/// A named word list, either built in or read from a user file.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    /// Look up a built-in list such as `english`.
    pub fn builtin(name: &str) -> Result<Self> {
        let file = LANG_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| PracticeError::UnknownLanguage {
                name: name.to_string(),
            })?;
        let contents = file.contents_utf8().ok_or_else(|| PracticeError::UnknownLanguage {
            name: name.to_string(),
        })?;
        Ok(serde_json::from_str(contents)?)
    }

    /// Names of every built-in list, sorted.
    pub fn builtin_names() -> Vec<String> {
        let mut names: Vec<String> = LANG_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|f| f.path().file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Read a plain text list with one word per line. Blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Ok(Self::from_lines(name, &text))
    }

    pub fn from_lines(name: impl Into<String>, text: &str) -> Self {
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            name: name.into(),
            size: words.len() as u32,
            words,
        }
    }

    /// The first `count` words, the whole list when `count` is `None`.
    pub fn wordset(&self, count: Option<usize>) -> Wordset {
        let take = count.unwrap_or(self.words.len());
        Wordset::new(self.words.iter().take(take).cloned().collect())
    }
}
