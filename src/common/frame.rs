use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const FRAME_PREFIX: &str = "frame-";
pub const FRAME_EXTENSION: &str = "jpg";
/// Output pattern handed to the transcoder. Must agree with [`FramePath::new`].
pub const FRAME_PATTERN: &str = "frame-%04d.jpg";

/// A sampled still image on disk, identified by the sequence index in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePath {
    index: u32,
    path: PathBuf,
    file_name: String,
}

impl FramePath {
    pub fn new(dir: &Path, index: u32) -> Self {
        let file_name = format!("{FRAME_PREFIX}{index:04}.{FRAME_EXTENSION}");
        Self {
            index,
            path: dir.join(&file_name),
            file_name,
        }
    }

    /// Recognises `frame-<digits>.jpg`. Anything else is not a frame.
    pub fn parse(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let digits = file_name
            .strip_prefix(FRAME_PREFIX)?
            .strip_suffix(FRAME_EXTENSION)?
            .strip_suffix('.')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse().ok()?;
        Some(Self {
            index,
            path,
            file_name,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl PartialOrd for FramePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FramePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}
