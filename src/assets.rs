//! Level pack loading
//!
//! A level pack is a directory:
//!
//! ```text
//! levels/<id>.json    LevelData
//! styles/<id>.json    StyleData
//! music/<id>.json     MusicData
//! scripts/<file>      Rhai source referenced by a level's `script_file`
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::data::{LevelData, MusicData, StyleData};
use crate::script::ScriptError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {kind} `{id}`: {source}")]
    Parse {
        kind: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Source of level data by id
pub trait AssetProvider {
    fn level(&self, id: &str) -> Result<LevelData, LoadError>;
    fn style(&self, id: &str) -> Result<StyleData, LoadError>;
    fn music(&self, id: &str) -> Result<MusicData, LoadError>;
    fn script(&self, file: &str) -> Result<String, LoadError>;
}

/// Assets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    levels: HashMap<String, LevelData>,
    styles: HashMap<String, StyleData>,
    music: HashMap<String, MusicData>,
    scripts: HashMap<String, String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, id: impl Into<String>, level: LevelData) -> Self {
        self.levels.insert(id.into(), level);
        self
    }

    pub fn with_style(mut self, id: impl Into<String>, style: StyleData) -> Self {
        self.styles.insert(id.into(), style);
        self
    }

    pub fn with_music(mut self, id: impl Into<String>, music: MusicData) -> Self {
        self.music.insert(id.into(), music);
        self
    }

    pub fn with_script(mut self, file: impl Into<String>, source: impl Into<String>) -> Self {
        self.scripts.insert(file.into(), source.into());
        self
    }
}

fn lookup<T: Clone>(map: &HashMap<String, T>, kind: &'static str, id: &str) -> Result<T, LoadError> {
    map.get(id).cloned().ok_or_else(|| LoadError::NotFound {
        kind,
        id: id.to_string(),
    })
}

impl AssetProvider for MemoryAssets {
    fn level(&self, id: &str) -> Result<LevelData, LoadError> {
        lookup(&self.levels, "level", id)
    }

    fn style(&self, id: &str) -> Result<StyleData, LoadError> {
        lookup(&self.styles, "style", id)
    }

    fn music(&self, id: &str) -> Result<MusicData, LoadError> {
        lookup(&self.music, "music", id)
    }

    fn script(&self, file: &str) -> Result<String, LoadError> {
        lookup(&self.scripts, "script", file)
    }
}

/// Assets read from a level pack directory
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids of every level in the pack, sorted
    pub fn level_ids(&self) -> Result<Vec<String>, LoadError> {
        let dir = self.root.join("levels");
        let entries = std::fs::read_dir(&dir).map_err(|source| LoadError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn read(&self, kind: &'static str, path: PathBuf, id: &str) -> Result<String, LoadError> {
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound {
                kind,
                id: id.to_string(),
            }),
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, kind: &'static str, dir: &str, id: &str) -> Result<T, LoadError> {
        let path = self.root.join(dir).join(format!("{}.json", id));
        let text = self.read(kind, path, id)?;
        serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            kind,
            id: id.to_string(),
            source,
        })
    }
}

impl AssetProvider for DirAssets {
    fn level(&self, id: &str) -> Result<LevelData, LoadError> {
        let mut level: LevelData = self.read_json("level", "levels", id)?;
        if level.id.is_empty() {
            level.id = id.to_string();
        }
        Ok(level)
    }

    fn style(&self, id: &str) -> Result<StyleData, LoadError> {
        self.read_json("style", "styles", id)
    }

    fn music(&self, id: &str) -> Result<MusicData, LoadError> {
        self.read_json("music", "music", id)
    }

    fn script(&self, file: &str) -> Result<String, LoadError> {
        // Scripts must stay inside the pack
        let relative = Path::new(file);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(LoadError::NotFound {
                kind: "script",
                id: file.to_string(),
            });
        }
        self.read("script", self.root.join("scripts").join(relative), file)
    }
}
