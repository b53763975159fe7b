// In-memory script document with dirty tracking and async load/save.

use std::path::{Path, PathBuf};

use scriptpad_common::script::{self, CodecError, LineEnding};
use scriptpad_common::types::{ScriptConfig, ScriptKind};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Extension used for scripts saved into the scripts directory.
pub const SCRIPT_FILE_EXTENSION: &str = "spad";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("script {id} has no file path; cannot save")]
    UnsetPath { id: Uuid },

    #[error("failed to access script file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script file {} already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("invalid script file {}: {source}", .path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// A user script. `name` is always derived from `file_path` and is never
/// written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDocument {
    id: Uuid,
    name: String,
    file_path: Option<PathBuf>,
    config: ScriptConfig,
    code: String,
    dirty: bool,
    line_ending: LineEnding,
}

impl ScriptDocument {
    /// A new, unsaved script with a fresh identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            file_path: None,
            config: ScriptConfig::default(),
            code: String::new(),
            dirty: false,
            line_ending: LineEnding::default(),
        }
    }

    /// Read and decode a script file. No document is produced on failure.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Io { path: path.to_path_buf(), source })?;
        let parsed = script::parse(&text)
            .map_err(|source| DocumentError::Codec { path: path.to_path_buf(), source })?;

        debug!(script_id = %parsed.id, path = %path.display(), "script loaded");
        Ok(Self {
            id: parsed.id,
            name: name_from_path(path),
            file_path: Some(path.to_path_buf()),
            config: parsed.config,
            code: parsed.code,
            dirty: false,
            line_ending: parsed.line_ending,
        })
    }

    /// Write the script to its file path. The dirty flag is cleared only
    /// after the write succeeded.
    pub async fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.file_path.clone().ok_or(DocumentError::UnsetPath { id: self.id })?;
        let text = self.serialize().map_err(|source| DocumentError::Codec { path: path.clone(), source })?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| DocumentError::Io { path: path.clone(), source })?;

        self.dirty = false;
        debug!(script_id = %self.id, path = %path.display(), "script saved");
        Ok(())
    }

    /// Write the script to `path` and adopt it as the document's file. The
    /// path and name only change if the write succeeded.
    pub async fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), DocumentError> {
        self.write_and_adopt(path.into(), false).await
    }

    /// Like `save_as`, but fails with `AlreadyExists` instead of replacing a
    /// file that is already at `path`.
    pub async fn save_new(&mut self, path: impl Into<PathBuf>) -> Result<(), DocumentError> {
        self.write_and_adopt(path.into(), true).await
    }

    async fn write_and_adopt(&mut self, path: PathBuf, create_new: bool) -> Result<(), DocumentError> {
        let text = self.serialize().map_err(|source| DocumentError::Codec { path: path.clone(), source })?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DocumentError::Io { path: path.clone(), source })?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if create_new {
            options.create_new(true);
        } else {
            options.create(true).truncate(true);
        }
        let mut file = options.open(&path).await.map_err(|source| match source.kind() {
            std::io::ErrorKind::AlreadyExists => DocumentError::AlreadyExists { path: path.clone() },
            _ => DocumentError::Io { path: path.clone(), source },
        })?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|source| DocumentError::Io { path: path.clone(), source })?;
        file.flush().await.map_err(|source| DocumentError::Io { path: path.clone(), source })?;

        debug!(script_id = %self.id, path = %path.display(), "script saved to new path");
        self.set_file_path(path);
        self.dirty = false;
        Ok(())
    }

    /// File contents as they would be saved.
    pub fn serialize(&self) -> Result<String, CodecError> {
        script::serialize(self.id, &self.config, &self.code, self.line_ending)
    }

    /// Point the document at a new file and rename it accordingly. Does not
    /// change the dirty state.
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.name = name_from_path(&path);
        self.file_path = Some(path);
    }

    /// Replace the code. `None` clears it.
    pub fn update_code(&mut self, code: Option<String>) {
        self.code = code.unwrap_or_default();
        self.dirty = true;
    }

    pub fn set_namespaces<I, S>(&mut self, namespaces: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.set_namespaces(namespaces);
        self.dirty = true;
    }

    pub fn set_kind(&mut self, kind: ScriptKind) {
        self.config.kind = kind;
        self.dirty = true;
    }

    /// Program text handed to the external compiler.
    pub fn runnable_code(&self) -> String {
        script::synthesize(&self.config, &self.code)
    }

    /// Path a new script gets when first saved into `dir`.
    pub fn default_path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{SCRIPT_FILE_EXTENSION}", self.name))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn directory_path(&self) -> Option<&Path> {
        self.file_path.as_deref().and_then(Path::parent)
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// A script that has never been saved has no path.
    pub fn is_new(&self) -> bool {
        self.file_path.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || self.is_new()
    }
}

fn name_from_path(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}
