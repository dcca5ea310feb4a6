use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    record::RecordKind,
};

pub const DATA_DIR_ENV: &str = "FACHKATALOG_DATA_DIR";

/// Directory holding the static collection files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The FACHKATALOG_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/fachkatalog/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::resolve_with(explicit, from_env)
    }

    /// Like [`DataDir::resolve`] with the environment value passed in.
    pub fn resolve_with(
        explicit: Option<&Path>,
        from_env: Option<PathBuf>,
    ) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty())
        {
            path
        } else {
            xdg::BaseDirectories::with_prefix("fachkatalog")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Static JSON file for one collection, e.g. `usecases.json`.
    pub fn collection_file(&self, kind: RecordKind) -> PathBuf {
        self.root.join(kind.file_name())
    }
}
