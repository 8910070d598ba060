use crate::model::TaskStore;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const STORE_FILE_ENV: &str = "DAYPLAN_FILE";
const PROJECT_DIR: &str = ".dayplan";
const STORE_FILE: &str = "tasks.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Explicit,
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        StoreLocation {
            path: path.into(),
            scope: StoreScope::Explicit,
        }
    }

    pub fn scope_label(&self) -> &'static str {
        match self.scope {
            StoreScope::Explicit => "file",
            StoreScope::Project => "project",
            StoreScope::Global => "global",
        }
    }
}

pub fn init_project_store(dir: &Path) -> Result<StoreLocation> {
    let store_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&store_dir)
        .with_context(|| format!("failed to create {}", store_dir.display()))?;
    let location = StoreLocation {
        path: store_dir.join(STORE_FILE),
        scope: StoreScope::Project,
    };
    if !location.path.exists() {
        save_store(&location, &TaskStore::new())?;
    }
    Ok(location)
}

/// Resolves the store file: explicit path, then `DAYPLAN_FILE`, then the
/// nearest project store above `start`, then the per-user data directory.
pub fn locate_store(explicit: Option<PathBuf>, start: &Path) -> Result<StoreLocation> {
    if let Some(path) = explicit {
        return Ok(StoreLocation::explicit(path));
    }
    if let Ok(raw) = env::var(STORE_FILE_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(StoreLocation::explicit(trimmed));
        }
    }
    if let Some(project_path) = find_project_store(start) {
        return Ok(StoreLocation {
            path: project_path,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        path: global_store_path()?,
        scope: StoreScope::Global,
    })
}

/// Reads the store, falling back to an empty one when the file is missing,
/// unreadable or corrupt. The file is a cache of local tasks, so a bad copy
/// is not worth refusing to start over.
pub fn load_store(location: &StoreLocation) -> TaskStore {
    if !location.path.exists() {
        tracing::info!(path = %location.path.display(), "no store file yet; starting empty");
        return TaskStore::new();
    }
    let data = match fs::read_to_string(&location.path) {
        Ok(data) => data,
        Err(error) => {
            tracing::warn!(path = %location.path.display(), %error, "failed reading store; starting empty");
            return TaskStore::new();
        }
    };
    if data.trim().is_empty() {
        return TaskStore::new();
    }
    match serde_yaml::from_str::<TaskStore>(&data) {
        Ok(store) => {
            tracing::debug!(path = %location.path.display(), tasks = store.len(), "loaded store");
            store
        }
        Err(error) => {
            tracing::warn!(path = %location.path.display(), %error, "corrupt store file; starting empty");
            TaskStore::new()
        }
    }
}

pub fn save_store(location: &StoreLocation, store: &TaskStore) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
    }
    let serialized = serde_yaml::to_string(store).context("serializing task store")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    tracing::debug!(path = %location.path.display(), tasks = store.len(), "saved store");
    Ok(())
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(STORE_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "dayplan").context("locating data directory")?;
    Ok(dirs.data_dir().join(STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn explicit_path_wins() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.yml");
        let location = locate_store(Some(path.clone()), temp.path()).unwrap();
        assert_eq!(location.path, path);
        assert_eq!(location.scope, StoreScope::Explicit);
    }

    #[test]
    fn env_file_beats_project_store_but_not_explicit_path() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempdir().unwrap();
        let project = init_project_store(temp.path()).unwrap();
        let from_env = temp.path().join("env.yml");
        let explicit = temp.path().join("flag.yml");

        env::set_var(STORE_FILE_ENV, &from_env);
        let env_location = locate_store(None, temp.path());
        let flag_location = locate_store(Some(explicit.clone()), temp.path());
        env::set_var(STORE_FILE_ENV, "   ");
        let blank_location = locate_store(None, temp.path());
        env::remove_var(STORE_FILE_ENV);

        let env_location = env_location.unwrap();
        assert_eq!(env_location.path, from_env);
        assert_eq!(env_location.scope, StoreScope::Explicit);
        assert_eq!(flag_location.unwrap().path, explicit);
        let blank_location = blank_location.unwrap();
        assert_eq!(blank_location.path, project.path);
        assert_eq!(blank_location.scope, StoreScope::Project);
    }

    #[test]
    fn project_store_found_from_nested_dir() {
        let temp = tempdir().unwrap();
        let created = init_project_store(temp.path()).unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_store(&nested), Some(created.path));
    }

    #[test]
    fn init_does_not_clobber_existing_store() {
        let temp = tempdir().unwrap();
        let location = init_project_store(temp.path()).unwrap();
        let mut store = TaskStore::new();
        store.add("2024-03-01", "rent");
        save_store(&location, &store).unwrap();

        let again = init_project_store(temp.path()).unwrap();
        assert_eq!(load_store(&again), store);
    }
}
