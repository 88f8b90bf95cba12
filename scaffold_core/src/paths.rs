//! Platform directories for the config file and the persisted token.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("ru", "scaffold", "scaffold-calc")
}

/// Directory holding `config.json` and the token file
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(crate::config::CONFIG_FILE_NAME))
}

pub fn token_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(crate::token_store::TOKEN_FILE_NAME))
}
