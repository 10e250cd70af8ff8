use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{FileTokenStorage, SessionStore};
use crate::panel::AdminPanel;

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("SCHOOL_ADMIN_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("school-admin")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn token_storage() -> anyhow::Result<FileTokenStorage> {
    Ok(FileTokenStorage::in_dir(&get_config_dir()?))
}

/// Restore the persisted session and bind it to a backend client
pub fn open_panel() -> anyhow::Result<AdminPanel> {
    let session = SessionStore::with_storage(Arc::new(token_storage()?));
    let api = ApiClient::from_config(&crate::config::config().api)?;
    Ok(AdminPanel::new(session, api))
}
