use std::path::PathBuf;

use serde::Serialize;

use crate::db::Ledger;
use crate::error::Result;
use crate::provider::Environment;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

#[derive(Serialize)]
struct InitResponse {
    settings_path: String,
    data_dir: String,
    db_path: String,
    schema_version: i64,
    environment: Environment,
    credentials_configured: bool,
}

pub fn run(
    data_dir: Option<String>,
    client_id: Option<String>,
    secret: Option<String>,
    environment: Option<Environment>,
    base_url: Option<String>,
) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(id) = client_id {
        settings.client_id = id;
    }
    if let Some(secret) = secret {
        settings.secret = secret;
    }
    if let Some(env) = environment {
        settings.environment = env;
    }
    if let Some(url) = base_url {
        settings.base_url = Some(url);
    }

    let resolved = PathBuf::from(shellexpand_path(&settings.data_dir));
    std::fs::create_dir_all(&resolved)?;
    let db_path = settings.db_path();
    let ledger = Ledger::open(&db_path)?;
    save_settings(&settings)?;

    let response = InitResponse {
        settings_path: settings_path().to_string_lossy().to_string(),
        data_dir: resolved.to_string_lossy().to_string(),
        db_path: db_path.to_string_lossy().to_string(),
        schema_version: ledger.schema_version()?,
        environment: settings.environment,
        credentials_configured: settings.require_credentials().is_ok(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
