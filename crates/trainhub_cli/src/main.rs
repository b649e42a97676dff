//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `trainhub_core` linkage and schema bootstrap from the shell.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use trainhub_core::db::migrations::current_user_version;
use trainhub_core::db::{open_db, open_db_in_memory};
use trainhub_core::TrainHubConfig;

fn main() -> ExitCode {
    println!("trainhub_core ping={}", trainhub_core::ping());
    println!("trainhub_core version={}", trainhub_core::core_version());

    let config = match TrainHubConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("trainhub config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Probe an in-memory catalog unless a database path is set explicitly.
    let explicit_db = std::env::var_os(trainhub_core::config::ENV_DB_PATH).is_some();
    let opened = if explicit_db {
        open_db(&config.db_path)
    } else {
        open_db_in_memory()
    };

    match opened.and_then(|conn| current_user_version(&conn)) {
        Ok(version) => {
            println!("trainhub_core schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("trainhub schema bootstrap failed: {err}");
            ExitCode::FAILURE
        }
    }
}
