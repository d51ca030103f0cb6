use std::process::ExitCode;
use std::sync::Arc;

use amora_client::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, ProfileClient, AUTH_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use amora_models::{ApiResponse, LocationUpdate, ProfileUpdate};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use cli::{Command, EditArgs};
use config::{CredentialBackend, CredentialsConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("amora=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;

    // CLI --base-url overrides config file and environment
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    let store = open_credentials(&config.credentials);

    match &args.command {
        Command::Login {
            token,
            refresh_token,
        } => {
            store.set(AUTH_TOKEN_KEY, token);
            match refresh_token {
                Some(refresh) => store.set(REFRESH_TOKEN_KEY, refresh),
                None => store.remove(REFRESH_TOKEN_KEY),
            }
            tracing::info!("Stored session tokens");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Logout => {
            store.remove(AUTH_TOKEN_KEY);
            store.remove(REFRESH_TOKEN_KEY);
            tracing::info!("Cleared session tokens");
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let client = ProfileClient::new(config.api.clone(), store)
        .with_context(|| format!("invalid API configuration ({})", config.api.base_url))?;

    match args.command {
        Command::Me => report(&client.fetch_own_profile().await),
        Command::User { id } => match client.get_user_by_id(&id).await {
            Ok(resp) => report(&resp),
            Err(e) => {
                tracing::error!("Request for user {} failed: {}", id, e);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Profile { id } => report(&client.get_user_profile(&id).await),
        Command::SetUsername { username } => report(&client.set_username(&username).await),
        Command::Edit(edit) => {
            let payload = edit_payload(&edit)?;
            report(&client.edit_profile(&payload).await)
        }
        Command::Login { .. } | Command::Logout => Ok(ExitCode::SUCCESS),
    }
}

fn open_credentials(config: &CredentialsConfig) -> Arc<dyn CredentialStore> {
    match config.backend {
        CredentialBackend::Keyring => {
            tracing::debug!("Using keychain service {:?}", config.service);
            Arc::new(KeyringCredentialStore::new(config.service.clone()))
        }
        CredentialBackend::File => {
            tracing::debug!("Using credential file {:?}", config.path);
            Arc::new(FileCredentialStore::open(config.path.clone()))
        }
    }
}

/// Print the envelope as JSON and map its outcome to the exit code.
fn report<T: Serialize>(resp: &ApiResponse<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    if resp.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn edit_payload(args: &EditArgs) -> Result<Value> {
    let location = if args.city.is_some() || args.country.is_some() {
        Some(LocationUpdate {
            city: args.city.clone(),
            country: args.country.clone(),
            coordinates: None,
        })
    } else {
        None
    };
    let update = ProfileUpdate {
        display_name: args.display_name.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        profile_picture: args.profile_picture.clone(),
        bio: args.bio.clone(),
        age: args.age,
        gender: args.gender.clone(),
        interested_in: (!args.interested_in.is_empty()).then(|| args.interested_in.clone()),
        location,
        ..Default::default()
    };

    let mut payload = serde_json::to_value(&update)?;
    if let Some(raw) = &args.json {
        let extra: Value = serde_json::from_str(raw).context("--json is not valid JSON")?;
        let Value::Object(extra) = extra else {
            bail!("--json must be a JSON object");
        };
        if let Value::Object(fields) = &mut payload {
            fields.extend(extra);
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_payload_from_flags() {
        let args = EditArgs {
            bio: Some("hi".to_string()),
            interested_in: vec!["music".to_string()],
            city: Some("Porto".to_string()),
            ..Default::default()
        };
        let payload = edit_payload(&args).expect("payload");
        assert_eq!(
            payload,
            json!({ "bio": "hi", "intrestedIn": ["music"], "location": { "city": "Porto" } })
        );
    }

    #[test]
    fn edit_payload_merges_raw_json() {
        let args = EditArgs {
            bio: Some("hi".to_string()),
            json: Some(r#"{"bio":"override","privacySettings":{"showAge":false}}"#.to_string()),
            ..Default::default()
        };
        let payload = edit_payload(&args).expect("payload");
        assert_eq!(
            payload,
            json!({ "bio": "override", "privacySettings": { "showAge": false } })
        );
    }

    #[test]
    fn edit_payload_rejects_non_object_json() {
        let args = EditArgs {
            json: Some("[1, 2]".to_string()),
            ..Default::default()
        };
        assert!(edit_payload(&args).is_err());
    }

    #[test]
    fn file_backend_persists_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CredentialsConfig {
            backend: CredentialBackend::File,
            path: dir.path().join("credentials.json"),
            ..Default::default()
        };

        open_credentials(&config).set(AUTH_TOKEN_KEY, "token-1");

        assert_eq!(
            open_credentials(&config).get(AUTH_TOKEN_KEY).as_deref(),
            Some("token-1")
        );
    }
}
