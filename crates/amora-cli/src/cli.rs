use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "amora", about = "Amora profile API client")]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "amora.toml")]
    pub config: PathBuf,

    /// Override the API base URL from the config file
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the signed-in user's profile
    Me,
    /// Look up a user via /users/{id}
    User { id: String },
    /// Look up a user via /profile/{id}
    Profile { id: String },
    /// Claim a username
    SetUsername { username: String },
    /// Edit profile fields; unset flags are left unchanged
    Edit(EditArgs),
    /// Store session tokens for later calls
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Forget stored session tokens
    Logout,
}

#[derive(clap::Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub display_name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub profile_picture: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub gender: Option<String>,
    /// May be repeated
    #[arg(long = "interested-in")]
    pub interested_in: Vec<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    /// Raw JSON object merged over the flags above
    #[arg(long)]
    pub json: Option<String>,
}
