//! Settings service.
//!
//! ```text
//!     GET/POST /api/settings
//!     ─────────────────────▶ http server ─▶ admin (auth, handlers)
//!                                               │
//!                         ┌─────────────────────┴──────────────┐
//!                         ▼                                    ▼
//!                 settings::reader                     settings::writer
//!                 (store + defaults)          (merge, persist .env, live apply)
//!                         ▲                                    │
//!                         └──────── process environment ◀──────┘
//!                                                              │
//!                              LOG_LEVEL reload ◀── broadcast ─┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use settings_service::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "settings-service")]
#[command(about = "Serve and persist live service settings", long_about = None)]
struct Args {
    /// Service configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file to seed from and write to.
    #[arg(short, long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(StartupOptions {
        config_path: args.config,
        env_file: args.env_file,
    })
    .await
}
