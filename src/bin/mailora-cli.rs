use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mailora_campaigns::clock::{Clock, SystemClock};
use mailora_campaigns::config::Config;
use mailora_campaigns::models::user::{RegisterReq, Role};
use mailora_campaigns::services::{auth_service, dispatch_service, mailing_service};
use mailora_campaigns::smtp::{self, Mailer, OutgoingEmail};
use mailora_campaigns::{db, telemetry};

#[derive(Parser)]
#[command(name = "mailora-cli", about = "Operator commands for the campaign service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one email directly, outside any mailing.
    Send {
        #[arg(value_name = "email")]
        to: String,
        subject: String,
        body: String,
    },
    /// Dispatch a mailing now.
    RunMailing {
        #[arg(value_name = "mailing_id")]
        id: i64,
    },
    /// Refresh the stored status of every mailing once.
    RefreshStatuses,
    /// Create an active, verified user.
    CreateUser {
        email: String,
        username: String,
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Owner)]
        role: RoleArg,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RoleArg {
    Owner,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Owner => Role::Owner,
            RoleArg::Manager => Role::Manager,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Send { to, subject, body } => {
            let mailer = smtp::mailer_from_config(&config)?;
            let email = OutgoingEmail::new(&config.default_from_email, &to, subject, body);
            match mailer.send(&email).await {
                Ok(()) => println!("Email sent to {to}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::RunMailing { id } => {
            let pool = db::connect(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            let mailer = smtp::mailer_from_config(&config)?;
            let report = dispatch_service::run_mailing(
                &pool,
                mailer.as_ref(),
                &SystemClock,
                &config.default_from_email,
                id,
            )
            .await
            .with_context(|| format!("mailing {id}"))?;
            println!("{} (status: {})", report.summary(), report.status);
        }
        Commands::RefreshStatuses => {
            let pool = db::connect(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            let changed = mailing_service::refresh_all_statuses(&pool, SystemClock.now()).await?;
            println!("{changed} mailing status(es) updated");
        }
        Commands::CreateUser {
            email,
            username,
            password,
            role,
        } => {
            let pool = db::connect(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            let req = RegisterReq {
                email,
                username,
                password,
            };
            let user = auth_service::create_user(&pool, &req, role.into(), true, None, SystemClock.now())
                .await?;
            println!("created {} user {} (id {})", user.role.as_str(), user.email, user.id);
        }
    }
    Ok(())
}
