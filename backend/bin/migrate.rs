use anyhow::Result;
use bridger::db::{get_db_pool, migrations, DatabaseConfig};
use bridger::utils;
use clap::{Arg, ArgAction, Command};
use tracing::{info, warn};

fn cli() -> Command {
    Command::new("migrate")
        .about("Apply the connection schema to DATABASE_URL")
        .arg(
            Arg::new("status")
                .long("status")
                .action(ArgAction::SetTrue)
                .help("List embedded migrations and whether each is applied, without running any"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_logging();

    let matches = cli().get_matches();
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    if matches.get_flag("status") {
        let statuses = migrations::migration_status(&pool).await?;
        for m in &statuses {
            if m.applied {
                info!("✅ {} {}", m.version, m.description);
            } else {
                warn!("⏳ {} {} (pending)", m.version, m.description);
            }
        }
        let pending = statuses.iter().filter(|m| !m.applied).count();
        info!("{} of {} migrations pending", pending, statuses.len());
        return Ok(());
    }

    info!("Running database migrations against {}", db_config.redacted_url());
    migrations::run_migrations(&pool).await?;
    info!("Migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flag() {
        cli().debug_assert();
        assert!(cli().get_matches_from(["migrate", "--status"]).get_flag("status"));
        assert!(!cli().get_matches_from(["migrate"]).get_flag("status"));
    }
}
