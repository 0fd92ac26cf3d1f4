//! Cleanup orphaned test resources.
//!
//! Deletes API keys and users left on the panel by earlier test runs that
//! never reached their own cleanup. Meant to be run manually or from CI
//! after an aborted run.
//!
//! Usage:
//!   cleanup-orphans [--dry-run]
//!
//! Environment variables (or `.env.test`):
//! - PTERODACTYL_URL: panel base URL
//! - CLIENT_API_KEY: client API key (`ptlc_`)
//! - APPLICATION_API_KEY: application API key (`ptla_`), needed for users

use clap::Parser;
use panel_config::ConfigurationSnapshot;
use test_cleanup::OrphanSweeper;

#[derive(Debug, Parser)]
#[command(name = "cleanup-orphans", about = "Delete resources left behind by aborted test runs")]
struct Args {
    /// List orphaned resources without deleting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    test_cleanup::init_logging();

    let args = Args::parse();

    println!("🧹 Panel API Test Resource Cleanup");
    println!("==================================");
    println!();

    let config = ConfigurationSnapshot::load()?;

    println!("📋 Configuration:");
    println!("   Panel URL: {}", config.panel_url());
    println!(
        "   Application API: {}",
        if config.application_api_key().is_some() {
            "configured"
        } else {
            "not configured (users will not be swept)"
        }
    );
    println!("   Dry run: {}", args.dry_run);
    println!();

    let sweeper = OrphanSweeper::from_config(&config)?;

    println!("🔍 Searching for orphaned test resources...");
    let report = sweeper.sweep(args.dry_run).await?;

    println!();
    if report.found() == 0 {
        println!("✅ No orphaned test resources found");
        return Ok(());
    }

    println!("📋 Orphaned resources:");
    for identifier in &report.api_keys {
        println!("   - API key {}", identifier);
    }
    for id in &report.users {
        println!("   - user {}", id);
    }

    if args.dry_run {
        println!();
        println!("ℹ️  Dry run, nothing deleted");
        return Ok(());
    }

    println!();
    println!("✅ Cleanup completed!");
    println!(
        "   Deleted {} of {} resources",
        report.cleanup.deleted, report.cleanup.attempted
    );
    if report.cleanup.failed > 0 {
        println!("   ⚠️  {} deletions failed", report.cleanup.failed);
    }

    Ok(())
}
