// tagwarden/src/main.rs

use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup Logging (Tracing)
    // RUST_LOG=debug tagwarden scan ... for the details
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        // --- USE CASE: CLASSIFICATION RUN ---
        Commands::Scan {
            db_path,
            database,
            rules,
            overrides,
            schemas,
            sample_size,
            output,
            output_format,
            dry_run,
        } => {
            let start = std::time::Instant::now();

            match commands::scan::run(
                &db_path,
                database,
                &rules,
                overrides,
                schemas,
                sample_size,
                &output,
                &output_format,
                dry_run,
            )
            .await
            {
                Ok(true) => {
                    println!("\n✨ SUCCESS! Scan finished in {:.2?}", start.elapsed());
                }
                Ok(false) => {
                    eprintln!("\n❌ Scan finished with errors (see logs).");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("\n💥 CRITICAL SCAN ERROR: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // --- USE CASE: POLICY CONVERGENCE ---
        Commands::Apply {
            db_path,
            policy_config,
            rules,
            overrides,
            masking_only,
            row_access_only,
            pii_only,
            dry_run,
        } => {
            let start = std::time::Instant::now();

            match commands::apply::run(
                &db_path,
                &policy_config,
                &rules,
                overrides,
                masking_only,
                row_access_only,
                pii_only,
                dry_run,
            )
            .await
            {
                Ok(true) => {
                    println!("\n✨ SUCCESS! Policies converged in {:.2?}", start.elapsed());
                }
                Ok(false) => {
                    eprintln!("\n❌ Some policy operations failed (see logs).");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("\n💥 CRITICAL POLICY ERROR: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // --- USE CASE: CONFIG VALIDATION ---
        Commands::Validate {
            rules,
            policy_config,
        } => {
            if let Err(e) = commands::validate::run(&rules, &policy_config) {
                eprintln!("❌ Validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
