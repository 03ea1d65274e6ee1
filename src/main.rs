use cdmloader::cli::{Cli, Commands};
use cdmloader::commands::{check, ddl, init, truncate, vocabulary};
use std::process;
use tracing_subscriber::EnvFilter;

// Allow println in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() {
    init_logging();

    let cli = Cli::parse();
    tracing::info!("cdmloader CLI initialized");

    let result = match cli.command {
        Some(Commands::Init {
            server,
            database,
            user,
        }) => init::handle_init(&cli.config, &server, &database, &user),
        Some(Commands::Check) => check::handle_check(&cli.config),
        Some(Commands::Ddl {
            cdm_version,
            schema,
        }) => ddl::handle_ddl(&cli.config, cdm_version, schema),
        Some(Commands::Vocabulary { folder, schema }) => {
            vocabulary::handle_vocabulary(&cli.config, folder, schema)
        }
        Some(Commands::Truncate { schema, table }) => {
            truncate::handle_truncate(&cli.config, &schema, &table)
        }
        None => {
            println!("cdmloader - Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Default to INFO level, can be overridden by RUST_LOG environment variable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cdmloader=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
