//! Multisig wallet CLI application
//!
//! A command-line interface for operating an M-of-N multisig wallet.

use clap::{Parser, Subcommand};
use multisig_engine::api::{create_router, ApiState};
use multisig_engine::cli::{self, AppState};
use multisig_engine::multisig::EffectMode;
use multisig_engine::storage::{Storage, StorageConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multi-signature wallet", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Init {
        /// Comma-separated owner identities
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<String>,

        /// Approvals required to execute
        #[arg(short, long)]
        threshold: usize,

        /// Execute effect: transfer or call
        #[arg(short, long, default_value = "transfer")]
        effect: EffectMode,

        /// Entry point invoked on the target in call mode
        #[arg(long)]
        call_function: Option<String>,

        /// Overwrite an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Send coins into the wallet
    Deposit {
        /// Sender identity
        #[arg(short, long)]
        caller: String,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u64,
    },

    /// Submit a new transaction
    Submit {
        /// Submitting owner
        #[arg(short, long)]
        caller: String,

        /// Recipient identity
        #[arg(short, long)]
        to: String,

        /// Coins to move
        #[arg(short, long, default_value = "0")]
        value: u64,

        /// Hex payload
        #[arg(long)]
        data: Option<String>,
    },

    /// Approve a transaction
    Approve {
        #[arg(short, long)]
        caller: String,

        /// Transaction id
        id: u64,
    },

    /// Execute a transaction that reached the threshold
    Execute {
        #[arg(short, long)]
        caller: String,

        /// Transaction id
        id: u64,
    },

    /// Revoke an earlier approval
    Revoke {
        #[arg(short, long)]
        caller: String,

        /// Transaction id
        id: u64,
    },

    /// Display wallet information
    Info,

    /// Display one transaction
    Tx {
        /// Transaction id
        id: u64,
    },

    /// List transactions
    List {
        /// Only show transactions not yet executed
        #[arg(short, long)]
        pending: bool,
    },

    /// Show the event journal
    Events {
        /// First sequence number to show
        #[arg(short, long, default_value = "0")]
        from: u64,
    },

    /// Show coins and calls delivered by executions
    Payouts,

    /// Export wallet to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List wallet backups
    Backups,

    /// Replace the wallet with a backup
    Restore {
        /// Backup index (0 is the most recent)
        #[arg(short, long, default_value = "0")]
        backup: usize,
    },

    /// Import wallet from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a loaded wallet
    match &cli.command {
        Commands::Init {
            owners,
            threshold,
            effect,
            call_function,
            force,
        } => {
            return cli::cmd_init(
                &cli.data_dir,
                owners,
                *threshold,
                *effect,
                call_function.clone(),
                *force,
            );
        }
        Commands::Import { input } => {
            return cli::cmd_import(&cli.data_dir, input);
        }
        Commands::Backups => {
            return cli::cmd_backups(&cli.data_dir);
        }
        Commands::Restore { backup } => {
            return cli::cmd_restore(&cli.data_dir, *backup);
        }
        Commands::Api { action } => {
            return run_api_command(action, &cli.data_dir);
        }
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. }
        | Commands::Import { .. }
        | Commands::Backups
        | Commands::Restore { .. }
        | Commands::Api { .. } => unreachable!(),

        Commands::Deposit { caller, amount } => {
            cli::cmd_deposit(&mut state, &caller, amount)?;
        }

        Commands::Submit {
            caller,
            to,
            value,
            data,
        } => {
            cli::cmd_submit(&mut state, &caller, &to, value, data.as_deref())?;
        }

        Commands::Approve { caller, id } => {
            cli::cmd_approve(&mut state, &caller, id)?;
        }

        Commands::Execute { caller, id } => {
            cli::cmd_execute(&mut state, &caller, id)?;
        }

        Commands::Revoke { caller, id } => {
            cli::cmd_revoke(&mut state, &caller, id)?;
        }

        Commands::Info => {
            cli::cmd_info(&state)?;
        }

        Commands::Tx { id } => {
            cli::cmd_tx(&state, id)?;
        }

        Commands::List { pending } => {
            cli::cmd_list(&state, pending)?;
        }

        Commands::Events { from } => {
            cli::cmd_events(&state, from)?;
        }

        Commands::Payouts => {
            cli::cmd_payouts(&state)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }
    }

    Ok(())
}

fn run_api_command(action: &ApiCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                let storage = Storage::new(StorageConfig {
                    data_dir: data_dir.to_path_buf(),
                    ..Default::default()
                })?;

                if !storage.exists() {
                    return Err(format!(
                        "no wallet in {:?}; create one with: multisig init",
                        data_dir
                    )
                    .into());
                }

                println!("📂 Loading wallet...");
                let wallet = storage.load()?;
                println!("   📍 Address: {}", wallet.engine.address());
                println!("   🔐 Policy: {}", wallet.engine.registry().description());

                let state = ApiState::new(wallet, storage);
                let shutdown_state = state.clone();
                let app = create_router(state);

                let addr = format!("0.0.0.0:{}", port);
                println!("🚀 REST API server starting on http://localhost:{}", port);
                println!();
                println!("📖 Available endpoints:");
                println!("   GET  /health                          - Health check");
                println!("   GET  /ws                              - WebSocket events");
                println!("   GET  /api/wallet                      - Wallet info");
                println!("   POST /api/deposit                     - Deposit coins");
                println!("   GET  /api/payouts                     - Delivered payouts");
                println!("   GET  /api/events                      - Event journal");
                println!("   GET  /api/transactions                - List transactions");
                println!("   POST /api/transactions                - Submit transaction");
                println!("   GET  /api/transactions/{{id}}           - Get transaction");
                println!("   POST /api/transactions/{{id}}/approve   - Approve");
                println!("   POST /api/transactions/{{id}}/execute   - Execute");
                println!("   POST /api/transactions/{{id}}/revoke    - Revoke");
                println!();

                // Handle Ctrl+C with graceful shutdown
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");

                    let wallet = shutdown_state.wallet.read().await;
                    match shutdown_state.storage.save(&wallet) {
                        Ok(()) => println!("✅ Wallet saved"),
                        Err(e) => log::error!("Failed to save wallet on shutdown: {}", e),
                    }
                    std::process::exit(0);
                });

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
