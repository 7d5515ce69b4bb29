//! Alert provisioning CLI
//!
//! Command-line interface for the alert rule provisioning service

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "alertprov")]
#[command(about = "Provision alert rules with provenance tracking", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an alert rule from a JSON file
    Create(commands::rule::CreateArgs),
    /// Show an alert rule and its provenance
    Get(commands::rule::GetArgs),
    /// Replace an alert rule's definition from a JSON file
    Update(commands::rule::UpdateArgs),
    /// List every alert rule of an org
    List(commands::rule::ListArgs),
    /// Set the evaluation interval of a rule group
    UpdateGroup(commands::group::UpdateGroupArgs),
    /// Show a rule group and its members
    Group(commands::group::GroupArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Create(args) => commands::rule::execute_create(&cli.global, args),
        Commands::Get(args) => commands::rule::execute_get(&cli.global, args),
        Commands::Update(args) => commands::rule::execute_update(&cli.global, args),
        Commands::List(args) => commands::rule::execute_list(&cli.global, args),
        Commands::UpdateGroup(args) => commands::group::execute_update_group(&cli.global, args),
        Commands::Group(args) => commands::group::execute_group(&cli.global, args),
    };

    if let Err(e) = result {
        match e.downcast_ref::<alertprov_core::ProvisioningError>() {
            Some(err) => eprintln!("Error: [{}] {}", err.code(), err),
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}
