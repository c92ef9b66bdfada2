use clap::{Parser, Subcommand};

mod db;
mod namespace;

#[derive(Debug, Parser)]
#[command(name = "enclave", about = "Enclave namespace registry CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Namespace(namespace::NamespaceCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Namespace(command) => namespace::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
