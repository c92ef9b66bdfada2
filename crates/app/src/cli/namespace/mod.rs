use clap::{Args, Subcommand};

mod create;
mod delete;
mod list;

#[derive(Debug, Args)]
pub(crate) struct NamespaceCommand {
    #[command(subcommand)]
    command: NamespaceSubcommand,
}

#[derive(Debug, Subcommand)]
enum NamespaceSubcommand {
    Create(create::CreateNamespaceArgs),
    List(list::ListNamespaceArgs),
    Delete(delete::DeleteNamespaceArgs),
}

pub(crate) async fn run(command: NamespaceCommand) -> Result<(), String> {
    match command.command {
        NamespaceSubcommand::Create(args) => create::run(args).await,
        NamespaceSubcommand::List(args) => list::run(args).await,
        NamespaceSubcommand::Delete(args) => delete::run(args).await,
    }
}
