use clap::Args;
use enclave_app::{
    config::StorageConfig,
    context::AppContext,
    domain::namespaces::models::{NamespaceStatus, NewNamespace},
};

#[derive(Debug, Args)]
pub(crate) struct CreateNamespaceArgs {
    /// Namespace name
    #[arg(long)]
    name: String,

    /// Metadata entry as key=value; repeatable
    #[arg(long = "metadata", value_parser = parse_key_value)]
    metadata: Vec<(String, String)>,

    /// Create the namespace disabled
    #[arg(long)]
    disabled: bool,

    #[command(flatten)]
    storage: StorageConfig,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

pub(crate) async fn run(args: CreateNamespaceArgs) -> Result<(), String> {
    let context = AppContext::from_storage(&args.storage)
        .await
        .map_err(|error| format!("failed to initialize storage: {error}"))?;

    let status = if args.disabled {
        NamespaceStatus::Disabled
    } else {
        NamespaceStatus::Enabled
    };

    let created = context
        .namespaces
        .create_namespace(NewNamespace {
            name: args.name,
            metadata: args.metadata.into_iter().collect(),
            status,
        })
        .await
        .map_err(|error| format!("failed to create namespace: {error}"))?;

    println!("uid: {}", created.uid);
    println!("name: {}", created.name);

    context
        .shutdown()
        .await
        .map_err(|error| format!("failed to shut down storage: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_parses_key_value_pairs() {
        assert_eq!(
            parse_key_value("tier=gold"),
            Ok(("tier".to_string(), "gold".to_string()))
        );
        assert!(parse_key_value("no-equals").is_err());
    }
}
