use clap::Args;
use enclave_app::{config::StorageConfig, context::AppContext, uid::Uid};

#[derive(Debug, Args)]
pub(crate) struct DeleteNamespaceArgs {
    /// Uid of the namespace to delete
    #[arg(long)]
    uid: i64,

    #[command(flatten)]
    storage: StorageConfig,
}

pub(crate) async fn run(args: DeleteNamespaceArgs) -> Result<(), String> {
    let context = AppContext::from_storage(&args.storage)
        .await
        .map_err(|error| format!("failed to initialize storage: {error}"))?;

    let info = context
        .namespaces
        .delete_namespace(Uid::new(args.uid))
        .await
        .map_err(|error| format!("failed to delete namespace: {error}"))?;

    if info.rows_affected == 0 {
        println!("nothing deleted: {}", info.error);
    } else {
        println!("deleted {} namespace(s)", info.rows_affected);
    }

    context
        .shutdown()
        .await
        .map_err(|error| format!("failed to shut down storage: {error}"))
}
