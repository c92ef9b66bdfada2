use clap::Args;
use enclave_app::{
    config::StorageConfig,
    context::AppContext,
    domain::namespaces::models::NamespaceListQuery,
};

#[derive(Debug, Args)]
pub(crate) struct ListNamespaceArgs {
    /// Substring filter on the name
    #[arg(long, default_value = "")]
    keyword: String,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size
    #[arg(long, default_value_t = 20)]
    page_size: u32,

    #[command(flatten)]
    storage: StorageConfig,
}

pub(crate) async fn run(args: ListNamespaceArgs) -> Result<(), String> {
    let context = AppContext::from_storage(&args.storage)
        .await
        .map_err(|error| format!("failed to initialize storage: {error}"))?;

    let page = context
        .namespaces
        .list_namespace(NamespaceListQuery {
            page: args.page,
            page_size: args.page_size,
            keyword: args.keyword,
            ..NamespaceListQuery::default()
        })
        .await
        .map_err(|error| format!("failed to list namespaces: {error}"))?;

    for namespace in &page.namespaces {
        println!(
            "{}\t{}\t{}",
            namespace.uid, namespace.name, namespace.status
        );
    }
    println!("total: {} (page {})", page.total, page.page);

    context
        .shutdown()
        .await
        .map_err(|error| format!("failed to shut down storage: {error}"))
}
