#![deny(clippy::all, clippy::pedantic)]

use folio_api_types::PageMetadata;
use reqwest::Method;

use crate::args::{PageKindArg, SeoCmd};
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: SeoCmd) -> Result<(), CliError> {
    match cmd {
        SeoCmd::StructuredData { kind, slug } => structured_data(ctx, kind, slug).await,
        SeoCmd::Metadata { slug } => metadata(ctx, &slug).await,
    }
}

async fn structured_data(
    ctx: &Ctx,
    kind: PageKindArg,
    slug: Option<String>,
) -> Result<(), CliError> {
    let mut q = vec![("type", kind.as_str().to_string())];
    if let Some(slug) = slug {
        q.push(("slug", slug));
    }
    let res: serde_json::Value = ctx
        .request(Method::GET, "api/structured-data", Some(&q), None)
        .await?;
    print_json(&res)?;
    Ok(())
}

async fn metadata(ctx: &Ctx, slug: &str) -> Result<(), CliError> {
    let path = format!("api/blogs/{slug}/metadata");
    let res: PageMetadata = ctx.request(Method::GET, &path, None, None).await?;
    print_json(&res)?;
    Ok(())
}
