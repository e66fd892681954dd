#![deny(clippy::all, clippy::pedantic)]

use folio_api_types::TagsResponse;
use reqwest::Method;

use crate::args::TagsCmd;
use crate::client::{CliError, Ctx};

pub async fn handle(ctx: &Ctx, cmd: TagsCmd) -> Result<(), CliError> {
    match cmd {
        TagsCmd::List { all } => list(ctx, all).await,
    }
}

async fn list(ctx: &Ctx, all: bool) -> Result<(), CliError> {
    if all {
        ctx.require_admin()?;
    }
    let q = vec![("published", (!all).to_string())];
    let res: TagsResponse = ctx.request(Method::GET, "api/blogs/tags", Some(&q), None).await?;
    for tag in res.tags {
        println!("{tag}");
    }
    Ok(())
}
