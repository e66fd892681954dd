//! folio-cli: reader and editor client for the Folio blog API.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod editor;
mod handlers;
mod io;
mod listing;
mod print;
mod upload;


use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{posts, seo, tags, uploads};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Tags(cmd) => tags::handle(&ctx, cmd.action).await?,
        Commands::Uploads(cmd) => uploads::handle(&ctx, cmd.action).await?,
        Commands::Seo(cmd) => seo::handle(&ctx, cmd.action).await?,
    }

    Ok(())
}
