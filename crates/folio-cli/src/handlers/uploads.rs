#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use crate::args::UploadsCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;
use crate::upload::upload_image;

pub async fn handle(ctx: &Ctx, cmd: UploadsCmd) -> Result<(), CliError> {
    match cmd {
        UploadsCmd::Upload { file } => upload(ctx, &file).await,
    }
}

async fn upload(ctx: &Ctx, file: &Path) -> Result<(), CliError> {
    let res = upload_image(ctx, file).await?;
    print_json(&res)?;
    Ok(())
}
