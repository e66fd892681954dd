//! Interactive listing: stdin commands change the filters while fetches run
//! in the background.

#![deny(clippy::all, clippy::pedantic)]

use folio_api_types::BlogListResponse;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::client::{CliError, Ctx};
use crate::handlers::posts::fetch_page;
use crate::listing::{ListingAction, ListingState};
use crate::print::render_listing;

const HELP: &str =
    "commands: tag <name> | search <text> | page <n> | next | prev | clear | refresh | quit";

type Fetched = (u64, Result<BlogListResponse, CliError>);

pub async fn run(ctx: &Ctx, limit: u32, drafts: bool) -> Result<(), CliError> {
    if drafts {
        ctx.require_admin()?;
    }
    let mut state = ListingState::new(limit, drafts);
    let (tx, mut rx) = mpsc::unbounded_channel::<Fetched>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{HELP}");
    spawn_fetch(ctx, &mut state, &tx);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::Stdin)? else {
                    break;
                };
                match ListingAction::parse(&line) {
                    Ok(ListingAction::Quit) => break,
                    Ok(action) => {
                        if state.apply(action) {
                            spawn_fetch(ctx, &mut state, &tx);
                        }
                    }
                    Err(message) => eprintln!("{message}\n{HELP}"),
                }
            }
            Some((token, result)) = rx.recv() => match result {
                Ok(response) => {
                    if state.accept(token, response) {
                        print!("{}", render_listing(&state));
                    }
                }
                Err(err) if state.is_latest(token) => eprintln!("{err}"),
                Err(_) => {}
            },
        }
    }
    Ok(())
}

fn spawn_fetch(ctx: &Ctx, state: &mut ListingState, tx: &mpsc::UnboundedSender<Fetched>) {
    let ticket = state.begin_fetch();
    let ctx = ctx.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetch_page(&ctx, &ticket.query).await;
        let _ = tx.send((ticket.token, result));
    });
}
