// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `countries` command-line host.
//!
//! Builds a session over the JSON token file, runs one command and prints
//! the result. Notices from the event channel go to stderr.

use std::fmt::Write as _;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;

use crate::collection::{Page, PageRequest};
use crate::config::ClientConfig;
use crate::credential::persist::FileStore;
use crate::error::CollectionError;
use crate::events::{ClientEvent, NoticeLevel};
use crate::model::Country;
use crate::session::{SessionController, SessionState};
use crate::validate::{CountryDraft, DraftValidator};

/// Command-line client for the countries API.
#[derive(Debug, Parser)]
#[command(name = "countries", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientConfig,

    /// Log format (json or text).
    #[arg(long, env = "COUNTRIES_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "COUNTRIES_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.client.validate()?;
        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("invalid --log-format: {other} (expected json or text)"),
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Log in and store the token pair.
    Login(LoginArgs),
    /// Invalidate the refresh token on the server and forget both tokens.
    Logout,
    /// Show one page of countries.
    List(PageArgs),
    /// Filter one page of countries by name.
    Search(SearchArgs),
    /// Validate and create a country.
    Add(CountryDraft),
    /// Delete a country by id.
    Delete(DeleteArgs),
}

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[arg(long, env = "COUNTRIES_USERNAME")]
    pub username: String,
    #[arg(long, env = "COUNTRIES_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, clap::Args)]
pub struct PageArgs {
    /// Page number, 1-based.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// Case-insensitive name fragment.
    pub term: String,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    /// Country id.
    pub id: u64,
    /// Page the country is listed on.
    #[command(flatten)]
    pub page: PageArgs,
}

/// Run one command. Returns a process exit code.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let store = Arc::new(FileStore::open(cli.client.token_file(), cli.client.token_ttl())?);
    let session = SessionController::new(&cli.client, store)?;
    let mut events = session.subscribe();

    let code = match cli.command {
        Command::Login(args) => match session.login(&args.username, &args.password).await {
            Ok(SessionState::LoggedIn(_)) => {
                print_page(&session, false);
                0
            }
            _ => 1,
        },
        Command::Logout => {
            session.logout().await;
            0
        }
        Command::List(args) => {
            if !open_page(&session, args.page).await {
                return finish(&mut events, 1);
            }
            print_page(&session, false);
            0
        }
        Command::Search(args) => {
            if !open_page(&session, args.page.page).await {
                return finish(&mut events, 1);
            }
            session.collection().search(&args.term);
            print_page(&session, true);
            0
        }
        Command::Add(draft) => add(&session, &draft).await?,
        Command::Delete(args) => {
            if !open_page(&session, args.page.page).await {
                return finish(&mut events, 1);
            }
            match session.collection().delete(args.id).await {
                Ok(_) => {
                    print_page(&session, false);
                    0
                }
                Err(_) => 1,
            }
        }
    };

    finish(&mut events, code)
}

fn finish(events: &mut broadcast::Receiver<ClientEvent>, code: i32) -> anyhow::Result<i32> {
    print_notices(events);
    Ok(code)
}

/// Validate the stored session and load `page`. False when the session is
/// gone or the page could not be loaded.
async fn open_page(session: &SessionController, page: u32) -> bool {
    if session.initialize().await == SessionState::LoggedOut {
        eprintln!("error: not logged in (run `countries login`)");
        return false;
    }
    page <= 1 || session.collection().load_page(PageRequest::Number(page)).await.is_ok()
}

async fn add(session: &SessionController, draft: &CountryDraft) -> anyhow::Result<i32> {
    let country = match DraftValidator::new()?.validate(draft) {
        Ok(country) => country,
        Err(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            return Ok(2);
        }
    };
    if !open_page(session, 1).await {
        return Ok(1);
    }
    match session.collection().create(&country).await {
        Ok(_) => {
            print_page(session, false);
            Ok(0)
        }
        Err(CollectionError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            Ok(2)
        }
        Err(_) => Ok(1),
    }
}

fn print_page(session: &SessionController, filtered: bool) {
    let collection = session.collection();
    let page = collection.current();
    let rows = if filtered { collection.visible() } else { page.items.clone() };
    print!("{}", render(&page, &rows, collection.total_pages(), collection.search_disclaimer()));
}

/// Format a page as a plain-text table.
pub fn render(page: &Page, rows: &[Country], total_pages: u32, disclaimer: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:<32}  {:<20}  {:<12}  {:>12}", "ID", "NAME", "CAPITAL", "REGION", "POPULATION");
    for c in rows {
        let _ = writeln!(
            out,
            "{:>6}  {:<32}  {:<20}  {:<12}  {:>12}",
            c.id, c.name, c.capital, c.region, c.population
        );
    }
    if rows.is_empty() {
        let _ = writeln!(out, "(no countries)");
    }
    let _ = writeln!(
        out,
        "Page {} of {} ({} countries)",
        page.page_number,
        total_pages.max(1),
        page.total_count
    );
    if let Some(note) = disclaimer {
        let _ = writeln!(out, "{note}");
    }
    out
}

fn print_notices(events: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::Notice { level, message } = event {
            let tag = match level {
                NoticeLevel::Success => "ok",
                NoticeLevel::Danger => "error",
            };
            eprintln!("{tag}: {message}");
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
