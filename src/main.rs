mod cli;
mod clients;
mod config;
mod engine;
mod error;
mod rules;
mod store;
mod ui;
mod workflow;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};
use clients::HttpServices;
use config::VervalConfig;
use engine::Engine;
use store::{FileStore, QueueCache, SessionStore};
use ui::TaskProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = VervalConfig::load()?;

    let data_dir = PathBuf::from(&config.data_dir);
    let session = SessionStore::new(Box::new(FileStore::open(data_dir.join("session.json"))));
    let cache = QueueCache::new(Box::new(FileStore::open(data_dir.join("queue.json"))));
    let mut engine = Engine::new(HttpServices::new(config), session, cache);

    match cli.command {
        Command::Login { username, password } => {
            let progress = TaskProgress::start("Masuk ke portal monitoring...");
            engine.login(&username, &password).await;
            match &engine.state().error_message {
                Some(message) => progress.fail(message),
                None => progress.succeed(&format!(
                    "Masuk sebagai {}",
                    engine.state().display_name
                )),
            }
        }

        Command::Credential { path } => {
            let blob = std::fs::read_to_string(&path)?;
            engine.import_credential(&blob);
            let progress = TaskProgress::start("Memeriksa kredensial...");
            match &engine.state().error_message {
                Some(message) => progress.fail(message),
                None => progress.succeed("Kredensial service account tersimpan"),
            }
        }

        Command::Fetch => {
            let progress = TaskProgress::start("Mengambil daftar baris...");
            engine.start().await;
            engine.fetch_pending_rows(false).await;
            match &engine.state().error_message {
                Some(message) => progress.fail(message),
                None => {
                    progress.succeed("Daftar baris diperbarui");
                    ui::print_queue(&engine.state().queue);
                }
            }
        }

        Command::Review => {
            let progress = TaskProgress::start("Memuat data baris pertama...");
            engine.start().await;
            engine.start_review().await;
            match (&engine.state().row_details, &engine.state().error_message) {
                (Some(details), _) => {
                    progress.succeed(&format!(
                        "Baris {} siap ditinjau",
                        engine
                            .state()
                            .queue
                            .head()
                            .map(|row| row.row_index)
                            .unwrap_or_default()
                    ));
                    ui::print_row_details(details);
                }
                (None, Some(message)) => progress.fail(message),
                (None, None) => progress.notice("Tidak ada baris untuk ditinjau."),
            }
        }

        Command::Status => {
            engine.start().await;
            let state = engine.state();
            println!("Fase        : {}", state.phase);
            println!(
                "Peninjauan  : {}",
                if state.phase.in_review() { "aktif" } else { "tidak aktif" }
            );
            println!(
                "Pengguna    : {}",
                if state.display_name.is_empty() {
                    "-"
                } else {
                    &state.display_name
                }
            );
            println!(
                "Kredensial  : {}",
                if state.has_credential { "ada" } else { "belum" }
            );
            println!("Antrian     : {} baris", state.queue.rows.len());
            if let Some(fetched_at) = state.fetched_at {
                println!("Diambil     : {fetched_at}");
            }
        }

        Command::Logout => {
            engine.logout();
            println!("Sesi dihapus.");
        }
    }

    Ok(())
}
