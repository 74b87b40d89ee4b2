//! Command-line interface, built on clap.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] for the session
//! lifecycle (login, logout), the credential import, and the worksheet queue
//! (fetch, review, status).

use clap::{Parser, Subcommand};

/// Verval — asisten verifikasi dan validasi instalasi IFP.
#[derive(Debug, Parser)]
#[command(name = "verval", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Masuk ke portal monitoring dan simpan sesi.
    Login {
        /// Nama pengguna portal (juga nama verifikator di lembar kerja).
        username: String,

        /// Kata sandi portal.
        password: String,
    },

    /// Impor berkas kredensial service account untuk akses lembar kerja.
    Credential {
        /// Lokasi berkas kredensial JSON.
        path: String,
    },

    /// Ambil daftar baris yang belum diverifikasi.
    Fetch,

    /// Mulai peninjauan: perkaya baris pertama dan tampilkan datanya.
    Review,

    /// Tampilkan status sesi dan antrian tersimpan.
    Status,

    /// Keluar dan hapus sesi tersimpan.
    Logout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_login_subcommand() {
        let cli = Cli::parse_from(["verval", "login", "siti", "rahasia"]);
        match cli.command {
            Command::Login { username, password } => {
                assert_eq!(username, "siti");
                assert_eq!(password, "rahasia");
            }
            _ => panic!("expected Login command"),
        }
    }

    #[test]
    fn cli_parses_credential_subcommand() {
        let cli = Cli::parse_from(["verval", "credential", "sa.json"]);
        match cli.command {
            Command::Credential { path } => assert_eq!(path, "sa.json"),
            _ => panic!("expected Credential command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
