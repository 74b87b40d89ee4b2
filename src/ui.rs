//! Terminal output: spinners while remote calls run, colored verdict lines.
//!
//! Uses `indicatif` for the progress spinner and `console` for styling. The
//! [`TaskProgress`] wraps one remote operation from start to outcome.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::RowDetails;
use crate::workflow::Queue;

/// Visual progress indicator for one remote operation.
pub struct TaskProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl TaskProgress {
    /// Start the spinner with a description of the running operation.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(description.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn succeed(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }

    pub fn notice(&self, message: &str) {
        self.pb.println(format!("  {} {message}", self.yellow.apply_to("•")));
    }
}

/// Print a short table of the pending queue.
pub fn print_queue(queue: &Queue) {
    let bold = Style::new().bold();
    println!();
    println!("{}", bold.apply_to(format!("Antrian: {} baris", queue.rows.len())));
    for row in &queue.rows {
        let npsn = row.cell(&queue.header, "NPSN").unwrap_or("-");
        println!("  baris {:>4}  NPSN {npsn}", row.row_index);
    }
}

/// Print the enriched record for the active row.
pub fn print_row_details(details: &RowDetails) {
    let bold = Style::new().bold();
    println!();
    println!("{}", bold.apply_to("─── Data Sekolah ───"));
    if let Some(info) = details.monitoring.details.as_ref() {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        println!("  NPSN      : {}", field(&info.school_info.npsn));
        println!("  Nama      : {}", field(&info.school_info.nama));
        println!("  Alamat    : {}", field(&info.school_info.alamat));
        println!("  Serial    : {}", field(&info.school_info.serial_number));
        println!("  Foto      : {} unggahan", info.images.len());
        println!("  Riwayat   : {} langkah", info.process_history.len());
    }
    println!("{}", bold.apply_to("─── Data Registri ───"));
    println!("  Nama      : {}", details.registry.name);
    println!("  Kecamatan : {}", details.registry.kecamatan);
    println!("  Kab/Kota  : {}", details.registry.kabupaten);
    println!("  Kepsek    : {}", details.registry.kepala_sekolah);
}
