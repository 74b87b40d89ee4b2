//! Typed records produced by the monitoring-portal and registry clients.
//!
//! Remote fields that may legitimately be absent are `Option<String>` so the
//! engine has to handle absence explicitly instead of trusting empty strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// School identity fields scraped from the monitoring detail page, in the
/// fixed order the page lays them out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolInfo {
    pub npsn: Option<String>,
    pub nama: Option<String>,
    pub alamat: Option<String>,
    pub provinsi: Option<String>,
    pub kabupaten: Option<String>,
    pub kecamatan: Option<String>,
    pub kelurahan_desa: Option<String>,
    pub jenjang: Option<String>,
    pub bentuk: Option<String>,
    pub sekolah: Option<String>,
    pub formal: Option<String>,
    pub pic: Option<String>,
    pub telp_pic: Option<String>,
    pub resi_pengiriman: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
}

/// One row of the installation process history table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub tanggal: Option<String>,
    pub status: Option<String>,
    pub keterangan: Option<String>,
}

/// Opaque context parameters lifted verbatim from the detail page's
/// navigation URL. The engine never interprets these; they are round-tripped
/// on decision submission with only the status flag and rationale added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextParams {
    pub q: String,
    pub npsn: String,
    pub iprop: String,
    pub ikab: String,
    pub ikec: String,
    pub iins: String,
    pub ijenjang: String,
    pub ibp: String,
    pub iss: String,
    pub isf: String,
    pub istt: String,
    pub itgl: String,
    pub itgla: String,
    pub itgle: String,
    pub ipet: String,
    pub ihnd: String,
}

/// Everything scraped from the detail page. Only present when the listing
/// carried a navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringDetails {
    pub school_info: SchoolInfo,
    /// Bold label near each photo → image URL.
    pub images: BTreeMap<String, String>,
    pub process_history: Vec<HistoryItem>,
    pub context: ContextParams,
}

/// Result of scraping the monitoring portal for one school.
///
/// A listing row without a navigation target yields `details: None` with only
/// the ready flag set. That is a valid terminal outcome, not an error: the
/// engine auto-skips rows whose flag is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRecord {
    /// Derived from the green color cue on the listing row.
    pub ready: bool,
    pub details: Option<MonitoringDetails>,
}

/// One personnel entry from the registry portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    #[serde(default)]
    pub ptk_id: String,
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub jenis_ptk: String,
    #[serde(default)]
    pub jabatan_ptk: String,
}

/// School identity and personnel as known to the education-data registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
    /// Name of the first personnel entry holding the head-of-school role,
    /// empty when none is listed.
    pub kepala_sekolah: String,
    pub ptk: Vec<Personnel>,
}
