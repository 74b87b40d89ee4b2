//! Evaluation rule table: default values, field option sets, and rejection
//! reason texts.
//!
//! This is closed business configuration. Changing review rules means editing
//! these tables, not the engine. Reason strings are written back verbatim to
//! the monitoring portal and the worksheet, so they must not be reworded.

use std::collections::BTreeMap;

/// One reviewable field on the evaluation form, addressed by its worksheet
/// column letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationField {
    pub col: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

/// Fields in worksheet column order. Column "X" (installation completion date)
/// is free-form and is seeded from the enriched record rather than picked from
/// an option list.
pub const EVALUATION_FIELDS: &[EvaluationField] = &[
    EvaluationField {
        col: "J",
        label: "GEO TAGGING",
        options: &["Sesuai", "Tidak Sesuai"],
    },
    EvaluationField {
        col: "K",
        label: "FOTO PAPAN NAMA",
        options: &["Sesuai", "Tidak Sesuai"],
    },
    EvaluationField {
        col: "L",
        label: "FOTO BOX & PIC",
        options: &["Sesuai", "Tidak Sesuai"],
    },
    EvaluationField {
        col: "M",
        label: "FOTO KELENGKAPAN UNIT",
        options: &["Sesuai", "Tidak Sesuai"],
    },
    EvaluationField {
        col: "N",
        label: "FOTO SERIAL NUMBER",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak Terlihat", "Diedit"],
    },
    EvaluationField {
        col: "P",
        label: "BARCODE BAPP",
        options: &["Sesuai", "Tidak Sesuai"],
    },
    EvaluationField {
        col: "Q",
        label: "CEKLIS BAPP HAL 1",
        options: &[
            "Lengkap",
            "Tidak Lengkap",
            "Tidak Sesuai",
            "BAPP Tidak Jelas",
            "Surat Tugas Tidak Ada",
            "Diedit",
            "Tanggal Tidak Ada",
        ],
    },
    EvaluationField {
        col: "S",
        label: "NAMA PENANDATANGANAN BAPP",
        options: &[
            "Konsisten",
            "Tidak Konsisten",
            "Tidak Terdaftar di Datadik",
            "PIC Tidak Sama",
            "TTD Tidak Ada",
            "NIP Tidak Ada",
        ],
    },
    EvaluationField {
        col: "T",
        label: "STEMPEL",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak Sesuai Tempatnya"],
    },
    EvaluationField {
        col: "U",
        label: "CEKLIS BAPP HAL 2",
        options: &[
            "Lengkap",
            "Tidak Lengkap",
            "Tidak Sesuai",
            "BAPP Tidak Jelas",
            "Diedit",
            "Tanggal Tidak Ada",
            "Tanggal Tidak Konsisten",
        ],
    },
    EvaluationField {
        col: "V",
        label: "PESERTA PELATIHAN",
        options: &["Ada", "Tidak Ada", "Media Pelatihan"],
    },
    EvaluationField {
        col: "W",
        label: "KESIMPULAN LENGKAP",
        options: &["Ya", "Tidak"],
    },
    EvaluationField {
        col: "X",
        label: "TANGGAL INSTALASI SELESAI",
        options: &[],
    },
];

/// Per-field default values. A form showing exactly these values is an accept
/// with no rejection reasons.
const DEFAULT_VALUES: &[(&str, &str)] = &[
    ("J", "Sesuai"),
    ("K", "Sesuai"),
    ("L", "Sesuai"),
    ("M", "Sesuai"),
    ("N", "Sesuai"),
    ("P", "Sesuai"),
    ("Q", "Lengkap"),
    ("S", "Konsisten"),
    ("T", "Sesuai"),
    ("U", "Lengkap"),
    ("V", "Ada"),
    ("W", "Ya"),
    ("X", ""),
];

/// Generic per-field rejection reasons, used when no value-specific reason
/// applies.
const GENERIC_REASONS: &[(&str, &str)] = &[
    ("J", "(5A) Geo Tagging tidak sesuai"),
    ("K", "(4A) Foto plang sekolah tidak sesuai"),
    ("L", "(4C) Foto Box dan PIC tidak sesuai"),
    (
        "M",
        "(2A) Foto kelengkapan IFP tidak lengkap (Kabel HDMI; USB type A to B, stylus, remote)",
    ),
    (
        "N",
        "(3B) Serial number yang diinput tidak sesuai dengan yang tertera pada IFP",
    ),
    (
        "P",
        "(1L) Data BAPP sekolah tidak sesuai (cek Barcode atas dan NPSN dengan foto sekolah atau NPSN yang diinput)",
    ),
    ("Q", "(1D) Ceklis BAPP tidak lengkap pada halaman 1"),
    (
        "S",
        "(1K) Data penanda tangan pada halaman 1 dan halaman 2 BAPP tidak konsisten",
    ),
    (
        "T",
        "(1O) Stempel pada BAPP halaman 2 tidak sesuai dengan sekolahnya",
    ),
    ("U", "(1Q) Ceklis pada BAPP halaman 2 tidak lengkap"),
    (
        "V",
        "(1S) Satuan Pendidikan yang Mengikuti Pelatihan, tidak ada dalam BAPP hal.2",
    ),
    ("W", "(1A) Simpulan BAPP pada hal 2 belum dipilih atau dicoret"),
];

/// Value-specific rejection reasons, consulted before the generic table.
const SPECIFIC_REASONS: &[(&str, &str, &str)] = &[
    (
        "N",
        "Tidak Terlihat",
        "(3A) Foto serial number pada belakang unit IFP tidak jelas",
    ),
    (
        "N",
        "Tidak Ada",
        "(3C) Foto Serial Number pada belakang unit IFP tidak ada",
    ),
    ("N", "Diedit", "(1AB) Foto serial number tidak boleh diedit digital"),
    ("Q", "Tidak Sesuai", "(1D) Ceklis BAPP tidak sesuai pada halaman 1"),
    ("Q", "BAPP Tidak Jelas", "(1M) BAPP Halaman 1 tidak terlihat jelas"),
    (
        "Q",
        "Surat Tugas Tidak Ada",
        "(1V) Nomor surat tugas pada halaman 1 tidak ada",
    ),
    ("Q", "Diedit", "(1Y) BAPP Hal 1 tidak boleh diedit digital"),
    ("Q", "Tanggal Tidak Ada", "(1F) Tanggal BAPP tidak diisi"),
    (
        "S",
        "Tidak Terdaftar di Datadik",
        "(1C) Pihak sekolah yang menandatangani BAPP tidak terdaftar dalam data Dapodik",
    ),
    (
        "S",
        "PIC Tidak Sama",
        "(1U) PIC dari pihak sekolah berbeda dengan yang di BAPP",
    ),
    ("S", "TTD Tidak Ada", "(1X) Tidak ada tanda tangan dari pihak sekolah"),
    ("S", "NIP Tidak Ada", "(1AA) NIP penandatangan pihak sekolah tidak ada"),
    ("T", "Tidak Ada", "(1B) Tidak ada stempel sekolah pada BAPP"),
    (
        "T",
        "Tidak Sesuai Tempatnya",
        "(1W) Stempel tidak mengenai tanda tangan pihak sekolah",
    ),
    ("U", "Tidak Sesuai", "(1Q) Ceklis BAPP tidak sesuai pada halaman 2"),
    ("U", "BAPP Tidak Jelas", "(1T) BAPP Halaman 2 tidak terlihat jelas"),
    ("U", "Diedit", "(1Z) BAPP Hal 2 tidak boleh diedit digital"),
    ("U", "Tanggal Tidak Ada", "(1F) Tanggal BAPP tidak diisi"),
    (
        "V",
        "Media Pelatihan",
        "(1AC) Harap ceklis di luar jaringan pada media pelatihan (jangan double ceklis/tidak ceklis)",
    ),
];

/// The default value for a form field, or `None` for an unknown column.
pub fn default_value(col: &str) -> Option<&'static str> {
    DEFAULT_VALUES.iter().find(|(c, _)| *c == col).map(|(_, v)| *v)
}

/// A fresh evaluation form holding every field at its default value.
pub fn default_form() -> BTreeMap<String, String> {
    DEFAULT_VALUES
        .iter()
        .map(|(c, v)| (c.to_string(), v.to_string()))
        .collect()
}

/// The rejection reason recorded for selecting `value` on field `col`.
///
/// A value-specific reason wins over the field's generic reason; `None` means
/// no reason is recorded for that deviation (only expected for the default
/// value itself).
pub fn reason_for(col: &str, value: &str) -> Option<&'static str> {
    if let Some((_, _, reason)) = SPECIFIC_REASONS
        .iter()
        .find(|(c, v, _)| *c == col && *v == value)
    {
        return Some(reason);
    }
    GENERIC_REASONS.iter().find(|(c, _)| *c == col).map(|(_, r)| *r)
}

/// Collect rejection reasons for every field deviating from its default, in
/// field order, plus the joined rationale string.
pub fn rejection_summary(form: &BTreeMap<String, String>) -> (Vec<String>, String) {
    let mut messages = Vec::new();
    for field in EVALUATION_FIELDS {
        let Some(selected) = form.get(field.col) else {
            continue;
        };
        if default_value(field.col) == Some(selected.as_str()) {
            continue;
        }
        if let Some(reason) = reason_for(field.col, selected) {
            messages.push(reason.to_string());
        }
    }
    let joined = messages.join("; ");
    (messages, joined)
}
