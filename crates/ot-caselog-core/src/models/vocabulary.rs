//! Closed vocabularies and reference lists for case logging.

use serde::{Deserialize, Serialize};

/// Declares a closed vocabulary enum whose wire form is its display label.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire/display label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parse a label (surrounding whitespace ignored).
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim() {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// All labels, in declaration order.
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// ASA physical-status classification (ordinal).
    pub enum AsaGrade {
        I => "I",
        II => "II",
        III => "III",
        IV => "IV",
        V => "V",
    }
}

impl AsaGrade {
    /// Dashboard label, e.g. "ASA III".
    pub fn label(&self) -> String {
        format!("ASA {}", self.as_str())
    }
}

vocabulary! {
    pub enum Sex {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

vocabulary! {
    pub enum PatientPosition {
        Supine => "Supine",
        Prone => "Prone",
        Lithotomy => "Lithotomy",
        Lateral => "Lateral",
    }
}

vocabulary! {
    /// Laterality of a regional block.
    pub enum BlockSide {
        Left => "Left",
        Right => "Right",
        Bilateral => "Bilateral",
    }
}

vocabulary! {
    pub enum HemodynamicStatus {
        Stable => "Stable",
        MildFluctuations => "Mild fluctuations",
        SignificantInstability => "Significant instability",
    }
}

vocabulary! {
    pub enum PostOpAnalgesia {
        Adequate => "Adequate",
        Inadequate => "Inadequate",
    }
}

/// Reference anesthesia techniques offered by the form. Free text is also accepted.
pub const ANESTHESIA_TECHNIQUES: &[&str] = &[
    "GA",
    "Spinal",
    "Epidural",
    "CSE",
    "Paravertebral Block",
    "Peripheral Nerve Block",
    "MAC/Sedation",
];

/// Techniques delivered via nerve or neuraxial block. These carry block details.
pub const REGIONAL_TECHNIQUES: &[&str] = &[
    "Spinal",
    "Epidural",
    "CSE",
    "Paravertebral Block",
    "Peripheral Nerve Block",
];

/// Technique preselected on a new case when no preference exists.
pub const DEFAULT_TECHNIQUE: &str = "GA";

/// Check whether a technique requires block details (exact match, trimmed).
pub fn is_regional_technique(technique: &str) -> bool {
    let technique = technique.trim();
    REGIONAL_TECHNIQUES.iter().any(|t| *t == technique)
}

/// Check whether a technique belongs to the reference vocabulary.
pub fn is_reference_technique(technique: &str) -> bool {
    let technique = technique.trim();
    ANESTHESIA_TECHNIQUES.iter().any(|t| *t == technique)
}

pub const COMORBIDITY_OPTIONS: &[&str] = &["HTN", "DM", "CAD", "CKD", "COPD", "Other"];

pub const COMPLICATION_OPTIONS: &[&str] = &[
    "Hypotension",
    "Bradycardia",
    "Desaturation",
    "High spinal",
    "PONV",
    "Block failure",
    "None",
];

pub const SURGICAL_SPECIALTIES: &[&str] = &[
    "Cardiothoracic Surgery",
    "Colorectal Surgery",
    "Emergency",
    "General Surgery",
    "Neurosurgery",
    "Obstetrics and Gynecology",
    "Ophthalmology",
    "Oral and Maxillofacial Surgery",
    "Orthopedic Surgery",
    "Otolaryngology (ENT)",
    "Pediatric Surgery",
    "Plastic and Reconstructive Surgery",
    "Urology",
    "Vascular Surgery",
    "Other",
];

/// Static list of common surgeries for a specialty.
///
/// Used as the suggestion list when the advisory service is unavailable.
/// Unknown specialties (and "Emergency"/"Other") have no reference list.
pub fn common_surgeries(specialty: &str) -> &'static [&'static str] {
    match specialty.trim() {
        "Cardiothoracic Surgery" => &[
            "Coronary Artery Bypass Grafting (CABG)",
            "Valve Repair/Replacement",
            "Aortic Aneurysm Repair",
            "Lobectomy",
            "Pneumonectomy",
        ],
        "Colorectal Surgery" => &["Colectomy", "Hemorrhoidectomy", "Fistulectomy", "Rectopexy"],
        "General Surgery" => &[
            "Appendectomy",
            "Cholecystectomy",
            "Hernia Repair (Inguinal, Umbilical, etc.)",
            "Mastectomy",
            "Thyroidectomy",
        ],
        "Neurosurgery" => &[
            "Craniotomy for Tumor Resection",
            "Spinal Fusion",
            "Laminectomy",
            "Ventriculoperitoneal (VP) Shunt",
            "Carotid Endarterectomy",
        ],
        "Obstetrics and Gynecology" => &[
            "Cesarean Section",
            "Hysterectomy (Abdominal, Vaginal, Laparoscopic)",
            "Oophorectomy",
            "Dilation and Curettage (D&C)",
            "Myomectomy",
        ],
        "Ophthalmology" => &[
            "Cataract Extraction",
            "Vitrectomy",
            "Trabeculectomy",
            "Corneal Transplant",
        ],
        "Oral and Maxillofacial Surgery" => &[
            "Wisdom Tooth Extraction",
            "Jaw Reconstruction",
            "Dental Implants",
        ],
        "Orthopedic Surgery" => &[
            "Total Hip Replacement",
            "Total Knee Replacement",
            "Arthroscopy (Knee, Shoulder)",
            "Open Reduction Internal Fixation (ORIF)",
            "Spinal Decompression",
        ],
        "Otolaryngology (ENT)" => &[
            "Tonsillectomy",
            "Septoplasty",
            "Tympanoplasty",
            "Functional Endoscopic Sinus Surgery (FESS)",
            "Laryngoscopy",
        ],
        "Pediatric Surgery" => &["Hernia Repair", "Orchidopexy", "Pyloromyotomy", "Appendectomy"],
        "Plastic and Reconstructive Surgery" => &[
            "Breast Reconstruction",
            "Skin Grafting",
            "Rhinoplasty",
            "Liposuction",
        ],
        "Urology" => &[
            "Transurethral Resection of the Prostate (TURP)",
            "Cystoscopy",
            "Nephrectomy",
            "Ureteroscopy",
            "Vasectomy",
        ],
        "Vascular Surgery" => &[
            "Carotid Endarterectomy",
            "Aneurysm Repair (Aortic, Peripheral)",
            "Angioplasty/Stenting",
            "Varicose Vein Stripping",
        ],
        _ => &[],
    }
}
