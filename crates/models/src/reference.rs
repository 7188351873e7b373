//! Reference lists offered by the submission form.

use serde::Serialize;

pub const IMPORT_INSPECTION: &str = "Import Inspection";
pub const REGULATORY_INSPECTION: &str = "Regulatory Inspection/Illegal";
pub const PHYTOSANITARY_CERTIFICATE: &str = "Phytosanitary Certificate";
pub const COMMERCIAL: &str = "Commercial";

/// Regional offices and the field offices reporting to each.
pub const REGIONAL_OFFICES: &[(&str, &[&str])] = &[
    (
        "Phuentsholing Regional Office",
        &["Phuentsholing", "Gedu", "Samtse", "Lhamoizingkha"],
    ),
    ("Paro Regional Office", &["Paro", "Thimphu", "Wangdue"]),
    ("Gelephu", &["Gelephu", "Tsirang", "Dagana", "Trongsa", "Zhemgang"]),
    ("Mongar Regional Office", &["Mongar", "Trashigang", "Bumthang"]),
    (
        "Samdrup Jongkhar Regional Office",
        &["Samdrup Jongkhar", "Pema Gatshel", "Nganglam", "Samdrup Choling"],
    ),
];

pub const SERVICE_TYPES: &[&str] = &[
    PHYTOSANITARY_CERTIFICATE,
    "Import Permit",
    "In-Country Movement Permit",
    IMPORT_INSPECTION,
    "Export Certification",
    REGULATORY_INSPECTION,
    "PSC for Re-export",
];

pub const PURPOSE_TYPES: &[&str] = &[COMMERCIAL, "Personal"];

pub const QUANTITY_UNITS: &[&str] = &[
    "Kgs", "MT", "Grams", "CFT", "SqFT", "CBM", "Nos.", "Bags", "Bundles", "Boxes", "NA",
];

pub const CURRENCIES: &[&str] = &["Nu.", "$", "INR", "NA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovementLabels {
    pub from: &'static str,
    pub to: &'static str,
}

/// Labels shown for the movement fields of a service type.
pub fn movement_labels(service_type: &str) -> MovementLabels {
    let (from, to) = match service_type {
        PHYTOSANITARY_CERTIFICATE | "Export Certification" | "PSC for Re-export" => {
            ("Movement from", "Export to")
        }
        "Import Permit" | IMPORT_INSPECTION => ("Import from", "Movement to"),
        REGULATORY_INSPECTION => ("N/A", "N/A"),
        _ => ("Movement from", "Movement to"),
    };
    MovementLabels { from, to }
}

/// Inspection-type services carry neither a purpose nor a document number.
pub fn disables_purpose(service_type: &str) -> bool {
    matches!(service_type, IMPORT_INSPECTION | REGULATORY_INSPECTION)
}

pub fn disables_value(service_type: &str) -> bool {
    service_type == IMPORT_INSPECTION
}

pub fn disables_movement(service_type: &str) -> bool {
    service_type == IMPORT_INSPECTION
}

pub fn is_phyto_commercial(service_type: &str, purpose: Option<&str>) -> bool {
    service_type == PHYTOSANITARY_CERTIFICATE && purpose == Some(COMMERCIAL)
}

pub fn field_offices(regional_office: &str) -> Option<&'static [&'static str]> {
    REGIONAL_OFFICES
        .iter()
        .find(|(name, _)| *name == regional_office)
        .map(|(_, offices)| *offices)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalOffice {
    pub name: &'static str,
    pub field_offices: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeInfo {
    pub name: &'static str,
    pub movement_labels: MovementLabels,
    pub purpose_disabled: bool,
    pub value_disabled: bool,
    pub movement_disabled: bool,
}

/// Everything the form needs to render its selects, in one payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub regional_offices: Vec<RegionalOffice>,
    pub service_types: Vec<ServiceTypeInfo>,
    pub purpose_types: &'static [&'static str],
    pub quantity_units: &'static [&'static str],
    pub currencies: &'static [&'static str],
}

impl ReferenceData {
    pub fn build() -> Self {
        Self {
            regional_offices: REGIONAL_OFFICES
                .iter()
                .map(|&(name, field_offices)| RegionalOffice { name, field_offices })
                .collect(),
            service_types: SERVICE_TYPES
                .iter()
                .map(|&name| ServiceTypeInfo {
                    name,
                    movement_labels: movement_labels(name),
                    purpose_disabled: disables_purpose(name),
                    value_disabled: disables_value(name),
                    movement_disabled: disables_movement(name),
                })
                .collect(),
            purpose_types: PURPOSE_TYPES,
            quantity_units: QUANTITY_UNITS,
            currencies: CURRENCIES,
        }
    }
}
