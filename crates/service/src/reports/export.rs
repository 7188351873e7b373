use chrono::DateTime;
use models::{Commodity, Report};
use serde::Serialize;
use serde_json::Number;

const NA: &str = "N/A";

/// One spreadsheet row: a report flattened against one of its commodities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Report ID")]
    pub report_id: String,
    #[serde(rename = "Regional Office")]
    pub regional_office: String,
    #[serde(rename = "Field Office")]
    pub field_office: String,
    #[serde(rename = "Application Date")]
    pub application_date: String,
    #[serde(rename = "Inspection Date")]
    pub inspection_date: String,
    #[serde(rename = "Service Type")]
    pub service_type: String,
    #[serde(rename = "Purpose")]
    pub purpose: Option<String>,
    #[serde(rename = "Client Name")]
    pub client_name: String,
    #[serde(rename = "Contact No.")]
    pub contact_number: String,
    #[serde(rename = "CID/Trade License No.")]
    pub trade_cid_number: String,
    #[serde(rename = "Document/PSC No.")]
    pub document_number: Option<String>,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Quantity Inspected/Certified")]
    pub quantity: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Rejected Quantity")]
    pub rejected_quantity: String,
    #[serde(rename = "Movement From")]
    pub movement_from: Option<String>,
    #[serde(rename = "Movement To")]
    pub movement_to: Option<String>,
    #[serde(rename = "Service Provider")]
    pub service_provider: String,
    #[serde(rename = "Fees/Fines")]
    pub fines: Option<Number>,
    #[serde(rename = "Receipt No.")]
    pub receipt_number: Option<String>,
    #[serde(rename = "Remarks")]
    pub remarks: Option<String>,
}

/// `YYYY-MM-DD` for canonical timestamps, the raw text otherwise.
fn day(stored: &str) -> String {
    DateTime::parse_from_rfc3339(stored)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|_| stored.to_string())
}

/// Zero counts as "not given", like an empty spreadsheet cell.
fn given(n: &Option<Number>) -> Option<&Number> {
    n.as_ref().filter(|v| v.as_f64().is_some_and(|v| v != 0.0))
}

fn commodity_cells(c: &Commodity) -> (String, String, String, String) {
    let quantity = c
        .quantity
        .as_ref()
        .map(|q| format!("{} {}", q, c.quantity_unit).trim_end().to_string())
        .unwrap_or_else(|| NA.to_string());
    let value = given(&c.value)
        .map(|v| format!("{}{}", c.value_currency.as_deref().unwrap_or(""), v))
        .unwrap_or_else(|| NA.to_string());
    let rejected = given(&c.rejected_quantity)
        .map(|q| format!("{} {}", q, c.rejected_quantity_unit.as_deref().unwrap_or("")).trim_end().to_string())
        .unwrap_or_else(|| NA.to_string());
    (c.name.clone(), quantity, value, rejected)
}

fn row(report: &Report, cells: (String, String, String, String)) -> ExportRow {
    let f = report.fields();
    let (commodity, quantity, value, rejected_quantity) = cells;
    ExportRow {
        report_id: report.id.to_string(),
        regional_office: f.regional_office,
        field_office: f.other_office,
        application_date: report.application_date().map(|d| day(&d)).unwrap_or_default(),
        inspection_date: report.inspection_date().map(|d| day(&d)).unwrap_or_default(),
        service_type: f.service_type,
        purpose: f.purpose,
        client_name: f.client_name,
        contact_number: f.contact_number,
        trade_cid_number: f.trade_cid_number,
        document_number: f.document_number,
        commodity,
        quantity,
        value,
        rejected_quantity,
        movement_from: f.movement_from,
        movement_to: f.movement_to,
        service_provider: f.service_provider,
        fines: f.fines,
        receipt_number: f.receipt_number,
        remarks: f.remarks,
    }
}

/// One row per commodity; a report without commodities still gets one `N/A` row.
pub fn export_rows(reports: &[Report]) -> Vec<ExportRow> {
    reports
        .iter()
        .flat_map(|report| {
            let commodities = report.fields().commodities;
            if commodities.is_empty() {
                let na = || NA.to_string();
                vec![row(report, (na(), na(), na(), na()))]
            } else {
                commodities.iter().map(|c| row(report, commodity_cells(c))).collect()
            }
        })
        .collect()
}
