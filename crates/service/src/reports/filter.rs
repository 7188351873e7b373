use models::Report;
use serde::Deserialize;

/// Dashboard filter. `None`, empty or `"all"` leaves a dimension unconstrained.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub regional_office: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
}

fn constraint(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        let f = report.fields();
        if let Some(office) = constraint(&self.regional_office) {
            if f.regional_office != office {
                return false;
            }
        }
        if let Some(service_type) = constraint(&self.service_type) {
            if f.service_type != service_type {
                return false;
            }
        }
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = term.to_lowercase();
        contains(Some(f.client_name.as_str()), &needle)
            || contains(Some(f.trade_cid_number.as_str()), &needle)
            || contains(f.document_number.as_deref(), &needle)
            || contains(f.remarks.as_deref(), &needle)
            || contains(Some(f.service_provider.as_str()), &needle)
            || contains(Some(report.id.as_str()), &needle)
    }

    /// Keep matching reports, preserving their order.
    pub fn apply(&self, reports: Vec<Report>) -> Vec<Report> {
        reports.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(id: &str, office: &str, service: &str, client: &str, remarks: Option<&str>) -> Report {
        Report::from_value(json!({
            "id": id,
            "applicationDate": "2024-05-01T00:00:00.000Z",
            "inspectionDate": "2024-05-01T00:00:00.000Z",
            "regionalOffice": office,
            "serviceType": service,
            "clientName": client,
            "remarks": remarks
        }))
        .expect("object literal")
    }

    fn sample() -> Vec<Report> {
        vec![
            report("RPT-003", "Paro Regional Office", "Import Permit", "Druk Traders", None),
            report("RPT-002", "Gelephu", "Export Certification", "Karma", Some("Seal broken")),
            report("RPT-001", "Paro Regional Office", "Import Inspection", "Pema", None),
        ]
    }

    fn ids(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_and_all_filters_keep_everything() {
        let all = ReportFilter {
            search: Some("  ".into()),
            regional_office: Some("all".into()),
            service_type: None,
        };
        assert_eq!(all.apply(sample()).len(), 3);
        assert_eq!(ReportFilter::default().apply(sample()).len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let by_remark = ReportFilter { search: Some("SEAL".into()), ..ReportFilter::default() };
        assert_eq!(ids(&by_remark.apply(sample())), vec!["RPT-002"]);

        let by_id = ReportFilter { search: Some("rpt-00".into()), ..ReportFilter::default() };
        assert_eq!(ids(&by_id.apply(sample())), vec!["RPT-003", "RPT-002", "RPT-001"]);
    }

    #[test]
    fn office_and_service_type_are_exact() {
        let f = ReportFilter {
            regional_office: Some("Paro Regional Office".into()),
            service_type: Some("Import Inspection".into()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(&f.apply(sample())), vec!["RPT-001"]);
    }
}
