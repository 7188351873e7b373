//! Submission rules: which fields a service type requires or disables.
//!
//! These run at the form boundary before a report reaches the store.

use serde_json::Number;

use crate::errors::{FieldIssue, ModelError};
use crate::reference::{self, disables_movement, disables_purpose, disables_value, is_phyto_commercial};
use crate::report::{Commodity, Payload, ReportInput};

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_opt(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, blank)
}

fn positive(n: &Option<Number>) -> bool {
    n.as_ref().and_then(Number::as_f64).is_some_and(|v| v > 0.0)
}

fn non_negative(n: &Option<Number>) -> bool {
    n.as_ref().map_or(true, |v| v.as_f64().is_some_and(|v| v >= 0.0))
}

impl ReportInput {
    /// Remove the fields the selected service type disables. Everything else is left byte for byte.
    pub fn apply_service_rules(&mut self) -> Result<(), ModelError> {
        let service_type = self.fields().service_type;
        if disables_purpose(&service_type) {
            self.body.remove("purpose");
            self.body.remove("documentNumber");
        }
        if disables_value(&service_type) {
            if let Ok(mut lines) = serde_json::from_str::<Vec<Payload>>(self.body.raw("commodities").unwrap_or("null")) {
                for line in &mut lines {
                    line.remove("value");
                    line.remove("valueCurrency");
                }
                self.body.set("commodities", &lines)?;
            }
        }
        if disables_movement(&service_type) {
            self.body.remove("movementFrom");
            self.body.remove("movementTo");
        }
        Ok(())
    }

    /// Check required fields and number ranges; every violation is reported, not just the first.
    pub fn validate(&self) -> Result<(), ModelError> {
        let f = self.fields();
        let mut issues = Vec::new();
        let phyto_commercial = is_phyto_commercial(&f.service_type, f.purpose.as_deref());

        if blank(&f.regional_office) {
            issues.push(FieldIssue::new("regionalOffice", "Regional office is required."));
        } else if let Some(offices) = reference::field_offices(&f.regional_office) {
            if blank(&f.other_office) {
                issues.push(FieldIssue::new("otherOffice", "This office is required."));
            } else if !offices.contains(&f.other_office.as_str()) {
                issues.push(FieldIssue::new("otherOffice", "Office does not belong to the selected regional office."));
            }
        } else {
            issues.push(FieldIssue::new("regionalOffice", "Unknown regional office."));
        }

        if blank(&f.service_type) {
            issues.push(FieldIssue::new("serviceType", "Service type is required."));
        } else if !reference::SERVICE_TYPES.contains(&f.service_type.as_str()) {
            issues.push(FieldIssue::new("serviceType", "Unknown service type."));
        }

        if !disables_purpose(&f.service_type) {
            if blank_opt(&f.purpose) {
                issues.push(FieldIssue::new("purpose", "Purpose is required for this service type."));
            }
            if blank_opt(&f.document_number) {
                let msg = if phyto_commercial { "PSC No. is required." } else { "Document number is required." };
                issues.push(FieldIssue::new("documentNumber", msg));
            }
        }

        if blank(&f.client_name) {
            let msg = if phyto_commercial { "Name of Client is required." } else { "Client name is required." };
            issues.push(FieldIssue::new("clientName", msg));
        }
        if blank(&f.contact_number) {
            issues.push(FieldIssue::new("contactNumber", "Contact number is required."));
        }
        if blank(&f.trade_cid_number) {
            let msg = if phyto_commercial { "Trade License No. is required." } else { "Trade License/CID number is required." };
            issues.push(FieldIssue::new("tradeCidNumber", msg));
        }

        if f.commodities.is_empty() {
            issues.push(FieldIssue::new("commodities", "Please add at least one commodity."));
        }
        for (i, c) in f.commodities.iter().enumerate() {
            commodity_issues(i, c, &mut issues);
        }

        if !disables_movement(&f.service_type) {
            if blank_opt(&f.movement_from) {
                issues.push(FieldIssue::new("movementFrom", "This field is required."));
            }
            if blank_opt(&f.movement_to) {
                issues.push(FieldIssue::new("movementTo", "This field is required."));
            }
        }

        if blank(&f.service_provider) {
            issues.push(FieldIssue::new("serviceProvider", "Service provider name is required."));
        }
        if !non_negative(&f.fines) {
            issues.push(FieldIssue::new("fines", "Must be a non-negative number."));
        }

        if issues.is_empty() { Ok(()) } else { Err(ModelError::Rejected(issues)) }
    }

    /// Apply the service rules, then validate.
    pub fn prepare(mut self) -> Result<Self, ModelError> {
        self.apply_service_rules()?;
        self.validate()?;
        Ok(self)
    }
}

fn commodity_issues(index: usize, c: &Commodity, issues: &mut Vec<FieldIssue>) {
    let field = |name: &str| format!("commodities.{index}.{name}");
    if blank(&c.name) {
        issues.push(FieldIssue::new(field("name"), "Commodity name is required."));
    }
    if !positive(&c.quantity) {
        issues.push(FieldIssue::new(field("quantity"), "Must be a positive number."));
    }
    if !non_negative(&c.value) {
        issues.push(FieldIssue::new(field("value"), "Must be a non-negative number."));
    }
    if !non_negative(&c.rejected_quantity) {
        issues.push(FieldIssue::new(field("rejectedQuantity"), "Must be a non-negative number."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn permit_json() -> Value {
        json!({
            "applicationDate": "2024-05-01",
            "inspectionDate": "2024-05-02",
            "regionalOffice": "Paro Regional Office",
            "otherOffice": "Thimphu",
            "serviceType": "Import Permit",
            "purpose": "Commercial",
            "clientName": "Druk Traders",
            "contactNumber": "17123456",
            "tradeCidNumber": "TL-0099",
            "documentNumber": "IP/2024/17",
            "commodities": [{"name": "Apples", "quantity": 120, "quantityUnit": "Kgs"}],
            "movementFrom": "Jaigaon",
            "movementTo": "Thimphu",
            "serviceProvider": "Inspector Dorji"
        })
    }

    fn input(value: Value) -> ReportInput {
        ReportInput::from_value(value).expect("object literal")
    }

    fn permit_with(edit: impl FnOnce(&mut serde_json::Map<String, Value>)) -> ReportInput {
        let mut value = permit_json();
        if let Value::Object(map) = &mut value {
            edit(map);
        }
        input(value)
    }

    fn fields_of(err: ModelError) -> Vec<String> {
        err.issues().into_iter().map(|i| i.field).collect()
    }

    #[test]
    fn complete_permit_passes() {
        assert!(input(permit_json()).validate().is_ok());
    }

    #[test]
    fn missing_purpose_and_document_are_reported_together() {
        let input = permit_with(|m| {
            m.remove("purpose");
            m.insert("documentNumber".into(), json!("  "));
        });
        let fields = fields_of(input.validate().unwrap_err());
        assert_eq!(fields, vec!["purpose", "documentNumber"]);
    }

    #[test]
    fn import_inspection_clears_disabled_fields() -> Result<(), ModelError> {
        let input = permit_with(|m| {
            m.insert("serviceType".into(), json!("Import Inspection"));
            m.insert(
                "commodities".into(),
                json!([{"name": "Apples", "quantity": 120, "quantityUnit": "Kgs", "value": 500, "valueCurrency": "Nu.", "grade": "A"}]),
            );
        });
        let prepared = input.prepare()?;
        let f = prepared.fields();
        assert!(f.purpose.is_none());
        assert!(f.document_number.is_none());
        assert!(f.movement_from.is_none());
        assert!(!prepared.body.contains_key("movementTo"));
        assert!(f.commodities[0].value.is_none());
        assert!(f.commodities[0].value_currency.is_none());
        assert_eq!(
            prepared.body.value("commodities"),
            Some(json!([{"name": "Apples", "quantity": 120, "quantityUnit": "Kgs", "grade": "A"}]))
        );
        Ok(())
    }

    #[test]
    fn enabled_fields_keep_their_raw_text() -> Result<(), ModelError> {
        let original = ReportInput {
            body: serde_json::from_str(
                r#"{"serviceType":"Import Permit","commodities":[{"quantity":1e2,"value":5.0}],"remarks":null}"#,
            )?,
        };
        let mut input = original.clone();
        input.apply_service_rules()?;
        assert_eq!(input, original);
        Ok(())
    }

    #[test]
    fn phyto_commercial_uses_psc_wording() {
        let input = permit_with(|m| {
            m.insert("serviceType".into(), json!("Phytosanitary Certificate"));
            m.remove("documentNumber");
        });
        let issues = input.validate().unwrap_err().issues();
        assert_eq!(issues, vec![FieldIssue::new("documentNumber", "PSC No. is required.")]);
    }

    #[test]
    fn commodity_numbers_are_range_checked() {
        let input = permit_with(|m| {
            m.insert(
                "commodities".into(),
                json!([{"name": "Apples", "quantity": 0, "quantityUnit": "Kgs", "rejectedQuantity": -1.5}]),
            );
            m.insert("fines".into(), json!(-10.0));
        });
        let fields = fields_of(input.validate().unwrap_err());
        assert_eq!(
            fields,
            vec!["commodities.0.quantity", "commodities.0.rejectedQuantity", "fines"]
        );
    }

    #[test]
    fn mistyped_fields_are_rejected_not_dropped() {
        let input = permit_with(|m| {
            m.insert("clientName".into(), Value::Null);
            m.insert("commodities".into(), json!([{"name": "Apples", "quantity": "lots", "quantityUnit": "Kgs"}]));
        });
        let fields = fields_of(input.validate().unwrap_err());
        assert_eq!(fields, vec!["clientName", "commodities.0.quantity"]);
    }

    #[test]
    fn no_commodities_and_wrong_office() {
        let input = permit_with(|m| {
            m.insert("commodities".into(), json!([]));
            m.insert("otherOffice".into(), json!("Mongar"));
        });
        let fields = fields_of(input.validate().unwrap_err());
        assert_eq!(fields, vec!["otherOffice", "commodities"]);
    }
}
