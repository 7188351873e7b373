use std::{path::PathBuf, sync::Arc};

use configs::StorageMode;
use models::{Report, ReportId, ReportInput, APPLICATION_DATE, INSPECTION_DATE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use tracing::{info, instrument, warn};

use super::dates;
use super::repository::ReportRepository;
use crate::errors::ServiceError;
use crate::storage::JsonSnapshotStore;

/// One element of the snapshot array.
///
/// Anything that is not an object with a string `id` is kept as written and
/// carried through every rewrite, so one odd record never costs the others.
#[derive(Debug, Clone)]
enum StoredRecord {
    Report(Report),
    Foreign(Box<RawValue>),
}

impl StoredRecord {
    fn id(&self) -> Option<&ReportId> {
        match self {
            StoredRecord::Report(report) => Some(&report.id),
            StoredRecord::Foreign(_) => None,
        }
    }
}

impl Serialize for StoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StoredRecord::Report(report) => report.serialize(serializer),
            StoredRecord::Foreign(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StoredRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(match serde_json::from_str::<Report>(raw.get()) {
            Ok(report) => StoredRecord::Report(report),
            Err(_) => StoredRecord::Foreign(raw),
        })
    }
}

/// File-backed report store.
/// Keeps the full report list, newest first, as one JSON array on disk.
#[derive(Clone)]
pub struct ReportStore {
    snapshot: Arc<JsonSnapshotStore<StoredRecord>>,
}

impl ReportStore {
    /// Initialize the store from the given file path. A missing file reads as empty.
    pub async fn new<P: Into<PathBuf>>(path: P, mode: StorageMode) -> Result<Arc<Self>, ServiceError> {
        let snapshot = JsonSnapshotStore::<StoredRecord>::new(path, mode).await?;
        Ok(Arc::new(Self { snapshot }))
    }

    /// All reports in stored (newest-first) order.
    pub async fn list(&self) -> Result<Vec<Report>, ServiceError> {
        let records = self.snapshot.read_all().await?;
        let total = records.len();
        let reports: Vec<Report> = records
            .into_iter()
            .filter_map(|record| match record {
                StoredRecord::Report(report) => Some(report),
                StoredRecord::Foreign(_) => None,
            })
            .collect();
        if reports.len() < total {
            warn!(skipped = total - reports.len(), "snapshot holds records without a usable id");
        }
        Ok(reports)
    }

    /// Persist a new report at the head of the list.
    ///
    /// The id is allocated from the highest existing sequence; any `id` the
    /// caller sent is discarded. Dates are normalized before the snapshot is
    /// touched, so a bad date never causes a write. Every other field is
    /// stored exactly as the caller wrote it.
    #[instrument(skip(self, input), fields(service_type = %input.fields().service_type))]
    pub async fn add(&self, input: ReportInput) -> Result<Report, ServiceError> {
        let application_date = dates::normalize(APPLICATION_DATE, input.date(APPLICATION_DATE).as_ref())?;
        let inspection_date = dates::normalize(INSPECTION_DATE, input.date(INSPECTION_DATE).as_ref())?;
        let mut body = input.body;
        body.remove("id");
        body.set(APPLICATION_DATE, &application_date)
            .and_then(|()| body.set(INSPECTION_DATE, &inspection_date))
            .map_err(|e| ServiceError::Serialization(e.to_string()))?;

        let (report, total) = self
            .snapshot
            .update_recovering(move |records, unreadable| {
                // ids already handed out from a snapshot that no longer decodes stay taken
                let floor = unreadable.map_or(0, |bytes| ReportId::max_sequence_in(&String::from_utf8_lossy(bytes)));
                let max = ReportId::max_sequence(records.iter().filter_map(StoredRecord::id)).max(floor);
                let id = ReportId::after_sequence(max).ok_or(ServiceError::IdExhausted)?;
                let report = Report { id, body };
                records.insert(0, StoredRecord::Report(report.clone()));
                Ok((report, records.len()))
            })
            .await?;
        info!(report_id = %report.id, total, "report added");
        Ok(report)
    }

    /// Delete every report with the given id.
    #[instrument(skip(self, id), fields(report_id = %id))]
    pub async fn delete(&self, id: &ReportId) -> Result<(), ServiceError> {
        let removed = self
            .snapshot
            .update(|records| {
                let before = records.len();
                records.retain(|r| r.id() != Some(id));
                match before - records.len() {
                    0 => Err(ServiceError::report_not_found(id)),
                    n => Ok(n),
                }
            })
            .await?;
        info!(report_id = %id, removed, "report deleted");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReportRepository for ReportStore {
    async fn list(&self) -> Result<Vec<Report>, ServiceError> { self.list().await }
    async fn add(&self, input: ReportInput) -> Result<Report, ServiceError> { self.add(input).await }
    async fn delete(&self, id: &ReportId) -> Result<(), ServiceError> { self.delete(id).await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir().join(format!("svc_reports_{}.json", Uuid::new_v4()))
    }

    fn input(client: &str) -> ReportInput {
        ReportInput::from_value(json!({
            "applicationDate": "2024-05-01",
            "inspectionDate": "2024-05-02T09:30:00+06:00",
            "regionalOffice": "Paro Regional Office",
            "otherOffice": "Paro",
            "serviceType": "Import Permit",
            "clientName": client,
            "commodities": [{"name": "Apples", "quantity": 20, "quantityUnit": "Kgs"}]
        }))
        .expect("object literal")
    }

    async fn seed_raw(path: &PathBuf, records: Value) -> Result<(), anyhow::Error> {
        tokio::fs::write(path, serde_json::to_vec_pretty(&records)?).await?;
        Ok(())
    }

    async fn seed(path: &PathBuf, ids: &[&str]) -> Result<(), anyhow::Error> {
        let records: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "applicationDate": "2024-01-01T00:00:00.000Z", "inspectionDate": "2024-01-01T00:00:00.000Z"}))
            .collect();
        seed_raw(path, Value::Array(records)).await
    }

    async fn ids(store: &ReportStore) -> Result<Vec<String>, ServiceError> {
        Ok(store.list().await?.into_iter().map(|r| r.id.to_string()).collect())
    }

    async fn quarantined_files(path: &PathBuf) -> Result<Vec<PathBuf>, anyhow::Error> {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(std::env::temp_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&format!("{name}.corrupt-")) {
                found.push(entry.path());
            }
        }
        Ok(found)
    }

    #[tokio::test]
    async fn list_without_snapshot_is_empty() -> Result<(), anyhow::Error> {
        let store = ReportStore::new(tmp_path(), StorageMode::Strict).await?;
        assert!(store.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn add_is_newest_first_with_sequential_ids() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;

        let r1 = store.add(input("first")).await?;
        let r2 = store.add(input("second")).await?;
        assert_eq!(r1.id, "RPT-001");
        assert_eq!(r2.id, "RPT-002");

        let listed = store.list().await?;
        assert_eq!(listed, vec![r2, r1]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn id_allocation_rolls_over_padding() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let nine: Vec<String> = (1..=9).map(|n| ReportId::from_sequence(n).to_string()).collect();
        seed(&tmp, &nine.iter().map(String::as_str).collect::<Vec<_>>()).await?;
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        assert_eq!(store.add(input("tenth")).await?.id, "RPT-010");

        seed(&tmp, &["RPT-999"]).await?;
        assert_eq!(store.add(input("thousandth")).await?.id, "RPT-1000");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn id_allocation_uses_max_of_unsorted_ids() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        seed(&tmp, &["RPT-003", "RPT-001", "imported-7"]).await?;
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        assert_eq!(store.add(input("next")).await?.id, "RPT-004");
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_error_not_a_reissue() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let last = ReportId::from_sequence(u64::MAX).to_string();
        seed(&tmp, &[last.as_str()]).await?;
        let before = tokio::fs::read(&tmp).await?;

        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        assert!(matches!(store.add(input("overflow")).await, Err(ServiceError::IdExhausted)));
        assert_eq!(tokio::fs::read(&tmp).await?, before);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_match_then_reports_not_found() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        let a = store.add(input("a")).await?;
        let b = store.add(input("b")).await?;

        store.delete(&a.id).await?;
        let listed = store.list().await?;
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|r| r.id != a.id));
        assert_eq!(listed[0].id, b.id);

        let before = tokio::fs::read(&tmp).await?;
        let second = store.delete(&a.id).await;
        assert!(matches!(&second, Err(ServiceError::NotFound(msg)) if msg.contains("RPT-001")));
        assert_eq!(tokio::fs::read(&tmp).await?, before);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_every_duplicate() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        seed(&tmp, &["RPT-002", "RPT-001", "RPT-002"]).await?;
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        store.delete(&ReportId::from("RPT-002")).await?;
        assert_eq!(ids(&store).await?, vec!["RPT-001"]);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn round_trip_keeps_caller_fields_and_normalizes_dates() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        let body = r#"{
            "id": "RPT-777",
            "applicationDate": "2024-05-01",
            "inspectionDate": 1714521600000,
            "regionalOffice": "Gelephu",
            "otherOffice": "Tsirang",
            "serviceType": "Export Certification",
            "purpose": null,
            "clientName": "Karma",
            "contactNumber": "77112233",
            "tradeCidNumber": "11506001234",
            "documentNumber": "EC-9",
            "commodities": [{"name":"Cardamom","quantity":1e2,"quantityUnit":"Kgs","value":9000,"valueCurrency":"Nu."}],
            "movementFrom": "Gelephu",
            "movementTo": "Dhaka",
            "serviceProvider": "System User",
            "fines": 0,
            "remarks": null,
            "vehicleNumber": "BG-2-A0420"
        }"#;
        let sent: ReportInput = serde_json::from_str(body)?;
        let added = store.add(sent.clone()).await?;
        let stored = store.list().await?.remove(0);

        assert_eq!(stored.id, "RPT-001");
        assert_eq!(stored.application_date().as_deref(), Some("2024-05-01T00:00:00.000Z"));
        assert_eq!(stored.inspection_date().as_deref(), Some("2024-05-01T00:00:00.000Z"));
        for (key, raw) in sent.body.iter() {
            if matches!(key, "id" | "applicationDate" | "inspectionDate") {
                continue;
            }
            assert_eq!(stored.body.raw(key), Some(raw.get()), "field {key} changed");
        }
        assert_eq!(stored.body.len(), sent.body.len() - 1);
        assert_eq!(stored.body.raw("purpose"), Some("null"));
        assert!(stored.body.raw("commodities").is_some_and(|c| c.contains(r#""quantity":1e2"#)));
        assert_eq!(added, stored);

        let on_disk = tokio::fs::read_to_string(&tmp).await?;
        assert!(on_disk.contains(r#""remarks": null"#));
        assert!(on_disk.contains("1e2"));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn bad_or_missing_date_is_rejected_without_writing() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        let mut bad = input("x");
        bad.body.set(INSPECTION_DATE, "soon")?;
        assert!(matches!(store.add(bad).await, Err(ServiceError::Validation(_))));

        let mut missing = input("y");
        missing.body.remove(APPLICATION_DATE);
        assert!(matches!(store.add(missing).await, Err(ServiceError::Validation(_))));

        assert!(tokio::fs::metadata(&tmp).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_do_not_lose_updates() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.add(input(&format!("client-{n}"))).await }));
        }
        for h in handles {
            h.await??;
        }

        let listed = store.list().await?;
        assert_eq!(listed.len(), 16);
        let mut seqs: Vec<u64> = listed.iter().map(|r| r.id.sequence()).collect();
        // newest first means strictly decreasing sequences
        assert!(seqs.windows(2).all(|w| w[0] > w[1]));
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=16).collect::<Vec<u64>>());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn mistyped_fields_do_not_discard_the_snapshot() -> Result<(), anyhow::Error> {
        for mode in [StorageMode::Strict, StorageMode::Lenient] {
            let tmp = tmp_path();
            seed_raw(
                &tmp,
                json!([
                    {"id": "RPT-002", "clientName": null, "commodities": "none", "fines": "n/a"},
                    {"id": "RPT-001", "clientName": 42, "applicationDate": false}
                ]),
            )
            .await?;
            let store = ReportStore::new(&tmp, mode).await?;
            assert_eq!(ids(&store).await?, vec!["RPT-002", "RPT-001"]);

            assert_eq!(store.add(input("after")).await?.id, "RPT-003");
            assert_eq!(ids(&store).await?, vec!["RPT-003", "RPT-002", "RPT-001"]);

            let on_disk: Value = serde_json::from_slice(&tokio::fs::read(&tmp).await?)?;
            assert_eq!(on_disk[1], json!({"id": "RPT-002", "clientName": null, "commodities": "none", "fines": "n/a"}));
            assert_eq!(on_disk[2], json!({"id": "RPT-001", "clientName": 42, "applicationDate": false}));

            let _ = tokio::fs::remove_file(&tmp).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn records_without_usable_id_survive_rewrites() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        seed_raw(&tmp, json!([{"id": "RPT-004"}, {"id": null, "note": "legacy"}, "stray", {"id": "RPT-002"}])).await?;
        let store = ReportStore::new(&tmp, StorageMode::Strict).await?;
        assert_eq!(ids(&store).await?, vec!["RPT-004", "RPT-002"]);

        assert_eq!(store.add(input("new")).await?.id, "RPT-005");
        store.delete(&ReportId::from("RPT-002")).await?;

        let on_disk: Value = serde_json::from_slice(&tokio::fs::read(&tmp).await?)?;
        assert_eq!(on_disk[0]["id"], "RPT-005");
        let kept = on_disk.as_array().map(|records| records[1..].to_vec());
        assert_eq!(
            kept,
            Some(vec![json!({"id": "RPT-004"}), json!({"id": null, "note": "legacy"}), json!("stray")])
        );

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn lenient_store_recovers_from_corrupt_snapshot() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        tokio::fs::write(&tmp, b"[{\"id\": ").await?;

        let strict = ReportStore::new(&tmp, StorageMode::Strict).await?;
        assert!(matches!(strict.list().await, Err(ServiceError::Corrupt { .. })));
        assert!(strict.add(input("blocked")).await.is_err());
        assert!(quarantined_files(&tmp).await?.is_empty());

        let lenient = ReportStore::new(&tmp, StorageMode::Lenient).await?;
        assert!(lenient.list().await?.is_empty());
        assert_eq!(lenient.add(input("fresh")).await?.id, "RPT-001");
        assert_eq!(lenient.list().await?.len(), 1);

        for moved in quarantined_files(&tmp).await? {
            let _ = tokio::fs::remove_file(moved).await;
        }
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn lenient_recovery_never_reissues_old_ids() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let truncated = br#"[{"id": "RPT-005", "clientName": "Pema"}, {"id": "RPT-004", "clientN"#;
        tokio::fs::write(&tmp, truncated).await?;

        let store = ReportStore::new(&tmp, StorageMode::Lenient).await?;
        assert_eq!(store.add(input("after crash")).await?.id, "RPT-006");
        assert_eq!(ids(&store).await?, vec!["RPT-006"]);

        let moved = quarantined_files(&tmp).await?;
        assert_eq!(moved.len(), 1);
        assert_eq!(tokio::fs::read(&moved[0]).await?, truncated.to_vec());

        let _ = tokio::fs::remove_file(&moved[0]).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
