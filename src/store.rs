use crate::fields::Record;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

pub fn fingerprint(record: &Record) -> String {
    let bytes = serde_json::to_vec(record).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone)]
pub struct StoredReport {
    pub record: Record,
    pub revision: u64,
    pub fingerprint: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub report_id: String,
    pub revision: u64,
    pub fingerprint: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    #[serde(flatten)]
    pub meta: ReportMeta,
    pub key_count: usize,
}

/// Editable clone of one report. Resolution runs against `record` as it
/// is mutated.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub report_id: String,
    pub base_revision: u64,
    base: Record,
    pub record: Record,
}

impl EditSession {
    pub fn dirty(&self) -> bool {
        self.record != self.base
    }
}

/// In-memory snapshots plus open edit sessions. Nothing here touches disk.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: HashMap<String, StoredReport>,
    sessions: HashMap<String, EditSession>,
}

impl ReportStore {
    fn meta(report_id: &str, r: &StoredReport) -> ReportMeta {
        ReportMeta {
            report_id: report_id.to_string(),
            revision: r.revision,
            fingerprint: r.fingerprint.clone(),
            updated_at: r.updated_at.clone(),
        }
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Stores a snapshot. Reloading an id bumps its revision.
    pub fn load(&mut self, report_id: Option<String>, record: Record) -> ReportMeta {
        let report_id = report_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let revision = self
            .reports
            .get(&report_id)
            .map(|r| r.revision + 1)
            .unwrap_or(1);
        self.put(report_id, record, revision)
    }

    fn put(&mut self, report_id: String, record: Record, revision: u64) -> ReportMeta {
        let stored = StoredReport {
            fingerprint: fingerprint(&record),
            record,
            revision,
            updated_at: now_rfc3339(),
        };
        let meta = Self::meta(&report_id, &stored);
        tracing::info!(
            report_id = %meta.report_id,
            revision = meta.revision,
            fingerprint = %meta.fingerprint,
            "report stored"
        );
        self.reports.insert(report_id, stored);
        meta
    }

    pub fn get(&self, report_id: &str) -> Result<(&StoredReport, ReportMeta), StoreError> {
        self.reports
            .get(report_id)
            .map(|r| (r, Self::meta(report_id, r)))
            .ok_or_else(|| StoreError::new("not_found", format!("report not found: {report_id}")))
    }

    pub fn list(&self) -> Vec<ReportListItem> {
        let mut out: Vec<ReportListItem> = self
            .reports
            .iter()
            .map(|(id, r)| ReportListItem {
                meta: Self::meta(id, r),
                key_count: r.record.len(),
            })
            .collect();
        out.sort_by(|a, b| a.meta.report_id.cmp(&b.meta.report_id));
        out
    }

    /// Drops the report and any sessions editing it.
    pub fn remove(&mut self, report_id: &str) -> bool {
        let removed = self.reports.remove(report_id).is_some();
        self.sessions.retain(|_, s| s.report_id != report_id);
        removed
    }

    pub fn begin(&mut self, report_id: &str) -> Result<(String, u64), StoreError> {
        let (stored, _) = self.get(report_id)?;
        let session = EditSession {
            report_id: report_id.to_string(),
            base_revision: stored.revision,
            base: stored.record.clone(),
            record: stored.record.clone(),
        };
        let base_revision = session.base_revision;
        let session_id = Uuid::new_v4().to_string();
        tracing::debug!(%session_id, report_id, "edit session opened");
        self.sessions.insert(session_id.clone(), session);
        Ok((session_id, base_revision))
    }

    pub fn session(&self, session_id: &str) -> Result<&EditSession, StoreError> {
        self.sessions.get(session_id).ok_or_else(|| {
            StoreError::new("not_found", format!("session not found: {session_id}"))
        })
    }

    pub fn session_mut(&mut self, session_id: &str) -> Result<&mut EditSession, StoreError> {
        self.sessions.get_mut(session_id).ok_or_else(|| {
            StoreError::new("not_found", format!("session not found: {session_id}"))
        })
    }

    /// Replaces the snapshot wholesale with the session's record and closes
    /// the session.
    pub fn commit(&mut self, session_id: &str) -> Result<ReportMeta, StoreError> {
        let session = self.sessions.remove(session_id).ok_or_else(|| {
            StoreError::new("not_found", format!("session not found: {session_id}"))
        })?;
        let revision = self
            .reports
            .get(&session.report_id)
            .map(|r| r.revision + 1)
            .ok_or_else(|| {
                StoreError::new(
                    "not_found",
                    format!("report not found: {}", session.report_id),
                )
            })?;
        Ok(self.put(session.report_id, session.record, revision))
    }

    pub fn cancel(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }
}
