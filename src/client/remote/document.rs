//! # Document Store Client
//!
//! Adapter for a document database exposed through a PostgREST-style REST
//! API with two collections:
//!
//! - `events`: one row per event, unique on `event_id`
//! - `students`: roster rows carrying `event_id` and a 1-based `row_number`
//!
//! Saving an event is three requests: upsert the header, delete the roster,
//! insert the new roster. The last two are not atomic; an insert that fails
//! after the delete went through is reported as `PartialFailure`, and the
//! next attempt replaces the roster again.

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::client::remote::{check_status, http_client, RemoteStore};
use crate::shared::config::AppConfig;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::{next_event_id, sort_by_recency, EventId, EventRecord, EventSummary};
use crate::shared::format::lenient;
use crate::shared::student::{Illness, StudentRecord};

/// Row of the `events` collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct EventRow {
    event_id: EventId,
    #[serde(deserialize_with = "lenient::string")]
    event_name: String,
    #[serde(deserialize_with = "lenient::string")]
    event_date: String,
    #[serde(deserialize_with = "lenient::string")]
    venue: String,
    #[serde(deserialize_with = "lenient::string")]
    departure_time: String,
    #[serde(deserialize_with = "lenient::string")]
    return_time: String,
    #[serde(deserialize_with = "lenient::string")]
    vehicle: String,
    #[serde(deserialize_with = "lenient::string")]
    company: String,
    #[serde(deserialize_with = "lenient::string")]
    accompanying: String,
    /// Assigned by the server on every write
    #[serde(deserialize_with = "lenient::timestamp", skip_serializing)]
    last_modified: Option<DateTime<Utc>>,
}

impl EventRow {
    fn from_record(record: &EventRecord) -> Self {
        Self {
            event_id: record.event_id.clone(),
            event_name: record.event_name.clone(),
            event_date: record.event_date.clone(),
            venue: record.venue.clone(),
            departure_time: record.departure_time.clone(),
            return_time: record.return_time.clone(),
            vehicle: record.vehicle.clone(),
            company: record.company.clone(),
            accompanying: record.accompanying.clone(),
            last_modified: None,
        }
    }

    fn into_record(self, students: Vec<StudentRecord>) -> EventRecord {
        EventRecord {
            event_id: self.event_id,
            event_name: self.event_name,
            event_date: self.event_date,
            venue: self.venue,
            departure_time: self.departure_time,
            return_time: self.return_time,
            vehicle: self.vehicle,
            company: self.company,
            accompanying: self.accompanying,
            students,
            last_modified: self.last_modified,
        }
    }
}

/// Row of the `students` collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StudentRow {
    event_id: EventId,
    row_number: u32,
    #[serde(deserialize_with = "lenient::string")]
    name: String,
    #[serde(deserialize_with = "lenient::string")]
    form: String,
    #[serde(deserialize_with = "lenient::string")]
    contact: String,
    illness: Illness,
    #[serde(deserialize_with = "lenient::string")]
    other_illness: String,
    #[serde(deserialize_with = "lenient::flag")]
    taking_medication: bool,
    #[serde(deserialize_with = "lenient::string")]
    medication_details: String,
    #[serde(deserialize_with = "lenient::flag")]
    permission: bool,
    #[serde(deserialize_with = "lenient::flag")]
    present: bool,
}

impl StudentRow {
    fn new(event_id: &EventId, row_number: u32, student: StudentRecord) -> Self {
        Self {
            event_id: event_id.clone(),
            row_number,
            name: student.name,
            form: student.form,
            contact: student.contact,
            illness: student.illness,
            other_illness: student.other_illness,
            taking_medication: student.taking_medication,
            medication_details: student.medication_details,
            permission: student.permission,
            present: student.present,
        }
    }

    fn into_student(self) -> StudentRecord {
        StudentRecord {
            name: self.name,
            form: self.form,
            contact: self.contact,
            illness: self.illness,
            other_illness: self.other_illness,
            taking_medication: self.taking_medication,
            medication_details: self.medication_details,
            permission: self.permission,
            present: self.present,
        }
    }
}

/// REST document store adapter
#[derive(Debug)]
pub struct DocumentClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl DocumentClient {
    pub fn new(config: &AppConfig) -> SyncResult<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: config
                .effective_api_url()
                .map(|url| url.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> SyncResult<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| SyncError::unavailable("Document API URL not configured"))?;
        Ok(format!("{}/{}", base, collection))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    fn eq(event_id: &EventId) -> String {
        format!("eq.{}", event_id)
    }

    async fn fetch_header(&self, event_id: &EventId) -> SyncResult<Option<EventRow>> {
        let url = self.collection_url("events")?;
        let request = self
            .client
            .get(url)
            .query(&[("event_id", Self::eq(event_id)), ("limit", "1".to_string())]);
        let response = check_status(self.authorize(request).send().await?, "fetch event").await?;
        let rows: Vec<EventRow> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_roster(&self, event_id: &EventId) -> SyncResult<Vec<StudentRecord>> {
        let url = self.collection_url("students")?;
        let request = self.client.get(url).query(&[
            ("event_id", Self::eq(event_id)),
            ("order", "row_number.asc".to_string()),
        ]);
        let response = check_status(self.authorize(request).send().await?, "fetch roster").await?;
        let mut rows: Vec<StudentRow> = response.json().await?;
        rows.sort_by_key(|row| row.row_number);
        Ok(rows.into_iter().map(StudentRow::into_student).collect())
    }

    async fn upsert_header(&self, row: &EventRow) -> SyncResult<()> {
        let url = self.collection_url("events")?;
        let request = self
            .client
            .post(url)
            .query(&[("on_conflict", "event_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        check_status(self.authorize(request).send().await?, "upsert event").await?;
        Ok(())
    }

    async fn delete_roster(&self, event_id: &EventId) -> SyncResult<()> {
        let url = self.collection_url("students")?;
        let request = self.client.delete(url).query(&[("event_id", Self::eq(event_id))]);
        check_status(self.authorize(request).send().await?, "delete roster").await?;
        Ok(())
    }

    async fn insert_roster(&self, rows: &[StudentRow]) -> SyncResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.collection_url("students")?;
        let request = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(rows);
        check_status(self.authorize(request).send().await?, "insert roster").await?;
        Ok(())
    }
}

impl RemoteStore for DocumentClient {
    async fn ready(&self) -> SyncResult<()> {
        self.collection_url("events").map(|_| ())
    }

    async fn generate_id(&self, year: i32) -> EventId {
        let scan = async {
            let url = self.collection_url("events")?;
            let request = self.client.get(url).query(&[
                ("select", "event_id".to_string()),
                ("event_id", format!("like.{}-*", year)),
            ]);
            let response = check_status(self.authorize(request).send().await?, "scan ids").await?;
            let rows: Vec<EventRow> = response.json().await?;
            SyncResult::Ok(rows.into_iter().map(|row| row.event_id).collect::<Vec<_>>())
        };
        match scan.await {
            Ok(ids) => next_event_id(year, &ids),
            Err(e) => {
                tracing::warn!("Could not scan event ids, using first id of {}: {}", year, e);
                EventId::first_of_year(year)
            }
        }
    }

    async fn list_events(&self) -> SyncResult<Vec<EventSummary>> {
        let url = self.collection_url("events")?;
        let request = self.client.get(url).query(&[
            ("select", "event_id,event_name,event_date,last_modified"),
            ("order", "last_modified.desc.nullslast"),
        ]);
        let response = check_status(self.authorize(request).send().await?, "list events").await?;
        let rows: Vec<EventRow> = response.json().await?;

        let mut events: Vec<EventSummary> = rows
            .into_iter()
            .map(|row| row.into_record(Vec::new()).to_summary())
            .collect();
        sort_by_recency(&mut events);
        Ok(events)
    }

    async fn fetch_event(&self, event_id: &EventId) -> SyncResult<Option<EventRecord>> {
        let Some(header) = self.fetch_header(event_id).await? else {
            return Ok(None);
        };
        let students = self.fetch_roster(event_id).await?;
        Ok(Some(header.into_record(students)))
    }

    async fn upsert_event(&self, record: &EventRecord) -> SyncResult<()> {
        record.validate()?;
        let event_id = &record.event_id;

        self.upsert_header(&EventRow::from_record(record)).await?;
        self.delete_roster(event_id).await?;

        let rows: Vec<StudentRow> = record
            .persisted_students()
            .into_iter()
            .zip(1u32..)
            .map(|(student, row_number)| StudentRow::new(event_id, row_number, student))
            .collect();
        if let Err(e) = self.insert_roster(&rows).await {
            tracing::error!("Roster for {} deleted but not re-inserted: {}", event_id, e);
            return Err(SyncError::partial(format!(
                "roster for {} was cleared but {} students were not written: {}",
                event_id,
                rows.len(),
                e
            )));
        }

        tracing::info!("Saved {} with {} students", event_id, rows.len());
        Ok(())
    }

    async fn delete_event(&self, event_id: &EventId) -> SyncResult<()> {
        self.delete_roster(event_id).await?;

        let url = self.collection_url("events")?;
        let request = self.client.delete(url).query(&[("event_id", Self::eq(event_id))]);
        check_status(self.authorize(request).send().await?, "delete event").await?;
        Ok(())
    }
}
