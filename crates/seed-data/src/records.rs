//! Source records and their translation into store insert requests.
//!
//! Records use the camelCase field names of the JSON seed files. Each record
//! kind knows how to become a [`CreateRequest`]:
//! - optional foreign keys that are null or absent become [`Link::Unset`] and
//!   are left out of the request;
//! - foreign keys with a value connect to the existing row by key;
//! - date fields are parsed into UTC timestamps only when present;
//! - other scalars pass through unchanged.

use board::relations::{
    ATTACHMENT_TASK, ATTACHMENT_UPLOADED_BY, COMMENT_TASK, COMMENT_USER, PROJECT_TEAM_PROJECT,
    PROJECT_TEAM_TEAM, TASK_ASSIGNEE, TASK_ASSIGNMENT_TASK, TASK_ASSIGNMENT_USER, TASK_AUTHOR,
    TASK_PROJECT, USER_TEAM,
};
use board::{CreateRequest, EntityKey, EntityKind, Link};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// A record that failed to parse or transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Zero-based position in the set, when the failure is tied to one record.
    pub index: Option<usize>,
    pub reason: String,
}

impl RecordError {
    fn at(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            reason: reason.into(),
        }
    }
}

/// A source record that can be inserted into the store.
pub trait SeedRecord: DeserializeOwned {
    const KIND: EntityKind;

    fn to_request(&self) -> Result<CreateRequest, String>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: EntityKey,
    #[serde(alias = "teamName")]
    pub name: String,
    pub product_owner_user_id: Option<i32>,
    pub project_manager_user_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: EntityKey,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: EntityKey,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub team_id: Option<EntityKey>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamRecord {
    pub id: EntityKey,
    pub team_id: EntityKey,
    pub project_id: EntityKey,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: EntityKey,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub points: Option<i32>,
    pub project_id: EntityKey,
    pub author_user_id: EntityKey,
    pub assigned_user_id: Option<EntityKey>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: EntityKey,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_name: Option<String>,
    pub task_id: EntityKey,
    pub uploaded_by_id: EntityKey,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: EntityKey,
    pub text: String,
    pub task_id: EntityKey,
    pub user_id: EntityKey,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignmentRecord {
    pub id: EntityKey,
    pub user_id: EntityKey,
    pub task_id: EntityKey,
}

/// Drops empty strings, which the seed files use interchangeably with null.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Parses an RFC 3339 timestamp, a zone-less `YYYY-MM-DDTHH:MM:SS` (taken
/// as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, String> {
    if let Ok(timestamp) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(timestamp);
    }
    if let Ok(timestamp) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(timestamp.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| format!("invalid date {raw:?}"))
}

fn optional_timestamp(
    column: &'static str,
    value: &Option<String>,
) -> Result<Option<OffsetDateTime>, String> {
    non_empty(value)
        .map(|raw| parse_timestamp(raw).map_err(|e| format!("{column}: {e}")))
        .transpose()
}

impl SeedRecord for TeamRecord {
    const KIND: EntityKind = EntityKind::Team;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .field("name", self.name.as_str())
            .optional_field("product_owner_user_id", self.product_owner_user_id)
            .optional_field("project_manager_user_id", self.project_manager_user_id))
    }
}

impl SeedRecord for ProjectRecord {
    const KIND: EntityKind = EntityKind::Project;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .field("name", self.name.as_str())
            .optional_field("description", self.description.as_deref())
            .optional_field("start_date", optional_timestamp("startDate", &self.start_date)?)
            .optional_field("end_date", optional_timestamp("endDate", &self.end_date)?))
    }
}

impl SeedRecord for UserRecord {
    const KIND: EntityKind = EntityKind::User;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.user_id)
            .field("username", self.username.as_str())
            .optional_field("profile_picture_url", non_empty(&self.profile_picture_url))
            .relate(USER_TEAM, Link::from(self.team_id)))
    }
}

impl SeedRecord for ProjectTeamRecord {
    const KIND: EntityKind = EntityKind::ProjectTeam;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .relate(PROJECT_TEAM_TEAM, Link::ConnectTo(self.team_id))
            .relate(PROJECT_TEAM_PROJECT, Link::ConnectTo(self.project_id)))
    }
}

impl SeedRecord for TaskRecord {
    const KIND: EntityKind = EntityKind::Task;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .field("title", self.title.as_str())
            .optional_field("description", self.description.as_deref())
            .field("status", self.status.as_str())
            .optional_field("priority", self.priority.as_deref())
            .optional_field("tags", self.tags.as_deref())
            .optional_field("start_date", optional_timestamp("startDate", &self.start_date)?)
            .optional_field("due_date", optional_timestamp("dueDate", &self.due_date)?)
            .optional_field("points", self.points)
            .relate(TASK_PROJECT, Link::ConnectTo(self.project_id))
            .relate(TASK_AUTHOR, Link::ConnectTo(self.author_user_id))
            .relate(TASK_ASSIGNEE, Link::from(self.assigned_user_id)))
    }
}

impl SeedRecord for AttachmentRecord {
    const KIND: EntityKind = EntityKind::Attachment;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .field("file_url", self.file_url.as_str())
            .optional_field("file_name", self.file_name.as_deref())
            .relate(ATTACHMENT_TASK, Link::ConnectTo(self.task_id))
            .relate(ATTACHMENT_UPLOADED_BY, Link::ConnectTo(self.uploaded_by_id)))
    }
}

impl SeedRecord for CommentRecord {
    const KIND: EntityKind = EntityKind::Comment;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .field("text", self.text.as_str())
            .relate(COMMENT_TASK, Link::ConnectTo(self.task_id))
            .relate(COMMENT_USER, Link::ConnectTo(self.user_id)))
    }
}

impl SeedRecord for TaskAssignmentRecord {
    const KIND: EntityKind = EntityKind::TaskAssignment;

    fn to_request(&self) -> Result<CreateRequest, String> {
        Ok(CreateRequest::new(Self::KIND, self.id)
            .relate(TASK_ASSIGNMENT_USER, Link::ConnectTo(self.user_id))
            .relate(TASK_ASSIGNMENT_TASK, Link::ConnectTo(self.task_id)))
    }
}

/// All records of one kind, as read from the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    Teams(Vec<TeamRecord>),
    Projects(Vec<ProjectRecord>),
    Users(Vec<UserRecord>),
    ProjectTeams(Vec<ProjectTeamRecord>),
    Tasks(Vec<TaskRecord>),
    Attachments(Vec<AttachmentRecord>),
    Comments(Vec<CommentRecord>),
    TaskAssignments(Vec<TaskAssignmentRecord>),
}

/// Parses a JSON array, reporting the index of the first record that does not fit `R`.
fn parse_records<R: DeserializeOwned>(data: &[u8]) -> Result<Vec<R>, RecordError> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(data).map_err(|e| RecordError {
        index: None,
        reason: e.to_string(),
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value).map_err(|e| RecordError::at(i, e.to_string()))
        })
        .collect()
}

fn to_requests<R: SeedRecord>(records: &[R]) -> Result<Vec<CreateRequest>, RecordError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| record.to_request().map_err(|reason| RecordError::at(i, reason)))
        .collect()
}

impl RecordSet {
    /// Parses the raw JSON of one record set.
    pub fn parse(kind: EntityKind, data: &[u8]) -> Result<Self, RecordError> {
        Ok(match kind {
            EntityKind::Team => RecordSet::Teams(parse_records(data)?),
            EntityKind::Project => RecordSet::Projects(parse_records(data)?),
            EntityKind::User => RecordSet::Users(parse_records(data)?),
            EntityKind::ProjectTeam => RecordSet::ProjectTeams(parse_records(data)?),
            EntityKind::Task => RecordSet::Tasks(parse_records(data)?),
            EntityKind::Attachment => RecordSet::Attachments(parse_records(data)?),
            EntityKind::Comment => RecordSet::Comments(parse_records(data)?),
            EntityKind::TaskAssignment => RecordSet::TaskAssignments(parse_records(data)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            RecordSet::Teams(_) => EntityKind::Team,
            RecordSet::Projects(_) => EntityKind::Project,
            RecordSet::Users(_) => EntityKind::User,
            RecordSet::ProjectTeams(_) => EntityKind::ProjectTeam,
            RecordSet::Tasks(_) => EntityKind::Task,
            RecordSet::Attachments(_) => EntityKind::Attachment,
            RecordSet::Comments(_) => EntityKind::Comment,
            RecordSet::TaskAssignments(_) => EntityKind::TaskAssignment,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Teams(r) => r.len(),
            RecordSet::Projects(r) => r.len(),
            RecordSet::Users(r) => r.len(),
            RecordSet::ProjectTeams(r) => r.len(),
            RecordSet::Tasks(r) => r.len(),
            RecordSet::Attachments(r) => r.len(),
            RecordSet::Comments(r) => r.len(),
            RecordSet::TaskAssignments(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transforms every record into an insert request.
    pub fn to_batch(&self) -> Result<Batch, RecordError> {
        let requests = match self {
            RecordSet::Teams(r) => to_requests(r)?,
            RecordSet::Projects(r) => to_requests(r)?,
            RecordSet::Users(r) => to_requests(r)?,
            RecordSet::ProjectTeams(r) => to_requests(r)?,
            RecordSet::Tasks(r) => to_requests(r)?,
            RecordSet::Attachments(r) => to_requests(r)?,
            RecordSet::Comments(r) => to_requests(r)?,
            RecordSet::TaskAssignments(r) => to_requests(r)?,
        };

        Ok(Batch {
            kind: self.kind(),
            requests,
        })
    }
}

/// Insert requests for one entity kind. Requests within a batch are independent.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub kind: EntityKind,
    pub requests: Vec<CreateRequest>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::FieldValue;
    use serde_json::json;
    use time::macros::datetime;

    fn parse<R: DeserializeOwned>(value: serde_json::Value) -> R {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_user_without_team_has_no_relation() {
        let user: UserRecord = parse(json!({ "userId": 2, "username": "bob" }));
        let request = user.to_request().unwrap();

        assert_eq!(request.key(), 2);
        assert!(request.connections().is_empty());
        assert_eq!(request.value("profile_picture_url"), None);
    }

    #[test]
    fn test_user_with_null_team_has_no_relation() {
        let user: UserRecord = parse(json!({
            "userId": 3,
            "username": "carol",
            "profilePictureUrl": "",
            "teamId": null
        }));
        let request = user.to_request().unwrap();

        assert_eq!(request.connection("team"), None);
        assert_eq!(request.value("profile_picture_url"), None);
    }

    #[test]
    fn test_user_with_team_connects() {
        let user: UserRecord = parse(json!({
            "userId": 1,
            "username": "alice",
            "profilePictureUrl": "p1.jpeg",
            "teamId": 4
        }));
        let request = user.to_request().unwrap();

        assert_eq!(request.connection("team"), Some(4));
        assert_eq!(
            request.value("profile_picture_url"),
            Some(&FieldValue::Text("p1.jpeg".to_string()))
        );
    }

    #[test]
    fn test_task_transform() {
        let task: TaskRecord = parse(json!({
            "id": 10,
            "title": "Launch page",
            "status": "Work In Progress",
            "priority": "High",
            "tags": "Deployment,Frontend",
            "startDate": "2023-01-10T09:00:00Z",
            "points": 5,
            "projectId": 1,
            "authorUserId": 2
        }));
        let request = task.to_request().unwrap();

        assert_eq!(
            request.value("start_date"),
            Some(&FieldValue::Timestamp(datetime!(2023-01-10 9:00 UTC)))
        );
        assert_eq!(request.value("due_date"), None);
        assert_eq!(request.value("description"), None);
        assert_eq!(request.value("points"), Some(&FieldValue::Int(5)));
        assert_eq!(
            request.value("tags"),
            Some(&FieldValue::Text("Deployment,Frontend".to_string()))
        );
        assert_eq!(request.connection("project"), Some(1));
        assert_eq!(request.connection("author"), Some(2));
        assert_eq!(request.connection("assignee"), None);
    }

    #[test]
    fn test_team_name_alias() {
        let team: TeamRecord = parse(json!({ "id": 1, "teamName": "Quantum Innovations" }));
        assert_eq!(team.name, "Quantum Innovations");
    }

    #[test]
    fn test_attachment_file_url_field() {
        let attachment: AttachmentRecord = parse(json!({
            "id": 1,
            "fileURL": "i1.jpg",
            "fileName": "i1.jpg",
            "taskId": 1,
            "uploadedById": 1
        }));
        let request = attachment.to_request().unwrap();

        assert_eq!(
            request.value("file_url"),
            Some(&FieldValue::Text("i1.jpg".to_string()))
        );
        assert_eq!(request.connection("uploaded_by"), Some(1));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(
            parse_timestamp("2023-03-01T12:30:00+02:00").unwrap(),
            datetime!(2023-03-01 12:30 +2)
        );
        assert_eq!(
            parse_timestamp("2023-03-01T12:30:00").unwrap(),
            datetime!(2023-03-01 12:30 UTC)
        );
        assert_eq!(
            parse_timestamp("2023-03-01").unwrap(),
            datetime!(2023-03-01 0:00 UTC)
        );
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn test_bad_date_is_reported_with_index() {
        let data = br#"[
            { "id": 1, "name": "Apollo" },
            { "id": 2, "name": "Hermes", "startDate": "someday" }
        ]"#;
        let set = RecordSet::parse(EntityKind::Project, data).unwrap();
        let err = set.to_batch().unwrap_err();

        assert_eq!(err.index, Some(1));
        assert!(err.reason.contains("startDate"));
    }

    #[test]
    fn test_missing_required_field_is_reported_with_index() {
        let data = br#"[
            { "id": 1, "text": "Looks good", "taskId": 1, "userId": 1 },
            { "id": 2, "taskId": 1, "userId": 1 }
        ]"#;
        let err = RecordSet::parse(EntityKind::Comment, data).unwrap_err();

        assert_eq!(err.index, Some(1));
        assert!(err.reason.contains("text"));
    }

    #[test]
    fn test_not_an_array() {
        let err = RecordSet::parse(EntityKind::Team, br#"{ "id": 1 }"#).unwrap_err();
        assert_eq!(err.index, None);
    }

    #[test]
    fn test_batch_preserves_kind_and_order() {
        let data = br#"[
            { "id": 1, "userId": 1, "taskId": 2 },
            { "id": 2, "userId": 2, "taskId": 2 }
        ]"#;
        let batch = RecordSet::parse(EntityKind::TaskAssignment, data)
            .unwrap()
            .to_batch()
            .unwrap();

        assert_eq!(batch.kind, EntityKind::TaskAssignment);
        let keys: Vec<_> = batch.requests.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![1, 2]);
    }
}
