//! `trellis.v1.SessionService` messages and wire conversions.

use trellis_core::error::CoreResult;
use trellis_core::service::Page;
use trellis_db::models::session as model;

use super::{timestamp_to_wire, WireDecoder, WireEntity};

#[derive(Clone, PartialEq, prost::Message)]
pub struct Session {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(message, optional, tag = "3")]
    pub notes: Option<String>,
    #[prost(int32, tag = "4")]
    pub duration_minutes: i32,
    #[prost(bool, tag = "5")]
    pub completed: bool,
    #[prost(string, tag = "6")]
    pub started_at: String,
    #[prost(message, optional, tag = "7")]
    pub deleted_at: Option<String>,
    #[prost(string, tag = "8")]
    pub created_at: String,
    #[prost(string, tag = "9")]
    pub updated_at: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateSessionRequest {
    #[prost(message, optional, tag = "1")]
    pub title: Option<String>,
    #[prost(message, optional, tag = "2")]
    pub notes: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub duration_minutes: Option<i32>,
    #[prost(message, optional, tag = "4")]
    pub completed: Option<bool>,
    #[prost(message, optional, tag = "5")]
    pub started_at: Option<String>,
    #[prost(message, optional, tag = "6")]
    pub deleted_at: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateSessionRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub title: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub notes: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub duration_minutes: Option<i32>,
    #[prost(message, optional, tag = "5")]
    pub completed: Option<bool>,
    #[prost(message, optional, tag = "6")]
    pub started_at: Option<String>,
    #[prost(message, optional, tag = "7")]
    pub deleted_at: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListSessionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<Session>,
    #[prost(int64, tag = "2")]
    pub count: i64,
}

include!(concat!(env!("OUT_DIR"), "/trellis.v1.SessionService.rs"));

pub use session_service_client::SessionServiceClient;
pub use session_service_server::{SessionService, SessionServiceServer};

impl WireEntity for model::Session {
    type Message = Session;
    type CreateRequest = CreateSessionRequest;
    type UpdateRequest = UpdateSessionRequest;
    type ListResponse = ListSessionsResponse;

    fn to_message(&self) -> Session {
        Session {
            id: self.id.to_string(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            duration_minutes: self.duration_minutes,
            completed: self.completed,
            started_at: timestamp_to_wire(self.started_at),
            deleted_at: self.deleted_at.map(timestamp_to_wire),
            created_at: timestamp_to_wire(self.created_at),
            updated_at: timestamp_to_wire(self.updated_at),
        }
    }

    fn decode_create(request: CreateSessionRequest) -> CoreResult<model::CreateSession> {
        let mut decoder = WireDecoder::default();
        let started_at = decoder.timestamp("started_at", request.started_at);
        let deleted_at = decoder.timestamp("deleted_at", request.deleted_at);
        decoder.finish(model::CreateSession {
            title: request.title.unwrap_or_default(),
            notes: request.notes,
            duration_minutes: request.duration_minutes.unwrap_or_default(),
            completed: request.completed,
            started_at,
            deleted_at,
        })
    }

    fn decode_update(request: UpdateSessionRequest) -> CoreResult<model::UpdateSession> {
        let mut decoder = WireDecoder::default();
        let started_at = decoder.timestamp("started_at", request.started_at);
        let deleted_at = decoder.timestamp("deleted_at", request.deleted_at);
        decoder.finish(model::UpdateSession {
            id: request.id,
            title: request.title,
            notes: request.notes,
            duration_minutes: request.duration_minutes,
            completed: request.completed,
            started_at,
            deleted_at,
        })
    }

    fn list_response(page: Page<model::Session>) -> ListSessionsResponse {
        ListSessionsResponse {
            items: page.items.iter().map(model::Session::to_message).collect(),
            count: page.total,
        }
    }
}

crud_service!(SessionService, model::Session);
