//! gRPC transport for the CRUD pipeline.
//!
//! Messages are prost-derived Rust types (standard protobuf wire format, no
//! `.proto` file); `build.rs` generates the `PlanService` and
//! `SessionService` traits, servers and clients in package `trellis.v1`.
//!
//! Every entity is served by the same generic [`CrudHandler`]: it decodes
//! the request and its metadata, calls the entity's [`Interceptor`] and
//! encodes the result. [`WireEntity`] supplies the per-entity message
//! conversions.
//!
//! Optional fields use protobuf wrapper types (`google.protobuf.StringValue`
//! and friends, `Option<T>` here) so an omitted field is distinguishable from
//! its zero value. Timestamps travel as RFC 3339 strings.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use trellis_core::access::RequestContext;
use trellis_core::entity::Entity;
use trellis_core::error::{CoreError, CoreResult};
use trellis_core::filter::Filter;
use trellis_core::interceptor::Interceptor;
use trellis_core::service::Page;
use trellis_core::types::Timestamp;
use trellis_core::validation::{
    check, parse_id, FieldViolation, ValidationError, MSG_INVALID_TIMESTAMP, MSG_INVALID_UUID,
};
use validator::Validate;

use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Shared messages
// ---------------------------------------------------------------------------

/// List parameters shared by every `List` RPC.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterRequest {
    #[prost(message, optional, tag = "1")]
    pub page_size: Option<u32>,
    #[prost(message, optional, tag = "2")]
    pub page_number: Option<u32>,
    #[prost(message, optional, tag = "3")]
    pub search: Option<String>,
    #[prost(string, repeated, tag = "4")]
    pub order_by: Vec<String>,
    #[prost(string, repeated, tag = "5")]
    pub ids: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IdRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Empty {}

impl FilterRequest {
    /// Decode into a [`Filter`], reporting every malformed id at once.
    pub fn into_filter(self) -> CoreResult<Filter> {
        let mut errors = ValidationError::default();
        let mut ids = Vec::with_capacity(self.ids.len());
        for raw in &self.ids {
            match parse_id("ids", raw) {
                Ok(id) => ids.push(id),
                Err(_) => errors.push(FieldViolation::new(
                    "ids",
                    "uuid",
                    format!("{MSG_INVALID_UUID}: {raw:?}"),
                )),
            }
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }

        Ok(Filter {
            page_size: self.page_size,
            page_number: self.page_number,
            search: self.search,
            order_by: self.order_by,
            ids,
        })
    }
}

// ---------------------------------------------------------------------------
// Metadata and field decoding
// ---------------------------------------------------------------------------

/// Build the per-request context from gRPC metadata.
///
/// `authorization: Bearer <token>` yields the bearer token; `x-request-id`
/// is carried through for log correlation.
pub fn request_context(metadata: &MetadataMap) -> RequestContext {
    let bearer_token = metadata
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string());
    let request_id = metadata
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    RequestContext {
        bearer_token,
        request_id,
    }
}

pub fn timestamp_to_wire(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Collects wire-level decoding failures so they are reported together with
/// the decoded DTO's own rule violations.
#[derive(Debug, Default)]
pub struct WireDecoder {
    errors: ValidationError,
}

impl WireDecoder {
    /// Parse an optional RFC 3339 timestamp. Absent or blank is `None`.
    pub fn timestamp(&mut self, field: &str, raw: Option<String>) -> Option<Timestamp> {
        let raw = raw?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(_) => {
                self.errors
                    .push(FieldViolation::new(field, "timestamp", MSG_INVALID_TIMESTAMP));
                None
            }
        }
    }

    /// Return `dto` unless decoding failed, in which case the decoding
    /// violations are merged with the DTO's own (minus fields already
    /// reported).
    pub fn finish<T: Validate>(self, dto: T) -> CoreResult<T> {
        if self.errors.is_empty() {
            return Ok(dto);
        }
        let mut errors = self.errors;
        if let Err(CoreError::Validation(more)) = check(&dto) {
            let reported: Vec<String> = errors.fields().into_iter().map(String::from).collect();
            for violation in more.violations {
                if !reported.contains(&violation.field) {
                    errors.push(violation);
                }
            }
        }
        Err(CoreError::Validation(errors))
    }
}

// ---------------------------------------------------------------------------
// Generic handler
// ---------------------------------------------------------------------------

/// Conversions between an entity's domain types and its wire messages.
pub trait WireEntity: Entity {
    type Message: Send + 'static;
    type CreateRequest: Send + 'static;
    type UpdateRequest: Send + 'static;
    type ListResponse: Send + 'static;

    fn to_message(&self) -> Self::Message;
    fn decode_create(request: Self::CreateRequest) -> CoreResult<Self::Create>;
    fn decode_update(request: Self::UpdateRequest) -> CoreResult<Self::Update>;
    fn list_response(page: Page<Self>) -> Self::ListResponse;
}

/// Serves the five CRUD RPCs of one entity over its interceptor.
pub struct CrudHandler<E: Entity> {
    interceptor: Arc<dyn Interceptor<E>>,
}

impl<E: WireEntity> CrudHandler<E> {
    pub fn new(interceptor: Arc<dyn Interceptor<E>>) -> Self {
        Self { interceptor }
    }

    pub async fn handle_create(&self, request: Request<E::CreateRequest>) -> AppResult<E::Message> {
        let ctx = request_context(request.metadata());
        let input = E::decode_create(request.into_inner())?;
        let record = self.interceptor.create(&ctx, input).await?;
        Ok(record.to_message())
    }

    pub async fn handle_get(&self, request: Request<IdRequest>) -> AppResult<E::Message> {
        let ctx = request_context(request.metadata());
        let id = parse_id("id", &request.into_inner().id)?;
        let record = self.interceptor.get(&ctx, id).await?;
        Ok(record.to_message())
    }

    pub async fn handle_list(&self, request: Request<FilterRequest>) -> AppResult<E::ListResponse> {
        let ctx = request_context(request.metadata());
        let filter = request.into_inner().into_filter()?;
        let page = self.interceptor.list(&ctx, filter).await?;
        Ok(E::list_response(page))
    }

    pub async fn handle_update(&self, request: Request<E::UpdateRequest>) -> AppResult<E::Message> {
        let ctx = request_context(request.metadata());
        let input = E::decode_update(request.into_inner())?;
        let record = self.interceptor.update(&ctx, input).await?;
        Ok(record.to_message())
    }

    pub async fn handle_delete(&self, request: Request<IdRequest>) -> AppResult<Empty> {
        let ctx = request_context(request.metadata());
        let id = parse_id("id", &request.into_inner().id)?;
        self.interceptor.delete(&ctx, id).await?;
        Ok(Empty {})
    }
}

/// Wrap a handler result into a tonic response.
pub fn respond<T>(result: AppResult<T>) -> Result<Response<T>, Status> {
    result.map(Response::new).map_err(Status::from)
}

/// Implement a generated CRUD service trait for `CrudHandler<$entity>`.
macro_rules! crud_service {
    ($service:path, $entity:ty) => {
        #[tonic::async_trait]
        impl $service for $crate::grpc::CrudHandler<$entity> {
            async fn create(
                &self,
                request: tonic::Request<<$entity as $crate::grpc::WireEntity>::CreateRequest>,
            ) -> Result<
                tonic::Response<<$entity as $crate::grpc::WireEntity>::Message>,
                tonic::Status,
            > {
                $crate::grpc::respond(self.handle_create(request).await)
            }

            async fn get(
                &self,
                request: tonic::Request<$crate::grpc::IdRequest>,
            ) -> Result<
                tonic::Response<<$entity as $crate::grpc::WireEntity>::Message>,
                tonic::Status,
            > {
                $crate::grpc::respond(self.handle_get(request).await)
            }

            async fn list(
                &self,
                request: tonic::Request<$crate::grpc::FilterRequest>,
            ) -> Result<
                tonic::Response<<$entity as $crate::grpc::WireEntity>::ListResponse>,
                tonic::Status,
            > {
                $crate::grpc::respond(self.handle_list(request).await)
            }

            async fn update(
                &self,
                request: tonic::Request<<$entity as $crate::grpc::WireEntity>::UpdateRequest>,
            ) -> Result<
                tonic::Response<<$entity as $crate::grpc::WireEntity>::Message>,
                tonic::Status,
            > {
                $crate::grpc::respond(self.handle_update(request).await)
            }

            async fn delete(
                &self,
                request: tonic::Request<$crate::grpc::IdRequest>,
            ) -> Result<tonic::Response<$crate::grpc::Empty>, tonic::Status> {
                $crate::grpc::respond(self.handle_delete(request).await)
            }
        }
    };
}

pub mod plan;
pub mod session;
