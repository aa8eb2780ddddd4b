//! `trellis.v1.PlanService` messages and wire conversions.

use trellis_core::error::CoreResult;
use trellis_core::service::Page;
use trellis_db::models::plan as model;

use super::{timestamp_to_wire, WireEntity};

#[derive(Clone, PartialEq, prost::Message)]
pub struct Plan {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(int32, tag = "3")]
    pub repeat: i32,
    #[prost(string, tag = "4")]
    pub equipment_id: String,
    #[prost(string, tag = "5")]
    pub created_at: String,
    #[prost(string, tag = "6")]
    pub updated_at: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreatePlanRequest {
    #[prost(message, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, optional, tag = "2")]
    pub repeat: Option<i32>,
    #[prost(message, optional, tag = "3")]
    pub equipment_id: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdatePlanRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub repeat: Option<i32>,
    #[prost(message, optional, tag = "4")]
    pub equipment_id: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPlansResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<Plan>,
    /// Total matching records, ignoring pagination.
    #[prost(int64, tag = "2")]
    pub count: i64,
}

include!(concat!(env!("OUT_DIR"), "/trellis.v1.PlanService.rs"));

pub use plan_service_client::PlanServiceClient;
pub use plan_service_server::{PlanService, PlanServiceServer};

impl WireEntity for model::Plan {
    type Message = Plan;
    type CreateRequest = CreatePlanRequest;
    type UpdateRequest = UpdatePlanRequest;
    type ListResponse = ListPlansResponse;

    fn to_message(&self) -> Plan {
        Plan {
            id: self.id.to_string(),
            name: self.name.clone(),
            repeat: self.repeat,
            equipment_id: self.equipment_id.clone(),
            created_at: timestamp_to_wire(self.created_at),
            updated_at: timestamp_to_wire(self.updated_at),
        }
    }

    // Absent required fields decode to their zero value and fail validation
    // as blank.
    fn decode_create(request: CreatePlanRequest) -> CoreResult<model::CreatePlan> {
        Ok(model::CreatePlan {
            name: request.name.unwrap_or_default(),
            repeat: request.repeat.unwrap_or_default(),
            equipment_id: request.equipment_id.unwrap_or_default(),
        })
    }

    fn decode_update(request: UpdatePlanRequest) -> CoreResult<model::UpdatePlan> {
        Ok(model::UpdatePlan {
            id: request.id,
            name: request.name,
            repeat: request.repeat,
            equipment_id: request.equipment_id,
        })
    }

    fn list_response(page: Page<model::Plan>) -> ListPlansResponse {
        ListPlansResponse {
            items: page.items.iter().map(model::Plan::to_message).collect(),
            count: page.total,
        }
    }
}

crud_service!(PlanService, model::Plan);
