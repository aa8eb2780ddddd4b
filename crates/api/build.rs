//! Generates the gRPC service traits, servers and clients. Messages are
//! prost-derived Rust types in `src/grpc`, so no `.proto` compilation runs.

use tonic_build::manual::{Builder, Method, Service};

const PACKAGE: &str = "trellis.v1";

fn method(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

/// The five unary CRUD RPCs for one entity module under `crate::grpc`.
fn crud_service(service: &str, module: &str, message: &str, list_response: &str) -> Service {
    let ty = |name: &str| format!("crate::grpc::{module}::{name}");
    Service::builder()
        .name(service)
        .package(PACKAGE)
        .method(method(
            "create",
            "Create",
            &ty(&format!("Create{message}Request")),
            &ty(message),
        ))
        .method(method("get", "Get", "crate::grpc::IdRequest", &ty(message)))
        .method(method(
            "list",
            "List",
            "crate::grpc::FilterRequest",
            &ty(list_response),
        ))
        .method(method(
            "update",
            "Update",
            &ty(&format!("Update{message}Request")),
            &ty(message),
        ))
        .method(method(
            "delete",
            "Delete",
            "crate::grpc::IdRequest",
            "crate::grpc::Empty",
        ))
        .build()
}

fn main() {
    let services = [
        crud_service("PlanService", "plan", "Plan", "ListPlansResponse"),
        crud_service("SessionService", "session", "Session", "ListSessionsResponse"),
    ];
    Builder::new().compile(&services);
}
