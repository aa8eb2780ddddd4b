#![allow(dead_code)]

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Channel;
use tonic::Request;

use trellis_api::auth::grants::StaticPermissionChecker;
use trellis_api::auth::jwt::{generate_access_token, JwtConfig, JwtIdentityResolver};
use trellis_api::config::ServerConfig;
use trellis_api::grpc::plan::PlanServiceClient;
use trellis_api::grpc::session::SessionServiceClient;
use trellis_api::pipeline::{Collaborators, Pipeline};
use trellis_core::clock::{SystemClock, UuidV7Generator};
use trellis_core::memory::MemoryRepository;
use trellis_db::models::plan::Plan;
use trellis_db::models::session::Session;

pub const GRANTS: &str = "admin=*;coach=plan:*,session:get,session:list";

/// Build a test `JwtConfig` with a known secret.
pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://localhost/trellis_test".into()),
        "JWT_SECRET" => Some(jwt_config().secret),
        "PERMISSION_GRANTS" => Some(GRANTS.into()),
        _ => None,
    })
    .unwrap()
}

pub fn token(role: &str) -> String {
    generate_access_token("tester", role, &jwt_config()).unwrap()
}

pub fn collaborators() -> Collaborators {
    Collaborators {
        identities: Arc::new(JwtIdentityResolver::new(jwt_config())),
        permissions: Arc::new(StaticPermissionChecker::parse(GRANTS).unwrap()),
        clock: Arc::new(SystemClock),
        ids: Arc::new(UuidV7Generator),
    }
}

/// A pipeline over empty in-memory repositories.
pub fn memory_pipeline() -> Pipeline {
    Pipeline::new(
        Arc::new(MemoryRepository::<Plan>::new()),
        Arc::new(MemoryRepository::<Session>::new()),
        &collaborators(),
    )
}

pub struct Clients {
    pub plans: PlanServiceClient<Channel>,
    pub sessions: SessionServiceClient<Channel>,
}

/// Bind to port 0, spawn the gRPC server, and return connected clients.
pub async fn start_server(pipeline: Pipeline) -> Clients {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let plans = pipeline.plan_server();
    let sessions = pipeline.session_server();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(plans)
            .add_service(sessions)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    let channel = Channel::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();
    Clients {
        plans: PlanServiceClient::new(channel.clone()),
        sessions: SessionServiceClient::new(channel),
    }
}

/// Attach a bearer token to a request.
pub fn authed<T>(message: T, token: &str) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert("authorization", format!("Bearer {token}").parse().unwrap());
    request
}
