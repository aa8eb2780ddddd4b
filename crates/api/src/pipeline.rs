//! Assembly of the Handler -> Interceptor -> Service -> Repository chain for
//! every entity.

use std::sync::Arc;
use std::time::Duration;

use trellis_core::access::{IdentityResolver, PermissionChecker};
use trellis_core::clock::{Clock, IdGenerator, SystemClock, UuidV7Generator};
use trellis_core::entity::Entity;
use trellis_core::interceptor::{AuthorizingInterceptor, Interceptor};
use trellis_core::repository::Repository;
use trellis_core::service::CrudService;
use trellis_db::models::plan::Plan;
use trellis_db::models::session::Session;
use trellis_db::repositories::PgRepository;
use trellis_db::DbPool;

use crate::auth::grants::StaticPermissionChecker;
use crate::auth::jwt::JwtIdentityResolver;
use crate::config::{ConfigError, ServerConfig};
use crate::grpc::plan::PlanServiceServer;
use crate::grpc::session::SessionServiceServer;
use crate::grpc::CrudHandler;

/// The collaborators every entity pipeline shares.
#[derive(Clone)]
pub struct Collaborators {
    pub identities: Arc<dyn IdentityResolver>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Collaborators {
    /// JWT identities, configured grants, wall clock and UUIDv7 ids.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            identities: Arc::new(JwtIdentityResolver::new(config.jwt.clone())),
            permissions: Arc::new(StaticPermissionChecker::parse(&config.permission_grants)?),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidV7Generator),
        })
    }
}

/// Wrap `repo` in a service and an authorizing interceptor.
pub fn interceptor<E, R>(repo: Arc<R>, collaborators: &Collaborators) -> Arc<dyn Interceptor<E>>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    let service = CrudService::new(
        repo,
        Arc::clone(&collaborators.clock),
        Arc::clone(&collaborators.ids),
    );
    Arc::new(AuthorizingInterceptor::new(
        Arc::new(service),
        Arc::clone(&collaborators.identities),
        Arc::clone(&collaborators.permissions),
    ))
}

/// One interceptor per served entity.
#[derive(Clone)]
pub struct Pipeline {
    pub plans: Arc<dyn Interceptor<Plan>>,
    pub sessions: Arc<dyn Interceptor<Session>>,
}

impl Pipeline {
    pub fn new<P, S>(plans: Arc<P>, sessions: Arc<S>, collaborators: &Collaborators) -> Self
    where
        P: Repository<Plan> + 'static,
        S: Repository<Session> + 'static,
    {
        Self {
            plans: interceptor(plans, collaborators),
            sessions: interceptor(sessions, collaborators),
        }
    }

    /// Pipelines backed by PostgreSQL, each storage call bounded by `timeout`.
    pub fn postgres(pool: DbPool, timeout: Duration, collaborators: &Collaborators) -> Self {
        Self::new(
            Arc::new(PgRepository::<Plan>::with_timeout(pool.clone(), timeout)),
            Arc::new(PgRepository::<Session>::with_timeout(pool, timeout)),
            collaborators,
        )
    }

    pub fn plan_server(&self) -> PlanServiceServer<CrudHandler<Plan>> {
        PlanServiceServer::new(CrudHandler::new(Arc::clone(&self.plans)))
    }

    pub fn session_server(&self) -> SessionServiceServer<CrudHandler<Session>> {
        SessionServiceServer::new(CrudHandler::new(Arc::clone(&self.sessions)))
    }
}
