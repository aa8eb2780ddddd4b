//! Authorization layer wrapped around a [`Service`].
//!
//! Every operation runs the same gate sequence:
//!
//! 1. resolve the acting identity (`Unauthenticated` otherwise),
//! 2. coarse check of `<entity>:<action>` with no object,
//! 3. object-level check. Create and List check the caller's payload; Get,
//!    Update and Delete first read the stored record through the service and
//!    check that, so the decision never rests on caller-supplied data.
//!
//! Nothing below the interceptor is mutated or disclosed before both checks
//! pass.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::access::{Action, Identity, IdentityResolver, Permission, PermissionChecker, RequestContext};
use crate::entity::{Entity, UpdateTarget};
use crate::error::{CoreError, CoreResult};
use crate::filter::Filter;
use crate::service::{Page, Service};
use crate::types::EntityId;
use crate::validation::{check, parse_id};

/// The operation surface the transport layer calls.
#[async_trait]
pub trait Interceptor<E: Entity>: Send + Sync {
    async fn create(&self, ctx: &RequestContext, input: E::Create) -> CoreResult<E>;
    async fn get(&self, ctx: &RequestContext, id: EntityId) -> CoreResult<E>;
    async fn list(&self, ctx: &RequestContext, filter: Filter) -> CoreResult<Page<E>>;
    async fn update(&self, ctx: &RequestContext, input: E::Update) -> CoreResult<E>;
    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> CoreResult<()>;
}

pub struct AuthorizingInterceptor<E, S> {
    service: Arc<S>,
    identities: Arc<dyn IdentityResolver>,
    permissions: Arc<dyn PermissionChecker>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> AuthorizingInterceptor<E, S>
where
    E: Entity,
    S: Service<E>,
{
    pub fn new(
        service: Arc<S>,
        identities: Arc<dyn IdentityResolver>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            service,
            identities,
            permissions,
            _entity: PhantomData,
        }
    }

    /// Identity resolution plus the coarse, object-less check.
    async fn admit(&self, ctx: &RequestContext, action: Action) -> CoreResult<Identity> {
        let identity = self.identities.acting_identity(ctx).await?;
        let permission = Permission::new(E::NAME, action);
        if let Err(err) = self.permissions.check(&identity, permission, None).await {
            tracing::warn!(subject = %identity.subject, %permission, "Permission denied");
            return Err(err);
        }
        Ok(identity)
    }

    /// Object-level check against the JSON form of `object`.
    async fn check_object<T: Serialize + Sync>(
        &self,
        identity: &Identity,
        action: Action,
        object: &T,
    ) -> CoreResult<()> {
        let value = serde_json::to_value(object).map_err(CoreError::unexpected)?;
        let permission = Permission::new(E::NAME, action);
        if let Err(err) = self.permissions.check(identity, permission, Some(&value)).await {
            tracing::warn!(subject = %identity.subject, %permission, "Object permission denied");
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl<E, S> Interceptor<E> for AuthorizingInterceptor<E, S>
where
    E: Entity,
    S: Service<E> + 'static,
{
    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn create(&self, ctx: &RequestContext, input: E::Create) -> CoreResult<E> {
        let identity = self.admit(ctx, Action::Create).await?;
        self.check_object(&identity, Action::Create, &input).await?;
        self.service.create(input).await
    }

    #[instrument(skip_all, fields(entity = E::NAME, id = %id))]
    async fn get(&self, ctx: &RequestContext, id: EntityId) -> CoreResult<E> {
        let identity = self.admit(ctx, Action::Get).await?;
        let record = self.service.get(id).await?;
        self.check_object(&identity, Action::Get, &record).await?;
        Ok(record)
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn list(&self, ctx: &RequestContext, filter: Filter) -> CoreResult<Page<E>> {
        let identity = self.admit(ctx, Action::List).await?;
        self.check_object(&identity, Action::List, &filter).await?;
        self.service.list(&filter).await
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn update(&self, ctx: &RequestContext, input: E::Update) -> CoreResult<E> {
        let identity = self.admit(ctx, Action::Update).await?;
        // Report every violation before the id is needed for the lookup.
        check(&input)?;
        let id = parse_id("id", input.target_id())?;
        let current = self.service.get(id).await?;
        self.check_object(&identity, Action::Update, &current).await?;
        self.service.update(input).await
    }

    #[instrument(skip_all, fields(entity = E::NAME, id = %id))]
    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> CoreResult<()> {
        let identity = self.admit(ctx, Action::Delete).await?;
        let current = self.service.get(id).await?;
        self.check_object(&identity, Action::Delete, &current).await?;
        self.service.delete(id).await
    }
}
