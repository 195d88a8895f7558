use crate::domain::event::CallbackOutcome;
use crate::domain::ports::{IdentityResolverArc, Reactor, UserStoreArc};
use crate::error::Result;
use async_trait::async_trait;

/// Backfills a paying user's union id on successful payments.
///
/// Missing users, missing open ids and resolver failures are logged and
/// ignored. Only user store errors are returned, and the event bus swallows
/// those as well.
///
/// At most one save happens per event. Concurrent events for the same payer
/// are not serialized here, so each may resolve and save.
pub struct UnionIdReactor {
    users: UserStoreArc,
    resolver: IdentityResolverArc,
}

impl UnionIdReactor {
    pub fn new(users: UserStoreArc, resolver: IdentityResolverArc) -> Self {
        Self { users, resolver }
    }
}

#[async_trait]
impl Reactor for UnionIdReactor {
    fn name(&self) -> &'static str {
        "union_id"
    }

    async fn react(&self, event: &mut CallbackOutcome) -> Result<()> {
        let CallbackOutcome::Success(success) = event else {
            return Ok(());
        };

        let Some(open_id) = success.pay_order.open_id() else {
            tracing::debug!(order = %success.pay_order.order_no, "no payer open id");
            return Ok(());
        };

        let Some(mut user) = self.users.find_by_open_id(open_id).await? else {
            tracing::info!(open_id, "no local user for payer");
            return Ok(());
        };

        if user.has_union_id() {
            return Ok(());
        }

        match self.resolver.resolve_union_id(&success.account, open_id).await {
            Ok(Some(union_id)) if !union_id.is_empty() => {
                tracing::info!(open_id, user = %user.id, "union id recorded");
                user.union_id = Some(union_id);
                self.users.save(user).await?;
            }
            Ok(_) => {
                tracing::info!(open_id, "identity api returned no union id");
            }
            Err(e) => {
                tracing::warn!(open_id, account = %success.account.id, error = %e, "union id lookup failed");
            }
        }
        Ok(())
    }
}
