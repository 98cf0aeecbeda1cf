// tagwarden-core/src/ports/policy.rs

// Write side of the governance state. Every method carries create-or-replace
// / attach-if-absent semantics so the planner's output can be replayed.

use crate::domain::policy::operation::{
    AttachMaskingPolicy, AttachRowAccessPolicy, UpsertMaskingPolicy, UpsertRowAccessPolicy,
};
use crate::error::TagwardenError;
use async_trait::async_trait;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn upsert_masking_policy(
        &self,
        op: &UpsertMaskingPolicy,
    ) -> Result<(), TagwardenError>;

    async fn attach_masking_policy(
        &self,
        op: &AttachMaskingPolicy,
    ) -> Result<(), TagwardenError>;

    async fn upsert_row_access_policy(
        &self,
        op: &UpsertRowAccessPolicy,
    ) -> Result<(), TagwardenError>;

    async fn attach_row_access_policy(
        &self,
        op: &AttachRowAccessPolicy,
    ) -> Result<(), TagwardenError>;
}
