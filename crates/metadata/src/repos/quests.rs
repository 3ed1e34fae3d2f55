//! Quest catalog repository.

use crate::error::MetadataResult;
use crate::models::QuestRow;
use async_trait::async_trait;
use uuid::Uuid;
use wayquest_core::Region;

/// Repository for quest catalog operations.
#[async_trait]
pub trait QuestRepo: Send + Sync {
    /// Insert a quest definition.
    async fn create_quest(&self, quest: &QuestRow) -> MetadataResult<()>;

    /// Get a quest by id.
    async fn get_quest(&self, quest_id: Uuid) -> MetadataResult<Option<QuestRow>>;

    /// List quests matching the region filter.
    ///
    /// Matching is exact string equality at every supplied level; omitted
    /// levels are unconstrained.
    async fn list_quests_in_region(&self, region: &Region) -> MetadataResult<Vec<QuestRow>>;

    /// Distinct regions that currently have at least one quest.
    ///
    /// Used as a diagnostic aid when a region filter matches nothing.
    async fn list_regions_with_quests(&self) -> MetadataResult<Vec<Region>>;
}
