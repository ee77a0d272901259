use crate::domain::search::{Page, PageRequest, SearchQuery, Specification};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

/// The set of entities which can be the target of a foreign-key reference. Acts as a
/// compile-time registry so reference resolution never has to guess at a type by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    User,
    Task,
}

impl Relation {
    pub fn name(&self) -> &'static str {
        match self {
            Relation::User => "User",
            Relation::Task => "Task",
        }
    }
}

/// One entry in an entity's foreign-key table: the wire-facing name of the referencing
/// field, the entity it points at, and the referenced ID (if set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub field: &'static str,
    pub relation: Relation,
    pub id: Option<i64>,
}

/// Implemented by entities so the generic service can verify their references before a
/// write. Entities without references return an empty list.
pub trait HasForeignKeys {
    fn foreign_keys(&self) -> Vec<ForeignKeyRef>;
}

/// Bidirectional conversion between an entity and its input/output shapes. Mapping into
/// an entity is fallible because some mappers do real work (e.g. password hashing).
pub trait EntityMapper {
    type Entity: HasForeignKeys;
    type Input;
    type Output;

    fn to_entity(&self, input: &Self::Input) -> Result<Self::Entity, anyhow::Error>;
    fn to_output(&self, entity: Self::Entity) -> Self::Output;
}

/// Result of a store-level overwrite, distinguishing a missing row from a row whose
/// version no longer matches the writer's expectation.
#[derive(Debug)]
pub enum UpdateOutcome<Entity> {
    Updated(Entity),
    VersionConflict,
    Missing,
}

pub mod driven_ports {
    use super::*;
    use crate::domain::search::FieldTable;

    /// Persistence operations the generic service needs from an entity's backing store.
    pub trait EntityStore {
        type Entity: HasForeignKeys;

        /// Wire-name-to-column table consulted when building search specifications
        const SEARCH_FIELDS: FieldTable;

        async fn find_by_id(
            &self,
            id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Self::Entity>, anyhow::Error>;

        async fn find_all(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Self::Entity>, anyhow::Error>;

        /// Persists a new entity, returning it as stored (with its assigned ID).
        async fn insert(
            &self,
            entity: &Self::Entity,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Self::Entity, anyhow::Error>;

        /// Overwrites the entity with the given ID, enforcing any version check the
        /// entity carries.
        async fn update(
            &self,
            id: i64,
            entity: &Self::Entity,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<UpdateOutcome<Self::Entity>, anyhow::Error>;

        /// Removes the entity with the given ID. Deleting an absent ID is not an error.
        async fn delete(
            &self,
            id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Fetches one page of entities matching [spec].
        async fn search(
            &self,
            spec: &Specification,
            page: PageRequest,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Page<Self::Entity>, anyhow::Error>;
    }

    /// Existence checks for foreign-key targets.
    pub trait RelationDetect {
        async fn relation_exists(
            &self,
            relation: Relation,
            id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

use driven_ports::{EntityStore, RelationDetect};

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("{relation} with ID {id} referenced by \"{field}\" does not exist")]
    BrokenReference {
        field: &'static str,
        relation: &'static str,
        id: i64,
    },
    #[error("the requested entity does not exist")]
    NotFound,
    #[error("the entity was modified concurrently, refusing a stale overwrite")]
    VersionConflict,
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Generic entity lifecycle operations, parameterized over an [EntityMapper] and handed
/// its store and relation detector per call so adapters stay swappable in tests.
pub struct CrudService<Map> {
    mapper: Map,
}

impl<Map: EntityMapper> CrudService<Map> {
    pub fn new(mapper: Map) -> CrudService<Map> {
        CrudService { mapper }
    }

    /// Verifies every populated foreign key on [entity] points at an existing record.
    async fn resolve_foreign_keys(
        entity: &Map::Entity,
        ext_cxn: &mut impl ExternalConnectivity,
        relations: &impl RelationDetect,
    ) -> Result<(), CrudError> {
        for foreign_key in entity.foreign_keys() {
            let Some(id) = foreign_key.id else {
                continue;
            };

            let target_exists = relations
                .relation_exists(foreign_key.relation, id, &mut *ext_cxn)
                .await
                .context("verifying a foreign key reference")?;
            if !target_exists {
                return Err(CrudError::BrokenReference {
                    field: foreign_key.field,
                    relation: foreign_key.relation.name(),
                    id,
                });
            }
        }

        Ok(())
    }

    /// Maps [input] to a new entity, resolves its foreign keys, and persists it.
    pub async fn create(
        &self,
        input: &Map::Input,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &impl EntityStore<Entity = Map::Entity>,
        relations: &impl RelationDetect,
    ) -> Result<Map::Output, CrudError> {
        let entity = self
            .mapper
            .to_entity(input)
            .context("mapping input for create")?;
        Self::resolve_foreign_keys(&entity, &mut *ext_cxn, relations).await?;

        let stored = store
            .insert(&entity, &mut *ext_cxn)
            .await
            .context("persisting a new entity")?;

        Ok(self.mapper.to_output(stored))
    }

    /// An absent ID is a first-class `None`, not an error.
    pub async fn get_by_id(
        &self,
        id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &impl EntityStore<Entity = Map::Entity>,
    ) -> Result<Option<Map::Output>, CrudError> {
        let entity = store
            .find_by_id(id, &mut *ext_cxn)
            .await
            .context("fetching an entity by ID")?;

        Ok(entity.map(|found| self.mapper.to_output(found)))
    }

    /// Unbounded fetch of every record. Pagination is the search operation's job.
    pub async fn get_all(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &impl EntityStore<Entity = Map::Entity>,
    ) -> Result<Vec<Map::Output>, CrudError> {
        let entities = store
            .find_all(&mut *ext_cxn)
            .await
            .context("fetching all entities")?;

        Ok(entities
            .into_iter()
            .map(|entity| self.mapper.to_output(entity))
            .collect())
    }

    /// Re-maps and re-resolves foreign keys, then overwrites the stored record. The
    /// store enforces the version check carried on the mapped entity.
    pub async fn update(
        &self,
        id: i64,
        input: &Map::Input,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &impl EntityStore<Entity = Map::Entity>,
        relations: &impl RelationDetect,
    ) -> Result<Map::Output, CrudError> {
        let existing = store
            .find_by_id(id, &mut *ext_cxn)
            .await
            .context("looking up an entity before update")?;
        if existing.is_none() {
            return Err(CrudError::NotFound);
        }

        let entity = self
            .mapper
            .to_entity(input)
            .context("mapping input for update")?;
        Self::resolve_foreign_keys(&entity, &mut *ext_cxn, relations).await?;

        let outcome = store
            .update(id, &entity, &mut *ext_cxn)
            .await
            .context("overwriting an entity")?;
        match outcome {
            UpdateOutcome::Updated(stored) => Ok(self.mapper.to_output(stored)),
            UpdateOutcome::VersionConflict => Err(CrudError::VersionConflict),
            UpdateOutcome::Missing => Err(CrudError::NotFound),
        }
    }

    /// Idempotent removal - deleting an ID that's already gone succeeds quietly.
    pub async fn delete(
        &self,
        id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &impl EntityStore<Entity = Map::Entity>,
    ) -> Result<(), CrudError> {
        store
            .delete(id, &mut *ext_cxn)
            .await
            .context("deleting an entity")?;

        Ok(())
    }

    /// Builds a [Specification] from [query] against the store's field table and fetches
    /// the requested page. Unknown searchable fields and filter keys are dropped.
    pub async fn search<Store>(
        &self,
        query: &SearchQuery,
        ext_cxn: &mut impl ExternalConnectivity,
        store: &Store,
    ) -> Result<Page<Map::Output>, CrudError>
    where
        Store: EntityStore<Entity = Map::Entity>,
    {
        let spec = Specification::build(
            query.search_term.as_deref(),
            &query.searchable_fields,
            &query.filters,
            Store::SEARCH_FIELDS,
        );

        let entity_page = store
            .search(&spec, query.page, &mut *ext_cxn)
            .await
            .context("searching entities")?;

        Ok(entity_page.map(|entity| self.mapper.to_output(entity)))
    }
}
