//! Access to the entities that own identifiers.
//!
//! The managers never inspect entity records themselves. Callers hand them
//! an [`EntityIdAccessor`] saying how to read an entity's key, and an
//! [`EntityRepository`] listing the entities.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::StoreResult;
use crate::types::EntityId;

/// Reads the [`EntityId`] of an entity record.
pub struct EntityIdAccessor<E> {
    get: Arc<dyn Fn(&E) -> EntityId + Send + Sync>,
}

impl<E> EntityIdAccessor<E> {
    /// Wraps a key-reading function.
    pub fn new(get: impl Fn(&E) -> EntityId + Send + Sync + 'static) -> Self {
        Self { get: Arc::new(get) }
    }

    /// Key of `entity`.
    pub fn id_of(&self, entity: &E) -> EntityId {
        (self.get)(entity)
    }
}

impl<E> Clone for EntityIdAccessor<E> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
        }
    }
}

impl<E> fmt::Debug for EntityIdAccessor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EntityIdAccessor")
    }
}

/// Source of entity records.
pub trait EntityRepository<E>: Send + Sync {
    /// Every entity.
    fn list(&self) -> StoreResult<Vec<E>>;

    /// Caches the entity's primary identifier value, if the entity has
    /// such a field. Returns whether anything was updated.
    fn update_primary_symbol(&self, _entity_id: EntityId, _symbol: &str) -> StoreResult<bool> {
        Ok(false)
    }
}

type SymbolSetter<E> = Arc<dyn Fn(&mut E, &str) + Send + Sync>;

/// Entities held in memory.
pub struct InMemoryEntityRepository<E> {
    entities: RwLock<Vec<E>>,
    accessor: EntityIdAccessor<E>,
    set_symbol: Option<SymbolSetter<E>>,
}

impl<E: Clone + Send + Sync> InMemoryEntityRepository<E> {
    /// Creates a repository over `entities`.
    pub fn new(entities: Vec<E>, accessor: EntityIdAccessor<E>) -> Self {
        Self {
            entities: RwLock::new(entities),
            accessor,
            set_symbol: None,
        }
    }

    /// Enables primary symbol caching through `set_symbol`.
    #[must_use]
    pub fn with_primary_symbol(mut self, set_symbol: impl Fn(&mut E, &str) + Send + Sync + 'static) -> Self {
        self.set_symbol = Some(Arc::new(set_symbol));
        self
    }

    /// Adds an entity.
    pub fn insert(&self, entity: E) {
        self.entities.write().push(entity);
    }

    /// Entity with the given key.
    pub fn get(&self, entity_id: EntityId) -> Option<E> {
        self.entities
            .read()
            .iter()
            .find(|e| self.accessor.id_of(e) == entity_id)
            .cloned()
    }
}

impl<E: Clone + Send + Sync> EntityRepository<E> for InMemoryEntityRepository<E> {
    fn list(&self) -> StoreResult<Vec<E>> {
        Ok(self.entities.read().clone())
    }

    fn update_primary_symbol(&self, entity_id: EntityId, symbol: &str) -> StoreResult<bool> {
        let Some(set_symbol) = &self.set_symbol else {
            return Ok(false);
        };
        let mut entities = self.entities.write();
        match entities
            .iter_mut()
            .find(|e| self.accessor.id_of(e) == entity_id)
        {
            Some(entity) => {
                set_symbol(entity, symbol);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
