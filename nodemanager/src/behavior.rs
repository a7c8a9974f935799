//! The Behavior Substitution Layer.
//!
//! Imported object nodes are generic. A [`BehaviorRegistry`] maps type
//! definitions to [`BehaviorFactory`]s; for every object whose type has a
//! factory the generic node is replaced by a specialized copy that carries the
//! factory's [`NodeBehavior`]. The default registry is empty, so the pass is a
//! no-op unless a configured node manager supplies factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use liha_model::{NodeBehavior, NodeClass, NodeDescriptor, NodeId};
use tracing::{debug, warn};

use crate::address_space::AddressSpace;
use crate::error::{BehaviorError, GraphError};

/// Result of a [`BehaviorFactory`].
pub type BehaviorResult = Result<Arc<dyn NodeBehavior>, BehaviorError>;

/// Builds the behavior for one node of a known type.
pub trait BehaviorFactory: Send + Sync {
    /// Creates the behavior to attach to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`BehaviorError`] if the node cannot be specialized; the
    /// generic node is then kept.
    fn create(&self, node: &NodeDescriptor) -> BehaviorResult;
}

impl<F> BehaviorFactory for F
where
    F: Fn(&NodeDescriptor) -> BehaviorResult + Send + Sync,
{
    fn create(&self, node: &NodeDescriptor) -> BehaviorResult {
        self(node)
    }
}

/// Type definition to factory mapping.
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    factories: HashMap<NodeId, Arc<dyn BehaviorFactory>>,
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.factories.keys().map(ToString::to_string).collect();
        types.sort();
        f.debug_struct("BehaviorRegistry").field("types", &types).finish()
    }
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for objects of `type_definition`, returning the
    /// factory it replaces.
    pub fn register(
        &mut self,
        type_definition: NodeId,
        factory: Arc<dyn BehaviorFactory>,
    ) -> Option<Arc<dyn BehaviorFactory>> {
        self.factories.insert(type_definition, factory)
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, type_definition: NodeId, factory: impl BehaviorFactory + 'static) -> Self {
        self.factories.insert(type_definition, Arc::new(factory));
        self
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns true if `type_definition` has a factory.
    #[must_use]
    pub fn contains(&self, type_definition: &NodeId) -> bool {
        self.factories.contains_key(type_definition)
    }

    /// Specializes the node stored under `node_id` if its type has a factory
    /// and returns the node now stored there. Nodes that are not candidates,
    /// or whose factory fails, are returned unchanged.
    ///
    /// Candidates are objects without a behavior whose type definition is a
    /// numeric id in one of the graph's namespaces.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `node_id` is not in the graph.
    pub fn substitute(
        &self,
        space: &mut AddressSpace,
        node_id: &NodeId,
    ) -> Result<NodeDescriptor, GraphError> {
        let node = space
            .find(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let Some(factory) = self.candidate_factory(space, &node) else {
            return Ok(node);
        };
        let behavior = match factory.create(&node) {
            Ok(behavior) => behavior,
            Err(error) => {
                warn!(node = %node_id, %error, "keeping generic node");
                return Ok(node);
            }
        };

        let mut specialized = node;
        specialized.behavior = Some(Arc::clone(&behavior));
        space.replace_node(node_id, specialized.clone())?;
        debug!(node = %node_id, behavior = behavior.name(), "attached node behavior");
        behavior.on_attached(&specialized);
        Ok(specialized)
    }

    fn candidate_factory(
        &self,
        space: &AddressSpace,
        node: &NodeDescriptor,
    ) -> Option<&Arc<dyn BehaviorFactory>> {
        if node.node_class != NodeClass::Object || node.behavior.is_some() {
            return None;
        }
        let type_definition = node.type_definition.as_ref()?;
        if !space.owns_namespace(type_definition.namespace_index) {
            return None;
        }
        type_definition.as_numeric()?;
        self.factories.get(type_definition)
    }

    /// Runs [`substitute`](Self::substitute) over every node of the graph and
    /// returns how many were specialized.
    ///
    /// # Errors
    ///
    /// Propagates [`GraphError`] from [`substitute`](Self::substitute).
    pub fn substitute_all(&self, space: &mut AddressSpace) -> Result<usize, GraphError> {
        if self.is_empty() {
            return Ok(0);
        }
        let ids: Vec<NodeId> = space.node_ids().cloned().collect();
        let mut specialized = 0;
        for id in &ids {
            let had_behavior = space.node(id).is_some_and(|n| n.read().behavior.is_some());
            let node = self.substitute(space, id)?;
            if !had_behavior && node.behavior.is_some() {
                specialized += 1;
            }
        }
        Ok(specialized)
    }
}
