use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

/// Stable integer identity of a registered tool
///
/// Indices and caches key off this id, never off tool equality. An id is
/// never handed out twice, so a stale reference can at worst miss, not
/// alias a different tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolId(u32);

impl ToolId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tool#{}", self.0)
    }
}

/// Arena of registered tools with stable integer keys
///
/// Mutation is single-writer: the host must serialize register/unregister
/// against in-flight queries, the arena itself takes no locks.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    slots: Vec<Option<Arc<Tool>>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a batch of tools
    pub fn from_tools(tools: impl IntoIterator<Item = Tool>) -> Self {
        let mut catalog = Self::new();
        for tool in tools {
            catalog.register(tool);
        }
        catalog
    }

    /// Register a tool and return its identity
    pub fn register(&mut self, tool: Tool) -> ToolId {
        let id = ToolId(u32::try_from(self.slots.len()).expect("catalog exceeds u32 slots"));
        self.slots.push(Some(Arc::new(tool)));
        id
    }

    /// Remove a tool; the slot stays parked so the id is never reissued
    pub fn unregister(&mut self, id: ToolId) -> Option<Arc<Tool>> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    #[must_use]
    pub fn get(&self, id: ToolId) -> Option<&Arc<Tool>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Iterate live registrations in id order
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, &Arc<Tool>)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|tool| (ToolId(idx as u32), tool))
        })
    }

    /// Number of live registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a tool by exact name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<(ToolId, &Arc<Tool>)> {
        self.iter().find(|(_, tool)| tool.name == name)
    }
}
