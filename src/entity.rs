use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;

/// Server-assigned entity id. Zero never identifies a real entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Reads the leading decimal digits of an element id such as `42_link`.
    pub fn parse_prefix(element_id: &str) -> Option<Self> {
        let digits_end = element_id
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(element_id.len());
        element_id[..digits_end].parse().ok().and_then(Self::new)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Link,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Link => "link",
        }
    }
}

/// A category, or a link together with the category that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Category {
        category_id: EntityId,
    },
    Link {
        category_id: EntityId,
        link_id: EntityId,
    },
}

impl EntityRef {
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Category { .. } => EntityKind::Category,
            Self::Link { .. } => EntityKind::Link,
        }
    }

    pub const fn category_id(self) -> EntityId {
        match self {
            Self::Category { category_id } | Self::Link { category_id, .. } => category_id,
        }
    }

    /// REST path used for update and delete requests.
    pub fn api_path(self) -> String {
        match self {
            Self::Category { category_id } => format!("/api/category/{category_id}"),
            Self::Link {
                category_id,
                link_id,
            } => format!("/api/category/{category_id}/link/{link_id}"),
        }
    }

    /// Element id of the entity's row in the visual tree.
    pub fn element_id(self) -> String {
        match self {
            Self::Category { category_id } => category_element_id(category_id),
            Self::Link { link_id, .. } => link_element_id(link_id),
        }
    }
}

pub fn category_element_id(id: EntityId) -> String {
    format!("{id}_category")
}

pub fn link_element_id(id: EntityId) -> String {
    format!("{id}_link")
}
