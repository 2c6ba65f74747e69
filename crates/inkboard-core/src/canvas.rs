//! Canvas Record
//!
//! The durable record of a canvas: who owns it, who it is shared with, and
//! its current element collection. Authorization rules live here so every
//! store implementation enforces them identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::{CanvasId, UserId};

/// Name given to freshly created canvases
pub const DEFAULT_CANVAS_NAME: &str = "Untitled";

/// Longest permitted canvas name, in characters
pub const MAX_CANVAS_NAME_CHARS: usize = 20;

/// Check a canvas name is 1..=20 characters
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_CANVAS_NAME_CHARS {
        return Err(Error::validation(format!(
            "canvas name must be between 1-{} characters",
            MAX_CANVAS_NAME_CHARS
        )));
    }
    Ok(())
}

/// A durable canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Unique identifier
    pub id: CanvasId,

    /// User who created the canvas
    pub owner: UserId,

    /// Non-owners with edit access; never contains the owner
    pub shared: Vec<UserId>,

    /// Elements in z-order
    pub elements: Vec<Element>,

    /// Display name
    pub name: String,

    /// Revision of the last relayed element write
    pub revision: u64,

    /// When the canvas was created
    pub created_at: DateTime<Utc>,
}

impl Canvas {
    /// Create an empty canvas owned by `owner`
    #[must_use]
    pub fn new(owner: impl Into<UserId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            shared: Vec::new(),
            elements: Vec::new(),
            name: DEFAULT_CANVAS_NAME.to_string(),
            revision: 0,
            created_at: Utc::now(),
        }
    }

    /// Whether `user` owns this canvas
    #[must_use]
    pub fn is_owner(&self, user: &str) -> bool {
        self.owner == user
    }

    /// Whether `user` may join the canvas and mutate its elements
    #[must_use]
    pub fn can_edit(&self, user: &str) -> bool {
        self.is_owner(user) || self.shared.iter().any(|u| u == user)
    }

    /// Fail unless `caller` owns the canvas
    pub fn ensure_owner(&self, caller: &str, action: &str) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(Error::authorization(format!(
                "only the owner can {} this canvas",
                action
            )))
        }
    }

    /// Fail unless `caller` is the owner or a shared user
    pub fn ensure_editor(&self, caller: &str) -> Result<()> {
        if self.can_edit(caller) {
            Ok(())
        } else {
            Err(Error::authorization("not authorized for this canvas"))
        }
    }

    /// Add `grantee` to the shared set
    pub fn grant(&mut self, grantee: &str) -> Result<()> {
        if self.is_owner(grantee) {
            return Err(Error::validation("owner cannot be added to shared list"));
        }
        if self.shared.iter().any(|u| u == grantee) {
            return Err(Error::conflict("already shared with user"));
        }
        self.shared.push(grantee.to_string());
        Ok(())
    }
}

/// The slice of a canvas a room join needs, read in one lookup
#[derive(Debug, Clone)]
pub struct CanvasAccess {
    /// Canvas owner
    pub owner: UserId,
    /// Shared users
    pub shared: Vec<UserId>,
    /// Current elements
    pub elements: Vec<Element>,
    /// Stored revision
    pub revision: u64,
}

impl CanvasAccess {
    /// Whether `user` is the owner or a shared user
    #[must_use]
    pub fn permits(&self, user: &str) -> bool {
        self.owner == user || self.shared.iter().any(|u| u == user)
    }
}

impl From<Canvas> for CanvasAccess {
    fn from(canvas: Canvas) -> Self {
        Self {
            owner: canvas.owner,
            shared: canvas.shared,
            elements: canvas.elements,
            revision: canvas.revision,
        }
    }
}

/// Summary of a canvas for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSummary {
    /// Canvas ID
    pub id: CanvasId,
    /// Display name
    pub name: String,
    /// Owner
    pub owner: UserId,
    /// Number of shared users
    pub shared_count: usize,
    /// When the canvas was created
    pub created_at: DateTime<Utc>,
}
