//! Room Manager
//!
//! Process-wide registry of who is in which canvas room. Two indexes are
//! kept in step: canvas → sessions (inside each room) and session → canvases.
//! Every read-then-write on a canvas's membership runs under that canvas's
//! own lock, so unrelated canvases never contend.

use dashmap::DashMap;
use inkboard_core::{CanvasId, CanvasStore, Element, SessionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Room {
    members: HashSet<SessionId>,
    /// Last revision handed to a mutation in this room
    revision: u64,
    /// Set once the room has been removed from the registry; a task that
    /// acquires a closed room must look the canvas up again.
    closed: bool,
}

type RoomCell = Arc<Mutex<Room>>;

/// Result of a successful join
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Newly joined; carries the snapshot for the joining session only
    Joined {
        /// Current elements of the canvas
        elements: Vec<Element>,
    },
    /// The session was already a member; nothing changed
    AlreadyMember,
}

/// Canvas room membership registry
pub struct RoomManager {
    store: Arc<dyn CanvasStore>,
    rooms: DashMap<CanvasId, RoomCell>,
    memberships: DashMap<SessionId, HashSet<CanvasId>>,
    /// Last revision issued per canvas; outlives the room so a room
    /// recreated before its writes land keeps counting upward
    issued: DashMap<CanvasId, u64>,
    accepting: AtomicBool,
}

impl RoomManager {
    /// Create an empty registry that authorizes joins against `store`
    #[must_use]
    pub fn new(store: Arc<dyn CanvasStore>) -> Self {
        Self {
            store,
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            issued: DashMap::new(),
            accepting: AtomicBool::new(true),
        }
    }

    async fn lock_or_create(&self, canvas_id: CanvasId) -> (RoomCell, OwnedMutexGuard<Room>) {
        loop {
            let room = Arc::clone(&self.rooms.entry(canvas_id).or_default());
            let guard = Arc::clone(&room).lock_owned().await;
            if !guard.closed {
                return (room, guard);
            }
        }
    }

    async fn lock_existing(&self, canvas_id: CanvasId) -> Option<(RoomCell, OwnedMutexGuard<Room>)> {
        loop {
            let room = self.rooms.get(&canvas_id).map(|r| Arc::clone(r.value()))?;
            let guard = Arc::clone(&room).lock_owned().await;
            if !guard.closed {
                return Some((room, guard));
            }
        }
    }

    fn close_if_empty(&self, canvas_id: CanvasId, room: &RoomCell, guard: &mut Room) {
        if guard.members.is_empty() && !guard.closed {
            guard.closed = true;
            self.rooms
                .remove_if(&canvas_id, |_, current| Arc::ptr_eq(current, room));
        }
    }

    fn forget_membership(&self, session_id: SessionId, canvas_id: CanvasId) {
        if let Some(mut canvases) = self.memberships.get_mut(&session_id) {
            canvases.remove(&canvas_id);
        }
        self.memberships
            .remove_if(&session_id, |_, canvases| canvases.is_empty());
    }

    /// Join `session_id` (authenticated as `user_id`) to a canvas room.
    ///
    /// The canvas's owner and shared set are read once. Re-joining is a
    /// no-op and returns [`JoinOutcome::AlreadyMember`] without a snapshot.
    pub async fn join(
        &self,
        session_id: SessionId,
        canvas_id: CanvasId,
        user_id: &str,
    ) -> Result<JoinOutcome> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let (room, mut guard) = self.lock_or_create(canvas_id).await;

        if guard.members.contains(&session_id) {
            debug!(session_id = %session_id, canvas_id = %canvas_id, "Already a member, join ignored");
            return Ok(JoinOutcome::AlreadyMember);
        }

        // drain() may have started between the first check and taking the lock
        if !self.accepting.load(Ordering::SeqCst) {
            self.close_if_empty(canvas_id, &room, &mut guard);
            return Err(Error::ShuttingDown);
        }

        let access = match self.store.access(canvas_id).await {
            Ok(access) => access,
            Err(err) => {
                self.close_if_empty(canvas_id, &room, &mut guard);
                return Err(err.into());
            }
        };

        if !access.permits(user_id) {
            self.close_if_empty(canvas_id, &room, &mut guard);
            warn!(
                session_id = %session_id,
                canvas_id = %canvas_id,
                user_id = %user_id,
                "Join refused: neither owner nor shared"
            );
            return Err(inkboard_core::Error::authorization(
                "you are not authorized to join this canvas",
            )
            .into());
        }

        guard.members.insert(session_id);
        let issued = self.issued.get(&canvas_id).map_or(0, |r| *r.value());
        guard.revision = guard.revision.max(access.revision).max(issued);
        self.memberships
            .entry(session_id)
            .or_default()
            .insert(canvas_id);

        info!(
            session_id = %session_id,
            canvas_id = %canvas_id,
            user_id = %user_id,
            members = guard.members.len(),
            "Session joined canvas"
        );

        Ok(JoinOutcome::Joined {
            elements: access.elements,
        })
    }

    /// Remove a membership; returns whether the session was a member
    pub async fn leave(&self, session_id: SessionId, canvas_id: CanvasId) -> bool {
        let Some((room, mut guard)) = self.lock_existing(canvas_id).await else {
            self.forget_membership(session_id, canvas_id);
            return false;
        };

        let removed = guard.members.remove(&session_id);
        self.forget_membership(session_id, canvas_id);
        self.close_if_empty(canvas_id, &room, &mut guard);

        if removed {
            info!(session_id = %session_id, canvas_id = %canvas_id, "Session left canvas");
        }
        removed
    }

    /// Leave every canvas the session joined; returns how many it left
    pub async fn disconnect(&self, session_id: SessionId) -> usize {
        let canvases = self
            .memberships
            .remove(&session_id)
            .map(|(_, canvases)| canvases)
            .unwrap_or_default();

        let mut left = 0;
        for canvas_id in canvases {
            if let Some((room, mut guard)) = self.lock_existing(canvas_id).await {
                if guard.members.remove(&session_id) {
                    left += 1;
                }
                self.close_if_empty(canvas_id, &room, &mut guard);
            }
        }

        debug!(session_id = %session_id, rooms_left = left, "Session disconnected");
        left
    }

    /// Run `deliver` with the sender's peers and a fresh revision, under the
    /// room lock. Fails with [`Error::NotMember`] if the sender has not
    /// joined the room.
    pub async fn fan_out<R>(
        &self,
        session_id: SessionId,
        canvas_id: CanvasId,
        deliver: impl FnOnce(&[SessionId], u64) -> R,
    ) -> Result<R> {
        let not_member = || Error::NotMember {
            session_id,
            canvas_id,
        };

        let (_room, mut guard) = self
            .lock_existing(canvas_id)
            .await
            .ok_or_else(not_member)?;
        if !guard.members.contains(&session_id) {
            return Err(not_member());
        }

        guard.revision += 1;
        self.issued.insert(canvas_id, guard.revision);
        let peers: Vec<SessionId> = guard
            .members
            .iter()
            .copied()
            .filter(|member| *member != session_id)
            .collect();
        Ok(deliver(&peers, guard.revision))
    }

    /// Current members of a canvas room
    pub async fn members(&self, canvas_id: CanvasId) -> Vec<SessionId> {
        match self.lock_existing(canvas_id).await {
            Some((_room, guard)) => guard.members.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Remove every member of a canvas room and drop the room along with
    /// its revision counter
    pub async fn evict(&self, canvas_id: CanvasId) -> Vec<SessionId> {
        let Some((room, mut guard)) = self.lock_existing(canvas_id).await else {
            self.issued.remove(&canvas_id);
            return Vec::new();
        };
        self.issued.remove(&canvas_id);

        let members: Vec<SessionId> = guard.members.drain().collect();
        for member in &members {
            self.forget_membership(*member, canvas_id);
        }
        self.close_if_empty(canvas_id, &room, &mut guard);

        info!(canvas_id = %canvas_id, evicted = members.len(), "Room evicted");
        members
    }

    /// Stop accepting joins and clear every membership
    pub async fn drain(&self) -> usize {
        self.accepting.store(false, Ordering::SeqCst);

        let canvases: Vec<CanvasId> = self.rooms.iter().map(|entry| *entry.key()).collect();
        let mut evicted = 0;
        for canvas_id in canvases {
            evicted += self.evict(canvas_id).await.len();
        }
        self.memberships.clear();

        info!(evicted, "Room registry drained");
        evicted
    }

    /// Whether joins are currently accepted
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Whether the session is a member of the canvas room
    #[must_use]
    pub fn is_member(&self, session_id: SessionId, canvas_id: CanvasId) -> bool {
        self.memberships
            .get(&session_id)
            .is_some_and(|canvases| canvases.contains(&canvas_id))
    }

    /// Canvases the session has joined
    #[must_use]
    pub fn canvases_of(&self, session_id: SessionId) -> Vec<CanvasId> {
        self.memberships
            .get(&session_id)
            .map(|canvases| canvases.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live rooms
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of sessions with at least one membership
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.memberships.len()
    }
}
