//! Broadcast Relay
//!
//! Fans a member's mutation out to the other members of the room, then
//! hands persistence to a background task. Delivery never waits on the
//! store; a failed write is logged and the broadcast stands.

use inkboard_core::{CanvasId, CanvasStore, Element, MutationKind, ServerMessage, SessionId};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::Result;
use crate::rooms::RoomManager;
use crate::session::SessionRegistry;

/// Mutation fan-out plus fire-and-forget persistence
pub struct BroadcastRelay {
    rooms: Arc<RoomManager>,
    sessions: Arc<SessionRegistry>,
    store: Arc<dyn CanvasStore>,
    persistence: TaskTracker,
}

impl BroadcastRelay {
    /// Create a relay over the given registries and store
    #[must_use]
    pub fn new(
        rooms: Arc<RoomManager>,
        sessions: Arc<SessionRegistry>,
        store: Arc<dyn CanvasStore>,
    ) -> Self {
        Self {
            rooms,
            sessions,
            store,
            persistence: TaskTracker::new(),
        }
    }

    /// Relay a mutation from `session_id` to every other member of the room.
    ///
    /// Returns the number of peers the message was queued for. A sender that
    /// is not a member gets [`crate::Error::NotMember`] and nothing is
    /// broadcast or persisted.
    pub async fn on_mutation(
        &self,
        session_id: SessionId,
        canvas_id: CanvasId,
        elements: Vec<Element>,
        kind: MutationKind,
    ) -> Result<usize> {
        let message = ServerMessage::PeerMutate {
            canvas_id,
            elements: elements.clone(),
            kind,
        };
        let sessions = &self.sessions;

        let fanned = self
            .rooms
            .fan_out(session_id, canvas_id, |peers, revision| {
                let mut delivered = 0;
                for peer in peers {
                    if sessions.send(*peer, message.clone()) {
                        delivered += 1;
                    } else {
                        debug!(peer = %peer, "Peer queue closed, skipping");
                    }
                }
                (delivered, revision)
            })
            .await;

        let (delivered, revision) = match fanned {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    canvas_id = %canvas_id,
                    error = %err,
                    "Mutation dropped"
                );
                return Err(err);
            }
        };

        let store = Arc::clone(&self.store);
        self.persistence.spawn(async move {
            match store.write_elements(canvas_id, revision, &elements).await {
                Ok(true) => {
                    debug!(canvas_id = %canvas_id, revision, "Mutation persisted");
                }
                Ok(false) => {
                    debug!(canvas_id = %canvas_id, revision, "Stale write skipped");
                }
                Err(err) => {
                    warn!(
                        canvas_id = %canvas_id,
                        revision,
                        error = %err,
                        "Failed to persist mutation"
                    );
                }
            }
        });

        debug!(
            session_id = %session_id,
            canvas_id = %canvas_id,
            kind = %kind,
            delivered,
            revision,
            "Mutation relayed"
        );
        Ok(delivered)
    }

    /// Wait for every persistence task started so far
    pub async fn flush(&self) {
        self.persistence.close();
        self.persistence.wait().await;
        self.persistence.reopen();
    }

    /// Number of persistence tasks still running
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.persistence.len()
    }
}
