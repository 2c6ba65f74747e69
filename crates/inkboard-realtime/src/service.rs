//! Canvas Service
//!
//! Request/response canvas operations. Most pass straight through to the
//! store; rename and delete also signal sessions currently in the room.

use inkboard_core::{
    Canvas, CanvasId, CanvasStore, CanvasSummary, Element, ServerMessage, UserId,
};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::rooms::RoomManager;
use crate::session::SessionRegistry;

/// Canvas operations aware of live rooms
pub struct CanvasService {
    store: Arc<dyn CanvasStore>,
    rooms: Arc<RoomManager>,
    sessions: Arc<SessionRegistry>,
}

impl CanvasService {
    /// Create a service over the given store and registries
    #[must_use]
    pub fn new(
        store: Arc<dyn CanvasStore>,
        rooms: Arc<RoomManager>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            store,
            rooms,
            sessions,
        }
    }

    /// Create an empty canvas owned by `owner`
    pub async fn create(&self, owner: &str) -> Result<CanvasId> {
        let canvas_id = self.store.create(owner).await?;
        info!(canvas_id = %canvas_id, owner = %owner, "Canvas created");
        Ok(canvas_id)
    }

    /// Load a canvas the caller may edit
    pub async fn load(&self, canvas_id: CanvasId, caller: &str) -> Result<Canvas> {
        Ok(self.store.load(canvas_id, caller).await?)
    }

    /// Replace the elements of a canvas outside the real-time path
    pub async fn replace_elements(
        &self,
        canvas_id: CanvasId,
        caller: &str,
        elements: &[Element],
    ) -> Result<()> {
        Ok(self.store.replace_elements(canvas_id, caller, elements).await?)
    }

    /// Rename a canvas and tell every member of its room
    pub async fn rename(&self, canvas_id: CanvasId, caller: &str, name: &str) -> Result<usize> {
        self.store.rename(canvas_id, caller, name).await?;

        let members = self.rooms.members(canvas_id).await;
        let message = ServerMessage::NameChanged {
            canvas_id,
            name: name.to_string(),
        };
        let notified = members
            .iter()
            .filter(|member| self.sessions.send(**member, message.clone()))
            .count();

        info!(canvas_id = %canvas_id, notified, "Canvas renamed");
        Ok(notified)
    }

    /// Grant edit access by email; returns the grantee's user id
    pub async fn share(&self, canvas_id: CanvasId, owner: &str, email: &str) -> Result<UserId> {
        let grantee = self.store.share(canvas_id, owner, email).await?;
        info!(canvas_id = %canvas_id, grantee = %grantee, "Canvas shared");
        Ok(grantee)
    }

    /// Revoke edit access. Sessions already in the room keep their membership.
    pub async fn unshare(&self, canvas_id: CanvasId, owner: &str, grantee: &str) -> Result<()> {
        self.store.unshare(canvas_id, owner, grantee).await?;
        info!(canvas_id = %canvas_id, grantee = %grantee, "Canvas unshared");
        Ok(())
    }

    /// Delete a canvas, evict its room and tell the evicted sessions
    pub async fn delete(&self, canvas_id: CanvasId, owner: &str) -> Result<usize> {
        self.store.delete(canvas_id, owner).await?;

        let evicted = self.rooms.evict(canvas_id).await;
        for session_id in &evicted {
            self.sessions
                .send(*session_id, ServerMessage::CanvasDeleted { canvas_id });
        }

        info!(canvas_id = %canvas_id, evicted = evicted.len(), "Canvas deleted");
        Ok(evicted.len())
    }

    /// Canvases owned by or shared with `user`, newest first
    pub async fn list(&self, user: &str) -> Result<Vec<CanvasSummary>> {
        Ok(self.store.list(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{SqliteCanvasStore, UserDirectory};
    use sqlx::sqlite::SqlitePoolOptions;
    use uuid::Uuid;

    async fn setup() -> (Arc<RoomManager>, Arc<SessionRegistry>, CanvasService) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteCanvasStore::new(pool);
        store.init().await.unwrap();
        store.add_user("owner", "owner@example.com").await.unwrap();
        store.add_user("bob", "bob@example.com").await.unwrap();
        let store: Arc<dyn CanvasStore> = Arc::new(store);

        let rooms = Arc::new(RoomManager::new(store.clone()));
        let sessions = Arc::new(SessionRegistry::new());
        let service = CanvasService::new(store, rooms.clone(), sessions.clone());
        (rooms, sessions, service)
    }

    #[tokio::test]
    async fn test_rename_notifies_all_members() {
        let (rooms, sessions, service) = setup().await;
        let canvas = service.create("owner").await.unwrap();
        service.share(canvas, "owner", "bob@example.com").await.unwrap();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = sessions.register(a);
        let mut rx_b = sessions.register(b);
        rooms.join(a, canvas, "owner").await.unwrap();
        rooms.join(b, canvas, "bob").await.unwrap();

        let notified = service.rename(canvas, "owner", "Plans").await.unwrap();
        assert_eq!(notified, 2);

        let expected = ServerMessage::NameChanged {
            canvas_id: canvas,
            name: "Plans".to_string(),
        };
        assert_eq!(rx_a.try_recv().unwrap(), expected);
        assert_eq!(rx_b.try_recv().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_failed_rename_notifies_nobody() {
        let (rooms, sessions, service) = setup().await;
        let canvas = service.create("owner").await.unwrap();
        let a = Uuid::new_v4();
        let mut rx = sessions.register(a);
        rooms.join(a, canvas, "owner").await.unwrap();

        let err = service
            .rename(canvas, "owner", "far too long a canvas name")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_evicts_room() {
        let (rooms, sessions, service) = setup().await;
        let canvas = service.create("owner").await.unwrap();
        let a = Uuid::new_v4();
        let mut rx = sessions.register(a);
        rooms.join(a, canvas, "owner").await.unwrap();

        assert_eq!(service.delete(canvas, "owner").await.unwrap(), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerMessage::CanvasDeleted { canvas_id: canvas }
        );
        assert!(!rooms.is_member(a, canvas));
        assert_eq!(service.load(canvas, "owner").await.unwrap_err().code(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_keeps_room() {
        let (rooms, sessions, service) = setup().await;
        let canvas = service.create("owner").await.unwrap();
        service.share(canvas, "owner", "bob@example.com").await.unwrap();
        let a = Uuid::new_v4();
        let _rx = sessions.register(a);
        rooms.join(a, canvas, "bob").await.unwrap();

        let err = service.delete(canvas, "bob").await.unwrap_err();
        assert_eq!(err.code(), "forbidden");
        assert!(rooms.is_member(a, canvas));
    }
}
