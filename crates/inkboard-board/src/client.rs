//! Board client
//!
//! Binds a [`BoardState`] to one canvas over a [`Transport`]. Local input and
//! inbound server messages go through a single queue and are handled one at
//! a time. Live updates are throttled per mutation kind; commits always go
//! out immediately.

use inkboard_core::{
    CanvasId, ClientMessage, Element, MutationKind, Point, ServerMessage, UnauthorizedReason,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::board::{BoardState, Tool, ToolStyle};
use crate::history::HistoryPolicy;
use crate::throttle::Throttle;

/// Minimum spacing between live updates of one mutation kind
pub const EMIT_INTERVAL: Duration = Duration::from_millis(50);

/// Outbound side of the real-time connection
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Send one message to the server
    fn send(&mut self, message: ClientMessage);
}

/// Collects messages instead of sending them
impl Transport for Vec<ClientMessage> {
    fn send(&mut self, message: ClientMessage) {
        self.push(message);
    }
}

/// Local user input
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pick a tool
    SelectTool(Tool),
    /// Change a tool's style
    SetStyle(Tool, ToolStyle),
    /// Pointer pressed
    PointerDown(Point),
    /// Pointer moved
    PointerMove(Point),
    /// Pointer released
    PointerUp,
    /// Text input lost focus with this content
    TextCommitted(String),
    /// Undo
    Undo,
    /// Redo
    Redo,
}

/// Anything the client reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// Local user input
    Input(InputEvent),
    /// Message from the server
    Inbound(ServerMessage),
    /// Timer wake-up for throttled updates
    Tick,
}

/// Client session for one canvas at a time
pub struct BoardClient<T: Transport> {
    transport: T,
    board: BoardState,
    canvas_id: Option<CanvasId>,
    name: Option<String>,
    unauthorized: Option<UnauthorizedReason>,
    last_error: Option<String>,
    queue: VecDeque<BoardEvent>,
    draw_throttle: Throttle<Vec<Element>>,
    erase_throttle: Throttle<Vec<Element>>,
    listening: bool,
}

impl<T: Transport> BoardClient<T> {
    /// Create a client with the default history policy
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, HistoryPolicy::default())
    }

    /// Create a client with an explicit history policy
    pub fn with_policy(transport: T, policy: HistoryPolicy) -> Self {
        Self {
            transport,
            board: BoardState::new(policy),
            canvas_id: None,
            name: None,
            unauthorized: None,
            last_error: None,
            queue: VecDeque::new(),
            draw_throttle: Throttle::new(EMIT_INTERVAL),
            erase_throttle: Throttle::new(EMIT_INTERVAL),
            listening: true,
        }
    }

    /// Local board
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Canvas currently joined
    pub fn canvas_id(&self) -> Option<CanvasId> {
        self.canvas_id
    }

    /// Latest name announced for the canvas
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Why the server refused the join, if it did
    pub fn unauthorized_reason(&self) -> Option<UnauthorizedReason> {
        self.unauthorized
    }

    /// Whether drawing is currently allowed
    pub fn is_authorized(&self) -> bool {
        self.unauthorized.is_none()
    }

    /// Last error reported by the server
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether inbound messages are still processed
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Transport, for callers that own the other end
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Join a canvas, leaving the previous one first
    pub fn open(&mut self, canvas_id: CanvasId) {
        if self.canvas_id == Some(canvas_id) {
            return;
        }
        self.leave_current();
        self.board.reset();
        self.name = None;
        self.unauthorized = None;
        self.listening = true;
        self.canvas_id = Some(canvas_id);
        self.transport.send(ClientMessage::Join { canvas_id });
        info!(canvas_id = %canvas_id, "Joining canvas");
    }

    /// Leave the joined canvas and stop processing anything further
    pub fn teardown(&mut self) {
        self.leave_current();
        self.listening = false;
        self.queue.clear();
        debug!("Board client torn down");
    }

    fn leave_current(&mut self) {
        self.draw_throttle.cancel();
        self.erase_throttle.cancel();
        if let Some(canvas_id) = self.canvas_id.take() {
            self.transport.send(ClientMessage::Leave { canvas_id });
            info!(canvas_id = %canvas_id, "Left canvas");
        }
    }

    /// Queue an event without handling it yet
    pub fn enqueue(&mut self, event: BoardEvent) {
        if self.listening {
            self.queue.push_back(event);
        }
    }

    /// Queue an event and handle everything queued, in order
    pub fn process(&mut self, now: Instant, event: BoardEvent) {
        self.enqueue(event);
        self.drain(now);
    }

    /// Handle everything queued, in order
    pub fn drain(&mut self, now: Instant) {
        while let Some(event) = self.queue.pop_front() {
            if !self.listening {
                break;
            }
            match event {
                BoardEvent::Input(input) => self.on_input(now, input),
                BoardEvent::Inbound(message) => self.on_inbound(message),
                BoardEvent::Tick => self.on_tick(now),
            }
        }
    }

    /// When a throttled update next needs a [`BoardEvent::Tick`]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (
            self.draw_throttle.next_deadline(),
            self.erase_throttle.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn on_input(&mut self, now: Instant, input: InputEvent) {
        match input {
            InputEvent::SelectTool(tool) => self.board.select_tool(tool),
            InputEvent::SetStyle(tool, style) => self.board.set_style(tool, style),
            _ if !self.is_authorized() => {
                debug!(input = ?input, "Input ignored, not authorized");
            }
            InputEvent::PointerDown(at) => {
                self.board.pointer_down(at);
            }
            InputEvent::PointerMove(at) => {
                if let Some(kind) = self.board.pointer_move(at) {
                    let elements = self.board.elements().to_vec();
                    if let Some(elements) = self.throttle(kind).offer(now, elements) {
                        self.emit(elements, kind);
                    }
                }
            }
            InputEvent::PointerUp => {
                if let Some(kind) = self.board.pointer_up() {
                    self.emit_now(kind);
                }
            }
            InputEvent::TextCommitted(text) => {
                if self.board.finish_text(&text) {
                    self.emit_now(MutationKind::Draw);
                }
            }
            InputEvent::Undo => {
                if self.board.undo() {
                    self.emit_now(MutationKind::Draw);
                }
            }
            InputEvent::Redo => {
                if self.board.redo() {
                    self.emit_now(MutationKind::Draw);
                }
            }
        }
    }

    fn on_inbound(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Snapshot {
                canvas_id,
                elements,
            }
            | ServerMessage::PeerMutate {
                canvas_id,
                elements,
                ..
            } => {
                if self.is_current(canvas_id) {
                    // Parked live updates predate the remote state
                    self.draw_throttle.cancel();
                    self.erase_throttle.cancel();
                    self.board.sync(elements);
                }
            }
            ServerMessage::NameChanged { canvas_id, name } => {
                if self.is_current(canvas_id) {
                    self.name = Some(name);
                }
            }
            ServerMessage::Unauthorized { canvas_id, reason } => {
                if self.is_current(canvas_id) {
                    warn!(canvas_id = %canvas_id, reason = %reason, "Canvas access refused");
                    self.unauthorized = Some(reason);
                    self.draw_throttle.cancel();
                    self.erase_throttle.cancel();
                }
            }
            ServerMessage::CanvasDeleted { canvas_id } => {
                if self.is_current(canvas_id) {
                    info!(canvas_id = %canvas_id, "Canvas deleted");
                    self.canvas_id = None;
                    self.draw_throttle.cancel();
                    self.erase_throttle.cancel();
                    self.board.reset();
                }
            }
            ServerMessage::Error { code, message } => {
                warn!(code = %code, message = %message, "Server error");
                self.last_error = Some(code);
            }
            ServerMessage::Pong => {}
        }
    }

    fn on_tick(&mut self, now: Instant) {
        if let Some(elements) = self.draw_throttle.poll(now) {
            self.emit(elements, MutationKind::Draw);
        }
        if let Some(elements) = self.erase_throttle.poll(now) {
            self.emit(elements, MutationKind::Erase);
        }
    }

    fn is_current(&self, canvas_id: CanvasId) -> bool {
        let current = self.canvas_id == Some(canvas_id);
        if !current {
            debug!(canvas_id = %canvas_id, "Message for another canvas ignored");
        }
        current
    }

    fn throttle(&mut self, kind: MutationKind) -> &mut Throttle<Vec<Element>> {
        match kind {
            MutationKind::Draw => &mut self.draw_throttle,
            MutationKind::Erase => &mut self.erase_throttle,
        }
    }

    fn emit_now(&mut self, kind: MutationKind) {
        self.throttle(kind).cancel();
        let elements = self.board.elements().to_vec();
        self.emit(elements, kind);
    }

    fn emit(&mut self, elements: Vec<Element>, kind: MutationKind) {
        if let Some(canvas_id) = self.canvas_id {
            self.transport.send(ClientMessage::Mutate {
                canvas_id,
                elements,
                kind,
            });
        }
    }
}

#[cfg(test)]
mod tests;
