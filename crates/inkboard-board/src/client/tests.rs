use super::*;
use inkboard_core::Shape;
use mockall::predicate::eq;
use mockall::Sequence;
use uuid::Uuid;

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn input(event: InputEvent) -> BoardEvent {
    BoardEvent::Input(event)
}

fn joined_client() -> (BoardClient<Vec<ClientMessage>>, CanvasId) {
    let canvas_id = Uuid::new_v4();
    let mut client = BoardClient::new(Vec::new());
    client.open(canvas_id);
    client.process(
        Instant::now(),
        BoardEvent::Inbound(ServerMessage::Snapshot {
            canvas_id,
            elements: vec![],
        }),
    );
    client.transport_mut().clear();
    (client, canvas_id)
}

fn mutations(client: &BoardClient<Vec<ClientMessage>>) -> Vec<(usize, MutationKind)> {
    client
        .transport()
        .iter()
        .filter_map(|message| match message {
            ClientMessage::Mutate { elements, kind, .. } => Some((elements.len(), *kind)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_open_sends_join_and_applies_snapshot() {
    let canvas_id = Uuid::new_v4();
    let mut client = BoardClient::new(Vec::new());
    client.open(canvas_id);
    assert_eq!(client.transport(), &vec![ClientMessage::Join { canvas_id }]);

    let line = Element::Line(Shape {
        start: p(0.0, 0.0),
        end: p(5.0, 5.0),
        stroke: "#000000".to_string(),
        fill: None,
        size: 1.0,
    });
    client.process(
        Instant::now(),
        BoardEvent::Inbound(ServerMessage::Snapshot {
            canvas_id,
            elements: vec![line.clone()],
        }),
    );
    assert_eq!(client.board().elements(), &[line]);
    assert_eq!(client.board().history().len(), 2);
}

#[test]
fn test_live_updates_are_throttled_and_commit_always_sends() {
    let (mut client, _) = joined_client();
    let t0 = Instant::now();

    client.process(t0, input(InputEvent::SelectTool(Tool::Brush)));
    client.process(t0, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(t0, input(InputEvent::PointerMove(p(1.0, 1.0))));
    client.process(t0 + Duration::from_millis(10), input(InputEvent::PointerMove(p(2.0, 2.0))));
    client.process(t0 + Duration::from_millis(20), input(InputEvent::PointerMove(p(3.0, 3.0))));

    // Leading update only; the rest is parked
    assert_eq!(mutations(&client), vec![(1, MutationKind::Draw)]);
    assert_eq!(client.next_deadline(), Some(t0 + EMIT_INTERVAL));

    client.process(t0 + Duration::from_millis(30), input(InputEvent::PointerUp));
    assert_eq!(
        mutations(&client),
        vec![(1, MutationKind::Draw), (1, MutationKind::Draw)]
    );

    // The commit superseded the parked update
    assert_eq!(client.next_deadline(), None);
    client.process(t0 + EMIT_INTERVAL, BoardEvent::Tick);
    assert_eq!(mutations(&client).len(), 2);
}

#[test]
fn test_trailing_update_sends_latest_state() {
    let (mut client, _) = joined_client();
    let t0 = Instant::now();

    client.process(t0, input(InputEvent::SelectTool(Tool::Line)));
    client.process(t0, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(t0, input(InputEvent::PointerMove(p(1.0, 1.0))));
    client.process(t0 + Duration::from_millis(10), input(InputEvent::PointerMove(p(9.0, 9.0))));
    client.process(t0 + EMIT_INTERVAL, BoardEvent::Tick);

    let last = client.transport().last().cloned();
    match last {
        Some(ClientMessage::Mutate { elements, kind, .. }) => {
            assert_eq!(kind, MutationKind::Draw);
            assert_eq!(elements[0].as_shape().unwrap().end, p(9.0, 9.0));
        }
        other => unreachable!("Expected mutate, got {:?}", other),
    }
}

#[test]
fn test_kinds_are_throttled_independently() {
    let (mut client, _) = joined_client();
    let t0 = Instant::now();

    client.process(t0, input(InputEvent::SelectTool(Tool::Rectangle)));
    client.process(t0, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(t0, input(InputEvent::PointerMove(p(100.0, 100.0))));
    client.process(t0, input(InputEvent::PointerUp));

    client.process(t0, input(InputEvent::SelectTool(Tool::Eraser)));
    client.process(t0, input(InputEvent::PointerDown(p(100.0, 50.0))));
    client.process(t0 + Duration::from_millis(1), input(InputEvent::PointerMove(p(100.0, 50.0))));

    assert_eq!(
        mutations(&client),
        vec![
            (1, MutationKind::Draw),
            (1, MutationKind::Draw),
            (0, MutationKind::Erase),
        ]
    );
}

#[test]
fn test_text_commit_emits_draw() {
    let (mut client, _) = joined_client();
    let now = Instant::now();

    client.process(now, input(InputEvent::SelectTool(Tool::Text)));
    client.process(now, input(InputEvent::PointerDown(p(10.0, 10.0))));
    assert!(mutations(&client).is_empty());

    client.process(now, input(InputEvent::TextCommitted("hi".to_string())));
    assert_eq!(mutations(&client), vec![(1, MutationKind::Draw)]);
}

#[test]
fn test_undo_redo_emit_current_state() {
    let (mut client, _) = joined_client();
    let now = Instant::now();

    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));
    client.transport_mut().clear();

    client.process(now, input(InputEvent::Undo));
    client.process(now, input(InputEvent::Redo));
    client.process(now, input(InputEvent::Redo));
    assert_eq!(
        mutations(&client),
        vec![(0, MutationKind::Draw), (1, MutationKind::Draw)]
    );
}

#[test]
fn test_peer_mutation_interrupts_local_draw() {
    let (mut client, canvas_id) = joined_client();
    let t0 = Instant::now();

    client.process(t0, input(InputEvent::SelectTool(Tool::Rectangle)));
    client.process(t0, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(t0, input(InputEvent::PointerMove(p(10.0, 10.0))));
    client.process(t0 + Duration::from_millis(5), input(InputEvent::PointerMove(p(20.0, 20.0))));

    client.enqueue(BoardEvent::Inbound(ServerMessage::PeerMutate {
        canvas_id,
        elements: vec![],
        kind: MutationKind::Erase,
    }));
    client.enqueue(input(InputEvent::PointerMove(p(30.0, 30.0))));
    client.enqueue(input(InputEvent::PointerUp));
    client.drain(t0 + Duration::from_millis(10));

    assert!(client.board().elements().is_empty());
    assert_eq!(client.board().mode(), crate::board::Mode::Idle);

    // Only the leading live update went out; the parked one was dropped
    client.process(t0 + EMIT_INTERVAL, BoardEvent::Tick);
    assert_eq!(mutations(&client), vec![(1, MutationKind::Draw)]);
}

#[test]
fn test_messages_for_other_canvases_are_ignored() {
    let (mut client, _) = joined_client();
    client.process(
        Instant::now(),
        BoardEvent::Inbound(ServerMessage::NameChanged {
            canvas_id: Uuid::new_v4(),
            name: "Elsewhere".to_string(),
        }),
    );
    assert_eq!(client.name(), None);
    assert_eq!(client.board().history().len(), 2);
}

#[test]
fn test_name_change_and_error() {
    let (mut client, canvas_id) = joined_client();
    let now = Instant::now();
    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::NameChanged {
            canvas_id,
            name: "Plans".to_string(),
        }),
    );
    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::error("invalid_message", "bad frame")),
    );
    assert_eq!(client.name(), Some("Plans"));
    assert_eq!(client.last_error(), Some("invalid_message"));
}

#[test]
fn test_unauthorized_blocks_input() {
    let canvas_id = Uuid::new_v4();
    let mut client = BoardClient::new(Vec::new());
    client.open(canvas_id);
    let now = Instant::now();

    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::unauthorized(
            canvas_id,
            UnauthorizedReason::NotAuthorized,
        )),
    );
    assert!(!client.is_authorized());
    assert_eq!(
        client.unauthorized_reason(),
        Some(UnauthorizedReason::NotAuthorized)
    );

    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));
    assert!(client.board().elements().is_empty());
    assert!(mutations(&client).is_empty());
}

#[test]
fn test_refusal_for_previous_canvas_is_ignored() {
    let (mut client, first) = joined_client();
    let second = Uuid::new_v4();
    let now = Instant::now();

    client.open(second);
    // Late reply to a join the client already left
    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::unauthorized(
            first,
            UnauthorizedReason::NotAuthorized,
        )),
    );
    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::Snapshot {
            canvas_id: second,
            elements: vec![],
        }),
    );
    assert!(client.is_authorized());
    assert_eq!(client.unauthorized_reason(), None);

    client.transport_mut().clear();
    client.process(now, input(InputEvent::SelectTool(Tool::Brush)));
    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));
    assert_eq!(mutations(&client), vec![(1, MutationKind::Draw)]);
}

#[test]
fn test_canvas_deleted_clears_board() {
    let (mut client, canvas_id) = joined_client();
    let now = Instant::now();
    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));

    client.process(now, BoardEvent::Inbound(ServerMessage::CanvasDeleted { canvas_id }));
    assert_eq!(client.canvas_id(), None);
    assert!(client.board().elements().is_empty());

    // Nothing to leave and nowhere to send
    client.transport_mut().clear();
    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));
    client.teardown();
    assert!(client.transport().is_empty());
}

#[test]
fn test_switching_canvas_leaves_previous() {
    let (mut client, first) = joined_client();
    let second = Uuid::new_v4();

    client.open(second);
    client.open(second);
    assert_eq!(
        client.transport(),
        &vec![
            ClientMessage::Leave { canvas_id: first },
            ClientMessage::Join { canvas_id: second },
        ]
    );
    assert_eq!(client.board().history().len(), 1);
}

#[test]
fn test_teardown_leaves_then_stops_listening() {
    let canvas_id = Uuid::new_v4();
    let mut transport = MockTransport::new();
    let mut seq = Sequence::new();
    transport
        .expect_send()
        .with(eq(ClientMessage::Join { canvas_id }))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_send()
        .with(eq(ClientMessage::Leave { canvas_id }))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let mut client = BoardClient::new(transport);
    client.open(canvas_id);
    client.enqueue(BoardEvent::Inbound(ServerMessage::Snapshot {
        canvas_id,
        elements: vec![],
    }));
    client.teardown();
    assert!(!client.is_listening());

    // Queued and late messages are discarded; no further sends happen
    let now = Instant::now();
    client.drain(now);
    client.process(
        now,
        BoardEvent::Inbound(ServerMessage::PeerMutate {
            canvas_id,
            elements: vec![],
            kind: MutationKind::Draw,
        }),
    );
    client.process(now, input(InputEvent::PointerDown(p(0.0, 0.0))));
    client.process(now, input(InputEvent::PointerUp));
    assert_eq!(client.board().history().len(), 1);
}
