//! Two or more sessions pairing over an in-process hub.

use std::time::Duration;

use n0_future::StreamExt;
use proptest::prelude::*;
use tandem_common::SyncSettings;
use tandem_common::TransportError;
use tandem_common::transport::{
    Ack, AckMode, Broadcast, Channel, Inbound, LocalChannel, LocalHub, RoomCode, Topic, Transport,
};
use tandem_sync::wire::{CODE_CHANGE, HARD_SYNC, TYPING};
use tandem_sync::{
    Command, Document, DocumentError, MemoryDocument, Operation, OperationBatch, Position,
    RecordingPresenter, Session, SyncError, SyncMessage, TextRange, TypingPayload,
};
use tokio::time::{Instant, advance, timeout};

type LocalSession = Session<LocalChannel, MemoryDocument, RecordingPresenter>;

fn room() -> RoomCode {
    RoomCode::parse("482913").unwrap()
}

fn settings(name: &str) -> SyncSettings {
    SyncSettings {
        username: name.into(),
        ..SyncSettings::default()
    }
}

async fn join(hub: &LocalHub, name: &str, doc: MemoryDocument) -> (LocalSession, Inbound) {
    join_with(hub, settings(name), doc, RecordingPresenter::new()).await
}

async fn join_with(
    hub: &LocalHub,
    settings: SyncSettings,
    doc: MemoryDocument,
    presenter: RecordingPresenter,
) -> (LocalSession, Inbound) {
    Session::join(hub, room(), settings, doc, presenter)
        .await
        .unwrap()
}

async fn next_frame(inbound: &mut Inbound) -> Broadcast {
    timeout(Duration::from_secs(5), inbound.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("inbound stream ended")
}

async fn assert_silent(inbound: &mut Inbound) {
    let got = timeout(Duration::from_millis(50), inbound.next()).await;
    assert!(got.is_err(), "expected no frame, got {:?}", got);
}

/// Receive and handle frames until `count` have been processed.
async fn deliver(session: &mut LocalSession, inbound: &mut Inbound, count: usize) -> Vec<Broadcast> {
    let mut seen = Vec::new();
    for _ in 0..count {
        let frame = next_frame(inbound).await;
        session.handle_broadcast(frame.clone()).await.unwrap();
        seen.push(frame);
    }
    seen
}

fn events(frames: &[Broadcast]) -> Vec<&str> {
    frames.iter().map(|f| f.event.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_insert_reaches_peer_without_echo() {
    let hub = LocalHub::new();
    let (mut a, mut a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    a.edit(TextRange::at(Position::new(0, 0)), "foo")
        .await
        .unwrap();
    advance(Duration::from_millis(300)).await;
    a.poll_timers(Instant::now()).await.unwrap();

    let frames = deliver(&mut b, &mut b_in, 3).await;
    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE, TYPING]);
    assert_eq!(b.document().text(), "foo");

    // Nothing captured, nothing sent back
    assert_eq!(b.pump_local_changes().await.unwrap(), 0);
    assert_eq!(b.pending_ops(), 0);
    advance(Duration::from_secs(1)).await;
    b.poll_timers(Instant::now()).await.unwrap();
    assert_silent(&mut a_in).await;
}

#[tokio::test(start_paused = true)]
async fn test_hard_sync_overwrites_peer() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::from_text("hello\nworld")).await;
    let (mut b, mut b_in) = join(
        &hub,
        "bob",
        MemoryDocument::from_text("completely\ndifferent\ncontent\n"),
    )
    .await;

    a.hard_sync().await.unwrap();
    let frame = next_frame(&mut b_in).await;
    assert_eq!(frame.event, HARD_SYNC);

    b.handle_broadcast(frame.clone()).await.unwrap();
    assert_eq!(b.document().text(), "hello\nworld");

    // Applying the same payload again changes nothing
    b.handle_broadcast(frame).await.unwrap();
    assert_eq!(b.document().text(), "hello\nworld");
}

#[tokio::test(start_paused = true)]
async fn test_hard_sync_discards_pending_ops() {
    let hub = LocalHub::new();
    let (mut a, mut a_in) = join(&hub, "alice", MemoryDocument::from_text("base")).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    // B has an unsent local edit when A's hard sync lands
    b.edit(TextRange::at(Position::new(0, 0)), "stale ")
        .await
        .unwrap();
    assert_eq!(b.pending_ops(), 1);
    next_frame(&mut a_in).await; // typing=true from B

    a.hard_sync().await.unwrap();
    deliver(&mut b, &mut b_in, 1).await;
    assert_eq!(b.document().text(), "base");
    assert_eq!(b.pending_ops(), 0);

    // The quiet flush only ends B's typing run
    advance(Duration::from_millis(300)).await;
    b.poll_timers(Instant::now()).await.unwrap();
    let frame = next_frame(&mut a_in).await;
    assert_eq!(frame.event, TYPING);
    assert_silent(&mut a_in).await;
}

async fn typing_frame(raw: &LocalChannel, author: &str, is_typing: bool) {
    let frame = SyncMessage::typing(author, is_typing)
        .to_broadcast(&format!("{author}-0001"))
        .unwrap();
    raw.publish(frame).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_typing_lock_restores_prior_read_only() {
    for initially_read_only in [true, false] {
        let hub = LocalHub::new();
        let presenter = RecordingPresenter {
            read_only: initially_read_only,
            ..RecordingPresenter::default()
        };
        let (mut b, mut b_in) =
            join_with(&hub, settings("bob"), MemoryDocument::new(), presenter).await;
        let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();

        typing_frame(&raw, "alice", true).await;
        deliver(&mut b, &mut b_in, 1).await;
        assert!(b.presenter().read_only);
        assert_eq!(b.presenter().typing_indicator.as_deref(), Some("alice"));

        typing_frame(&raw, "alice", false).await;
        deliver(&mut b, &mut b_in, 1).await;
        // Still inside the grace delay
        assert!(b.presenter().read_only);
        assert!(b.typing().is_remote_typing());

        advance(settings("bob").typing_grace).await;
        b.poll_timers(Instant::now()).await.unwrap();

        assert_eq!(b.presenter().read_only, initially_read_only);
        assert_eq!(b.presenter().typing_indicator, None);
        assert!(!b.typing().is_remote_typing());
    }
}

#[tokio::test(start_paused = true)]
async fn test_local_edit_refused_while_locked_but_remote_applies() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    a.edit(TextRange::at(Position::ZERO), "abc").await.unwrap();
    deliver(&mut b, &mut b_in, 1).await; // typing=true

    let err = b
        .edit(TextRange::at(Position::ZERO), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Document(DocumentError::ReadOnly)));

    // The lock is advisory for remote apply
    advance(Duration::from_millis(300)).await;
    a.poll_timers(Instant::now()).await.unwrap();
    deliver(&mut b, &mut b_in, 1).await;
    assert_eq!(b.document().text(), "abc");
}

#[tokio::test(start_paused = true)]
async fn test_lock_held_across_multiple_typists() {
    let hub = LocalHub::new();
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;
    let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();

    typing_frame(&raw, "alice", true).await;
    typing_frame(&raw, "carol", true).await;
    typing_frame(&raw, "alice", false).await;
    deliver(&mut b, &mut b_in, 3).await;

    advance(Duration::from_secs(1)).await;
    b.poll_timers(Instant::now()).await.unwrap();
    assert!(b.presenter().read_only);
    assert_eq!(b.presenter().typing_indicator.as_deref(), Some("carol"));
    assert_eq!(b.typing().typists().count(), 1);

    typing_frame(&raw, "carol", false).await;
    deliver(&mut b, &mut b_in, 1).await;
    advance(Duration::from_secs(1)).await;
    b.poll_timers(Instant::now()).await.unwrap();
    assert!(!b.presenter().read_only);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_edits() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    for (i, word) in ["one", " two", " three", " four"].into_iter().enumerate() {
        let at = a.document().end_position();
        a.edit(TextRange::at(at), word).await.unwrap();
        if i < 3 {
            advance(Duration::from_millis(100)).await;
            a.poll_timers(Instant::now()).await.unwrap();
        }
    }
    assert_eq!(a.pending_ops(), 4);

    advance(Duration::from_millis(300)).await;
    a.poll_timers(Instant::now()).await.unwrap();

    let frames = deliver(&mut b, &mut b_in, 3).await;
    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE, TYPING]);

    let batch: OperationBatch = serde_json::from_value(frames[1].payload.clone()).unwrap();
    let texts: Vec<_> = batch.iter().map(|op| op.text.as_str()).collect();
    assert_eq!(texts, vec!["one", " two", " three", " four"]);
    assert_eq!(b.document().text(), "one two three four");
    assert_silent(&mut b_in).await;
}

#[tokio::test(start_paused = true)]
async fn test_max_wait_flushes_continuous_typing() {
    let hub = LocalHub::new();
    let mut fast = settings("alice");
    fast.max_wait = Some(Duration::from_secs(1));
    let (mut a, _a_in) = join_with(&hub, fast, MemoryDocument::new(), RecordingPresenter::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    for _ in 0..6 {
        let at = a.document().end_position();
        a.edit(TextRange::at(at), "x").await.unwrap();
        advance(Duration::from_millis(200)).await;
        a.poll_timers(Instant::now()).await.unwrap();
    }

    // typing=true, then a forced batch while still typing
    let frames = deliver(&mut b, &mut b_in, 2).await;
    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE]);
    assert!(b.typing().is_remote_typing());
    assert!(a.typing().is_local_typing());

    advance(Duration::from_millis(300)).await;
    a.poll_timers(Instant::now()).await.unwrap();
    let frames = deliver(&mut b, &mut b_in, 2).await;
    assert_eq!(events(&frames), vec![CODE_CHANGE, TYPING]);
    assert_eq!(b.document().text(), "xxxxxx");
}

#[tokio::test(start_paused = true)]
async fn test_malformed_batch_rejected_whole() {
    let hub = LocalHub::new();
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::from_text("keep")).await;
    let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();

    let payload = serde_json::json!([
        { "start": { "line": 0, "character": 0 }, "end": { "line": 0, "character": 0 }, "text": "A" },
        { "start": { "line": 0, "character": 3 }, "end": { "line": 0, "character": 1 }, "text": "" }
    ]);
    raw.publish(Broadcast::new(CODE_CHANGE, "mallory-0001", payload))
        .await
        .unwrap();

    let frame = next_frame(&mut b_in).await;
    let err = b.handle_broadcast(frame).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(b.document().text(), "keep");
    assert!(!b.guard().is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn test_legacy_frames_accepted() {
    let hub = LocalHub::new();
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;
    let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();

    // Unversioned frame, single-object code_change, minimal typing payload
    raw.publish(Broadcast {
        version: 0,
        event: CODE_CHANGE.into(),
        from: "old-peer".into(),
        payload: serde_json::json!({
            "start": { "line": 0, "character": 0 },
            "end": { "line": 0, "character": 0 },
            "text": "legacy"
        }),
    })
    .await
    .unwrap();
    raw.publish(Broadcast {
        version: 0,
        event: TYPING.into(),
        from: "old-peer".into(),
        payload: serde_json::json!({ "typing": true }),
    })
    .await
    .unwrap();

    deliver(&mut b, &mut b_in, 2).await;
    assert_eq!(b.document().text(), "legacy");
    let typist = b.typing().typists().next().unwrap();
    assert_eq!(typist.author, "old-peer");
}

#[tokio::test(start_paused = true)]
async fn test_own_frames_ignored() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::from_text("mine")).await;

    let echo = SyncMessage::CodeChange(vec![Operation::insert(Position::ZERO, "echo ")].into())
        .to_broadcast(a.author())
        .unwrap();
    a.handle_broadcast(echo).await.unwrap();
    assert_eq!(a.document().text(), "mine");
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_edit_and_leave() {
    let hub = LocalHub::new();
    let (mut a, a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    let driver = async {
        tx.send(Command::Edit {
            range: TextRange::at(Position::ZERO),
            text: "hi".into(),
        })
        .await
        .unwrap();
        // Timers fire inside the loop; paused time advances on its own
        let frames = deliver(&mut b, &mut b_in, 3).await;
        tx.send(Command::Leave).await.unwrap();
        frames
    };

    let (result, frames) = tokio::join!(a.run(a_in, rx), driver);
    result.unwrap();

    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE, TYPING]);
    assert_eq!(b.document().text(), "hi");
    assert_eq!(a.state(), &tandem_sync::SessionState::Closed);
    assert_eq!(hub.subscriber_count(&room().topic()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_answers_queries() {
    let hub = LocalHub::new();
    let (mut a, a_in) = join(&hub, "alice", MemoryDocument::from_text("first")).await;
    let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    let driver = async {
        typing_frame(&raw, "carol", false).await;
        typing_frame(&raw, "bob", true).await;
        tx.send(Command::AppendLine("second".into())).await.unwrap();

        let (reply, text) = tokio::sync::oneshot::channel();
        tx.send(Command::Snapshot(reply)).await.unwrap();
        let text = text.await.unwrap();

        let (reply, who) = tokio::sync::oneshot::channel();
        tx.send(Command::Collaborators(reply)).await.unwrap();
        let who = who.await.unwrap();

        tx.send(Command::Leave).await.unwrap();
        (text, who)
    };

    let (result, (text, who)) = tokio::join!(a.run(a_in, rx), driver);
    result.unwrap();

    // Bob's typing lock refuses the append, so the buffer is unchanged
    assert_eq!(text, "first");
    let notice = a.presenter().last_notice().unwrap();
    assert_eq!(notice.level, tandem_sync::NoticeLevel::Warn);
    assert!(notice.message.contains("locked"), "{}", notice.message);
    let names: Vec<_> = who.iter().map(|c| c.author.as_str()).collect();
    assert_eq!(names, vec!["bob-0001"]);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_append_line() {
    let hub = LocalHub::new();
    let (mut a, a_in) = join(&hub, "alice", MemoryDocument::from_text("first")).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::from_text("first")).await;
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    let driver = async {
        tx.send(Command::AppendLine("second".into())).await.unwrap();
        let frames = deliver(&mut b, &mut b_in, 3).await;
        tx.send(Command::Leave).await.unwrap();
        frames
    };

    let (result, frames) = tokio::join!(a.run(a_in, rx), driver);
    result.unwrap();

    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE, TYPING]);
    assert_eq!(a.document().text(), "first\nsecond\n");
    assert_eq!(b.document().text(), "first\nsecond\n");
}

#[tokio::test(start_paused = true)]
async fn test_edit_while_peer_types_not_announced() {
    let hub = LocalHub::new();
    let mut relaxed = settings("bob");
    relaxed.soft_lock = false;
    let (mut b, mut b_in) =
        join_with(&hub, relaxed, MemoryDocument::new(), RecordingPresenter::new()).await;
    let mut raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();
    let mut raw_in = raw.subscribe().unwrap();

    typing_frame(&raw, "alice", true).await;
    deliver(&mut b, &mut b_in, 1).await;

    b.edit(TextRange::at(Position::ZERO), "x").await.unwrap();
    advance(Duration::from_millis(300)).await;
    b.poll_timers(Instant::now()).await.unwrap();

    // The batch goes out, but no typing=true or typing=false around it
    let frame = next_frame(&mut raw_in).await;
    assert_eq!(frame.event, CODE_CHANGE);
    assert_silent(&mut raw_in).await;
}

#[tokio::test(start_paused = true)]
async fn test_leave_flushes_pending() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    a.edit(TextRange::at(Position::ZERO), "bye").await.unwrap();
    a.leave().await;

    let frames = deliver(&mut b, &mut b_in, 3).await;
    assert_eq!(events(&frames), vec![TYPING, CODE_CHANGE, TYPING]);
    assert_eq!(b.document().text(), "bye");
    // Alice's typing=false is still inside the grace delay
    assert!(b.typing().is_remote_typing());
}

/// Transport whose publishes always fail.
struct DeadLink;

struct DeadChannel {
    topic: Topic,
}

impl Transport for DeadLink {
    type Channel = DeadChannel;

    async fn open(&self, topic: &Topic, _ack: AckMode) -> Result<DeadChannel, TransportError> {
        Ok(DeadChannel {
            topic: topic.clone(),
        })
    }
}

impl Channel for DeadChannel {
    fn topic(&self) -> &Topic {
        &self.topic
    }

    fn subscribe(&mut self) -> Result<Inbound, TransportError> {
        Ok(Box::pin(n0_future::stream::empty()))
    }

    async fn publish(&self, frame: Broadcast) -> Result<Ack, TransportError> {
        Err(TransportError::Publish {
            event: frame.event.to_string(),
            source: Box::new(std::io::Error::other("link down")),
        })
    }

    async fn close(&mut self) {}
}

#[tokio::test(start_paused = true)]
async fn test_publish_failure_surfaced_not_retried() {
    let (mut a, _a_in) = Session::join(
        &DeadLink,
        room(),
        settings("alice"),
        MemoryDocument::new(),
        RecordingPresenter::new(),
    )
    .await
    .unwrap();

    // typing=true fails to send; the edit itself stands
    let err = a
        .edit(TextRange::at(Position::ZERO), "local")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Transport(TransportError::Publish { .. })));
    assert_eq!(a.document().text(), "local");
    assert_eq!(a.presenter().errors().count(), 1);

    advance(Duration::from_millis(300)).await;
    assert!(a.poll_timers(Instant::now()).await.is_err());
    // One failure per publish attempt, no retries in between
    assert_eq!(a.presenter().errors().count(), 2);
    assert_eq!(a.pending_ops(), 0);
}

#[tokio::test]
async fn test_join_failure_reported() {
    struct Refusing;
    impl Transport for Refusing {
        type Channel = DeadChannel;
        async fn open(&self, topic: &Topic, _ack: AckMode) -> Result<DeadChannel, TransportError> {
            Err(TransportError::Subscribe {
                topic: topic.to_string(),
                source: Box::new(std::io::Error::other("no route")),
            })
        }
    }

    let result = Session::join(
        &Refusing,
        room(),
        settings("alice"),
        MemoryDocument::new(),
        RecordingPresenter::new(),
    )
    .await;
    assert!(matches!(result, Err(SyncError::Transport(_))));
}

fn typing_payload_is_attributed(frame: &Broadcast) -> bool {
    serde_json::from_value::<TypingPayload>(frame.payload.clone())
        .map(|p| p.username.is_some())
        .unwrap_or(false)
}

#[tokio::test(start_paused = true)]
async fn test_typing_frames_carry_username() {
    let hub = LocalHub::new();
    let (mut a, _a_in) = join(&hub, "alice", MemoryDocument::new()).await;
    let (_b, mut b_in) = join(&hub, "bob", MemoryDocument::new()).await;

    a.edit(TextRange::at(Position::ZERO), "x").await.unwrap();
    let frame = next_frame(&mut b_in).await;
    assert_eq!(frame.event, TYPING);
    assert!(typing_payload_is_attributed(&frame));
    assert!(frame.from.starts_with("alice-"));
}

/// One edit expressed as offsets, resolved against the buffer at apply time.
#[derive(Debug, Clone)]
struct RawEdit {
    at: usize,
    remove: usize,
    text: String,
}

fn raw_edit() -> impl Strategy<Value = RawEdit> {
    (0usize..64, 0usize..6, "[a-z \n]{0,6}").prop_map(|(at, remove, text)| RawEdit {
        at,
        remove,
        text,
    })
}

fn record_edits(initial: &str, edits: &[RawEdit]) -> (String, OperationBatch) {
    let guard = tandem_sync::LoopbackGuard::new();
    let (observer, mut changes) = tandem_sync::ChangeObserver::new(guard);
    let mut doc = MemoryDocument::from_text(initial);
    doc.attach(observer);

    for edit in edits {
        let len = doc.len_chars();
        let start = edit.at.min(len);
        let end = (start + edit.remove).min(len);
        let range = TextRange::new(doc.position_at(start), doc.position_at(end));
        doc.edit(range, &edit.text).unwrap();
    }

    let mut batch = OperationBatch::new();
    while let Ok(change) = changes.try_recv() {
        batch.push(tandem_sync::encode(&change).unwrap());
    }
    (doc.text(), batch)
}

proptest! {
    #[test]
    fn prop_batch_roundtrip_reproduces_sender(
        initial in "[a-z \n]{0,40}",
        edits in prop::collection::vec(raw_edit(), 1..12),
    ) {
        let (sender_text, batch) = record_edits(&initial, &edits);
        prop_assert_eq!(batch.len(), edits.len());

        // Through the wire and back
        let bytes = SyncMessage::CodeChange(batch).to_broadcast("alice-0001").unwrap().to_bytes().unwrap();
        let frame = Broadcast::from_bytes(&bytes).unwrap();
        let Some(SyncMessage::CodeChange(received)) = SyncMessage::from_broadcast(&frame).unwrap() else {
            panic!("expected a code_change");
        };

        prop_assert_eq!(received.apply_to_text(&initial), sender_text);
    }

    #[test]
    fn prop_insertion_only_adds_text(
        initial in "[a-z\n]{0,30}",
        at in 0usize..40,
        text in "[A-Z]{1,5}",
    ) {
        let doc = MemoryDocument::from_text(&initial);
        let offset = at.min(doc.len_chars());
        let op = Operation::insert(doc.position_at(offset), text.clone());
        let out = op.apply_to_text(&initial);

        let prefix: String = initial.chars().take(offset).collect();
        let suffix: String = initial.chars().skip(offset).collect();
        prop_assert_eq!(out, format!("{prefix}{text}{suffix}"));
    }

    #[test]
    fn prop_suppressed_apply_never_publishes(
        initial in "[a-z \n]{0,30}",
        edits in prop::collection::vec(raw_edit(), 1..8),
    ) {
        let (_, batch) = record_edits(&initial, &edits);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async {
            let hub = LocalHub::new();
            let (_a, mut a_in) = join(&hub, "alice", MemoryDocument::new()).await;
            let (mut b, mut b_in) = join(&hub, "bob", MemoryDocument::from_text(&initial)).await;
            let raw = hub.open(&room().topic(), AckMode::Confirmed).await.unwrap();

            raw.publish(SyncMessage::CodeChange(batch).to_broadcast("carol-0001").unwrap()).await.unwrap();
            raw.publish(SyncMessage::HardSync(tandem_sync::HardSyncPayload { content: "reset".into() })
                .to_broadcast("carol-0001").unwrap()).await.unwrap();
            deliver(&mut b, &mut b_in, 2).await;

            // A sees carol's two frames, nothing else
            next_frame(&mut a_in).await;
            next_frame(&mut a_in).await;

            assert_eq!(b.pump_local_changes().await.unwrap(), 0);
            advance(Duration::from_secs(5)).await;
            b.poll_timers(Instant::now()).await.unwrap();
            // A hears nothing from B: no code_change, no typing
            assert_silent(&mut a_in).await;
        });
    }
}
