use lifeos_core::{
    AiLabel, ConversionError, ConversionKind, ConversionOutcome, ConversionPayload,
    ConversionTarget, InFlightConversions, InboxItem, InboxItemId, InboxItemType,
    InboxRepository, InboxService, InboxTab, KeywordLabelSuggester, MemoryInboxRepository,
    NewInboxItem, RepoError, RepoResult, TabCounts, TargetError, TargetKind, TargetRef,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct RecordingTarget {
    created: RefCell<Vec<ConversionPayload>>,
    fail: Cell<bool>,
}

impl ConversionTarget for RecordingTarget {
    fn create(&self, payload: &ConversionPayload) -> Result<TargetRef, TargetError> {
        if self.fail.get() {
            return Err(TargetError::Unavailable("backend offline".to_string()));
        }
        self.created.borrow_mut().push(payload.clone());
        Ok(TargetRef {
            kind: payload.kind,
            id: format!("remote-{}", self.created.borrow().len()),
        })
    }
}

/// Target handle shared between services built over the same store.
struct SharedTarget(Rc<RecordingTarget>);

impl ConversionTarget for SharedTarget {
    fn create(&self, payload: &ConversionPayload) -> Result<TargetRef, TargetError> {
        self.0.create(payload)
    }
}

/// Store wrapper that runs `after_read` once, right after the first `get_item`.
struct SteppedRepo {
    inner: Rc<MemoryInboxRepository>,
    after_read: RefCell<Option<Box<dyn FnOnce()>>>,
    fail_remove: Cell<bool>,
}

impl SteppedRepo {
    fn new(inner: Rc<MemoryInboxRepository>) -> Self {
        Self {
            inner,
            after_read: RefCell::new(None),
            fail_remove: Cell::new(false),
        }
    }
}

impl InboxRepository for SteppedRepo {
    fn add_item(&self, item: NewInboxItem) -> RepoResult<InboxItemId> {
        self.inner.add_item(item)
    }

    fn remove_item(&self, id: InboxItemId) -> RepoResult<bool> {
        if self.fail_remove.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.inner.remove_item(id)
    }

    fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>> {
        let item = self.inner.get_item(id);
        let hook = self.after_read.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
        item
    }

    fn list_items(&self) -> RepoResult<Vec<InboxItem>> {
        self.inner.list_items()
    }

    fn len(&self) -> RepoResult<usize> {
        self.inner.len()
    }
}

fn service() -> InboxService<MemoryInboxRepository, RecordingTarget> {
    InboxService::new(MemoryInboxRepository::new(), RecordingTarget::default())
}

#[test]
fn list_is_newest_first_and_tracks_adds_minus_removals() {
    let inbox = service();
    let ids: Vec<_> = (0..5)
        .map(|index| {
            inbox
                .add_item(NewInboxItem::note(format!("note {index}")))
                .expect("capture note")
        })
        .collect();

    inbox.remove_item(ids[1]).expect("remove second");
    inbox.remove_item(ids[3]).expect("remove fourth");
    inbox.remove_item(ids[3]).expect("repeat remove is a no-op");

    let listed: Vec<_> = inbox
        .list_items(InboxTab::All)
        .expect("list all")
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(listed, vec![ids[4], ids[2], ids[0]]);
}

#[test]
fn blank_and_refund_captures_are_always_stored() {
    let inbox = service();
    let silent = inbox
        .add_item(NewInboxItem::voice("", 12))
        .expect("untranscribed voice should be stored");
    let blank = inbox
        .add_item(NewInboxItem::note("   "))
        .expect("blank note should be stored");
    let refund = inbox
        .add_item(
            NewInboxItem::imported_email("store@shop.io", "Refund", "credited").with_amount(-5.0),
        )
        .expect("refund should be stored");

    let listed: Vec<_> = inbox
        .list_items(InboxTab::All)
        .expect("list all")
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(listed, vec![refund, blank, silent]);

    let voice = inbox.list_items(InboxTab::Voice).expect("list voice");
    assert_eq!(voice.len(), 1);
    assert_eq!(voice[0].id, silent);
}

#[test]
fn tabs_filter_by_item_type() {
    let inbox = service();
    inbox
        .add_item(NewInboxItem::voice("call mom", 8))
        .expect("capture voice");
    let note_a = inbox
        .add_item(NewInboxItem::note("buy milk"))
        .expect("capture note");
    inbox
        .add_item(NewInboxItem::imported_email("a@b.c", "Lunch?", "Friday works"))
        .expect("import email");
    let note_b = inbox
        .add_item(NewInboxItem::note("read book"))
        .expect("capture note");

    let notes: Vec<_> = inbox
        .list_items(InboxTab::Notes)
        .expect("list notes")
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(notes, vec![note_b, note_a]);

    let voice = inbox.list_items(InboxTab::Voice).expect("list voice");
    assert_eq!(voice.len(), 1);
    assert_eq!(voice[0].kind, InboxItemType::Voice);

    assert_eq!(
        inbox.tab_counts().expect("tab counts"),
        TabCounts {
            all: 4,
            voice: 1,
            notes: 2
        }
    );
}

#[test]
fn voice_item_converts_to_task_and_leaves_inbox_empty() {
    let inbox = service();
    let id = inbox
        .add_item(NewInboxItem::voice("call mom", 5))
        .expect("capture voice");
    let item = inbox
        .get_item(id)
        .expect("get item")
        .expect("captured item should exist");

    let labels: Vec<_> = inbox.actions_for(&item).iter().map(|a| a.label).collect();
    assert_eq!(labels, vec!["To Task", "To Event", "To Habit"]);

    let outcome = inbox
        .convert(id, ConversionKind::ToTask)
        .expect("convert to task");
    assert!(matches!(
        outcome,
        ConversionOutcome::Converted(TargetRef { kind: TargetKind::Task, .. })
    ));
    assert!(inbox.list_items(InboxTab::All).expect("list all").is_empty());

    let created = inbox_target_payloads(&inbox);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "call mom");
    assert_eq!(created[0].source_item_id, id);
}

#[test]
fn convert_removes_only_target_and_second_call_is_noop() {
    let inbox = service();
    let keep = inbox
        .add_item(NewInboxItem::voice("stretch", 3))
        .expect("capture voice");
    let gone = inbox
        .add_item(NewInboxItem::voice("dentist", 4))
        .expect("capture voice");

    inbox
        .convert(gone, ConversionKind::ToEvent)
        .expect("first convert");
    let second = inbox
        .convert(gone, ConversionKind::ToEvent)
        .expect("second convert is a no-op");

    assert_eq!(second, ConversionOutcome::Missing);
    let remaining = inbox.list_items(InboxTab::All).expect("list all");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
    assert_eq!(inbox_target_payloads(&inbox).len(), 1);
}

#[test]
fn keep_as_note_leaves_store_unchanged() {
    let inbox = service();
    let id = inbox
        .add_item(NewInboxItem::note("thought"))
        .expect("capture note");
    inbox
        .add_item(NewInboxItem::voice("memo", 2))
        .expect("capture voice");
    let before = inbox.list_items(InboxTab::All).expect("list before");

    assert_eq!(
        inbox.keep_as_note(id).expect("keep as note"),
        ConversionOutcome::Kept
    );
    assert_eq!(
        inbox
            .convert(id, ConversionKind::KeepAsNote)
            .expect("keep through convert"),
        ConversionOutcome::Kept
    );

    assert_eq!(inbox.list_items(InboxTab::All).expect("list after"), before);
    assert!(inbox_target_payloads(&inbox).is_empty());
}

#[test]
fn failed_target_keeps_item_and_allows_retry() {
    let inbox = service();
    let id = inbox
        .add_item(
            NewInboxItem::imported_email("bills@isp.net", "Internet", "Due now").with_amount(30.0),
        )
        .expect("import bill email");

    inbox.target().fail.set(true);
    let err = inbox
        .convert(id, ConversionKind::ToBill)
        .expect_err("offline target must fail");
    assert!(matches!(err, ConversionError::Target(TargetError::Unavailable(_))));
    assert!(inbox.get_item(id).expect("get after failure").is_some());
    assert!(!inbox.is_converting(id));

    inbox.target().fail.set(false);
    inbox
        .convert(id, ConversionKind::ToBill)
        .expect("retry succeeds");
    assert!(inbox.get_item(id).expect("get after retry").is_none());
    assert_eq!(inbox_target_payloads(&inbox)[0].amount, Some(30.0));
}

#[test]
fn failed_remove_after_create_reports_target_and_keeps_item() {
    let target = RecordingTarget::default();
    let repo = SteppedRepo::new(Rc::new(MemoryInboxRepository::new()));
    let inbox = InboxService::new(&repo, &target);
    let id = inbox
        .add_item(NewInboxItem::voice("water plants", 3))
        .expect("capture voice");

    repo.fail_remove.set(true);
    let err = inbox
        .convert(id, ConversionKind::ToHabit)
        .expect_err("remove failure must surface");
    let ConversionError::RemoveAfterCreate {
        target: created,
        source,
    } = err
    else {
        panic!("expected remove-after-create error");
    };
    assert_eq!(created.kind, TargetKind::Habit);
    assert_eq!(created.id, "remote-1");
    assert!(source.to_string().contains("disk full"));

    assert!(inbox.get_item(id).expect("get after failure").is_some());
    assert!(!inbox.is_converting(id));
    assert_eq!(target.created.borrow().len(), 1);
}

#[test]
fn unavailable_conversion_is_rejected_without_side_effects() {
    let inbox = service();
    let id = inbox
        .add_item(NewInboxItem::note("daily walk"))
        .expect("capture note");

    let err = inbox
        .convert(id, ConversionKind::ToBill)
        .expect_err("notes do not offer To Bill");
    assert!(matches!(
        err,
        ConversionError::ActionNotAvailable {
            kind: InboxItemType::Note,
            conversion: ConversionKind::ToBill
        }
    ));
    assert!(inbox.get_item(id).expect("get after reject").is_some());
    assert!(!inbox.is_converting(id));
}

#[test]
fn double_submission_is_rejected_while_pending() {
    let inbox = service();
    let id = inbox
        .add_item(NewInboxItem::voice("book flights", 6))
        .expect("capture voice");

    let pending = inbox
        .begin_conversion(id, ConversionKind::ToTask)
        .expect("begin conversion")
        .expect("item exists");
    assert!(inbox.is_converting(id));

    let err = inbox
        .convert(id, ConversionKind::ToTask)
        .expect_err("second submission must be rejected");
    assert!(matches!(err, ConversionError::AlreadyInFlight(claimed) if claimed == id));

    let result = Ok(TargetRef {
        kind: TargetKind::Task,
        id: "remote-async".to_string(),
    });
    let outcome = inbox
        .finish_conversion(pending, result)
        .expect("finish conversion");
    assert!(matches!(outcome, ConversionOutcome::Converted(_)));
    assert!(!inbox.is_converting(id));
    assert!(inbox.get_item(id).expect("get after finish").is_none());
}

#[test]
fn submission_racing_a_finished_conversion_creates_one_object() {
    let store = Rc::new(MemoryInboxRepository::new());
    let target = Rc::new(RecordingTarget::default());
    let shared = InFlightConversions::new();

    let id = store
        .add_item(NewInboxItem::voice("renew passport", 4))
        .expect("capture voice");

    let first = InboxService::new(
        SteppedRepo::new(Rc::clone(&store)),
        SharedTarget(Rc::clone(&target)),
    )
    .with_in_flight(shared.clone());
    let second = InboxService::new(
        SteppedRepo::new(Rc::clone(&store)),
        SharedTarget(Rc::clone(&target)),
    )
    .with_in_flight(shared.clone());

    // The first submission runs to completion while the second sits between
    // reading the item and staging its payload.
    let first_result = Rc::new(RefCell::new(None));
    let first_slot = Rc::clone(&first_result);
    *second.repo().after_read.borrow_mut() = Some(Box::new(move || {
        *first_slot.borrow_mut() = Some(first.convert(id, ConversionKind::ToTask));
    }));

    let second_result = second.convert(id, ConversionKind::ToTask);
    let first_result = first_result
        .borrow_mut()
        .take()
        .expect("first submission ran");

    let converted = [&first_result, &second_result]
        .into_iter()
        .filter(|result| matches!(result, Ok(ConversionOutcome::Converted(_))))
        .count();
    assert_eq!(converted, 1);
    assert_eq!(target.created.borrow().len(), 1);
    assert!(store.get_item(id).expect("get after race").is_none());
    assert!(shared.is_empty());
}

#[test]
fn abandoned_conversion_releases_claim_and_keeps_item() {
    let inbox = service();
    let id = inbox
        .add_item(NewInboxItem::voice("gym", 2))
        .expect("capture voice");

    let pending = inbox
        .begin_conversion(id, ConversionKind::ToHabit)
        .expect("begin conversion");
    drop(pending);

    assert!(!inbox.is_converting(id));
    assert!(inbox.get_item(id).expect("get after drop").is_some());
}

#[test]
fn shared_in_flight_set_spans_service_instances() {
    let shared = InFlightConversions::new();
    let repo = MemoryInboxRepository::new();
    let target = RecordingTarget::default();
    let first = InboxService::new(&repo, &target).with_in_flight(shared.clone());
    let second = InboxService::new(&repo, &target).with_in_flight(shared.clone());

    let id = first
        .add_item(NewInboxItem::voice("renew visa", 9))
        .expect("capture voice");
    let _pending = first
        .begin_conversion(id, ConversionKind::ToTask)
        .expect("begin conversion");

    let err = second
        .convert(id, ConversionKind::ToEvent)
        .expect_err("claim is shared");
    assert!(matches!(err, ConversionError::AlreadyInFlight(_)));
    assert_eq!(shared.len(), 1);
}

#[test]
fn begin_conversion_for_missing_item_returns_none_and_releases_claim() {
    let inbox = service();
    let missing = uuid::Uuid::new_v4();
    let pending = inbox
        .begin_conversion(missing, ConversionKind::ToTask)
        .expect("begin on missing id");
    assert!(pending.is_none());
    assert!(!inbox.is_converting(missing));
    assert!(matches!(
        inbox.begin_conversion(uuid::Uuid::new_v4(), ConversionKind::KeepAsNote),
        Err(ConversionError::NoTarget(ConversionKind::KeepAsNote))
    ));
}

#[test]
fn suggester_labels_only_unlabelled_captures() {
    let inbox = service().with_suggester(KeywordLabelSuggester);
    let bill = inbox
        .add_item(NewInboxItem::note("rent payment due $1200"))
        .expect("capture bill note");
    let preset = inbox
        .add_item(NewInboxItem::note("rent payment due $1200").with_ai_label(AiLabel::Idea))
        .expect("capture labelled note");

    let label_of = |id| {
        inbox
            .get_item(id)
            .expect("get item")
            .expect("item should exist")
            .ai_label
    };
    assert_eq!(label_of(bill), Some(AiLabel::Bill));
    assert_eq!(label_of(preset), Some(AiLabel::Idea));
}

fn inbox_target_payloads(
    inbox: &InboxService<MemoryInboxRepository, RecordingTarget>,
) -> Vec<ConversionPayload> {
    inbox.target().created.borrow().clone()
}
