//! Shared fixtures: a small in-memory conversation store, its aspect map, the
//! active conversation list query and recording observers.

#![allow(dead_code)]

use ripple_reactive::{
    AspectMap, ChangeInfo, EntityKind, EntityObserver, EntityRef, EvalError, RelationSpec,
    ViewDiff, ViewKey, ViewObserver, ViewQuery,
};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

pub const CONVERSATION: EntityKind = EntityKind::new("conversation");
pub const USER: EntityKind = EntityKind::new("user");
pub const MESSAGE: EntityKind = EntityKind::new("message");

pub fn conv(id: u64) -> EntityRef {
    EntityRef::new(CONVERSATION, id)
}

pub fn user(id: u64) -> EntityRef {
    EntityRef::new(USER, id)
}

pub fn message(id: u64) -> EntityRef {
    EntityRef::new(MESSAGE, id)
}

#[derive(Clone, Debug, Default)]
pub struct Conversation {
    pub last_modified: i64,
    pub archived: bool,
    pub unread: u32,
}

/// Committed state the queries evaluate against.
#[derive(Debug, Default)]
pub struct Store {
    pub conversations: BTreeMap<EntityRef, Conversation>,
}

pub type SharedStore = Rc<RefCell<Store>>;

pub fn store_with(conversations: &[(u64, i64, bool)]) -> SharedStore {
    let mut store = Store::default();
    for &(id, last_modified, archived) in conversations {
        store.conversations.insert(
            conv(id),
            Conversation {
                last_modified,
                archived,
                unread: 0,
            },
        );
    }
    Rc::new(RefCell::new(store))
}

/// Conversation aspect table, including the participant relation.
pub fn aspects() -> AspectMap {
    AspectMap::builder()
        .aspects(CONVERSATION, "displayName", ["nameChanged"])
        .aspects(CONVERSATION, "userDefinedName", ["nameChanged"])
        .aspects(CONVERSATION, "otherActiveParticipants", ["participantsChanged"])
        .aspects(CONVERSATION, "isSelfAnActiveMember", ["participantsChanged"])
        .aspects(CONVERSATION, "lastModifiedDate", ["lastModifiedDateChanged"])
        .aspects(CONVERSATION, "estimatedUnreadCount", ["unreadCountChanged"])
        .aspects(CONVERSATION, "isArchived", ["isArchivedChanged"])
        .aspects(CONVERSATION, "isSilenced", ["isSilencedChanged"])
        .aspects(
            CONVERSATION,
            "conversationListIndicator",
            ["conversationListIndicatorChanged"],
        )
        .aspects(CONVERSATION, "clearedTimeStamp", ["clearedChanged"])
        .aspects(CONVERSATION, "securityLevel", ["securityLevelChanged"])
        .aspects(CONVERSATION, "messages", ["messagesChanged"])
        .aspects(USER, "name", ["nameChanged"])
        .relation(
            RelationSpec::new("participant", CONVERSATION, USER)
                .membership_keys(["otherActiveParticipants", "displayName"])
                .translate("name", ["displayName"]),
        )
        .build()
        .unwrap()
}

/// Unarchived conversations, most recently modified first. Message traffic
/// alone is not a list update.
pub struct ActiveConversations {
    store: SharedStore,
}

impl ActiveConversations {
    pub fn new(store: SharedStore) -> Rc<Self> {
        Rc::new(Self { store })
    }

    fn get(&self, entity: EntityRef) -> Result<Conversation, EvalError> {
        self.store
            .borrow()
            .conversations
            .get(&entity)
            .cloned()
            .ok_or_else(|| EvalError::new(entity, "not in store"))
    }
}

impl ViewQuery for ActiveConversations {
    fn key(&self) -> ViewKey {
        ViewKey::new("conversation-list/active")
    }

    fn kind(&self) -> EntityKind {
        CONVERSATION
    }

    fn universe(&self) -> Vec<EntityRef> {
        self.store.borrow().conversations.keys().copied().collect()
    }

    fn matches(&self, entity: EntityRef) -> Result<bool, EvalError> {
        Ok(!self.get(entity)?.archived)
    }

    fn compare(&self, a: EntityRef, b: EntityRef) -> Result<Ordering, EvalError> {
        Ok(self.get(b)?.last_modified.cmp(&self.get(a)?.last_modified))
    }

    fn reports_aspect(&self, aspect: &str) -> bool {
        aspect != "messagesChanged"
    }
}

/// Records every `ChangeInfo` it receives.
#[derive(Default)]
pub struct EntityRecorder {
    pub received: RefCell<Vec<ChangeInfo>>,
}

impl EntityRecorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn last(&self) -> Option<ChangeInfo> {
        self.received.borrow().last().cloned()
    }
}

impl EntityObserver for EntityRecorder {
    fn on_entity_changed(&self, info: &ChangeInfo) {
        self.received.borrow_mut().push(info.clone());
    }
}

/// Records every `ViewDiff` it receives.
#[derive(Default)]
pub struct ViewRecorder {
    pub received: RefCell<Vec<(ViewKey, ViewDiff)>>,
}

impl ViewRecorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn last(&self) -> Option<ViewDiff> {
        self.received.borrow().last().map(|(_, diff)| diff.clone())
    }
}

impl ViewObserver for ViewRecorder {
    fn on_view_changed(&self, view: &ViewKey, diff: &ViewDiff) {
        self.received.borrow_mut().push((view.clone(), diff.clone()));
    }
}

pub fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Routes `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
