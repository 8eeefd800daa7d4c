use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use futures::FutureExt;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pdf::SourceDocument;

/// Stable handle for a document in a working set. Never reused within a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(u64);

impl DocId {
    pub fn new(raw: u64) -> Self {
        DocId(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Idle,
    InProgress,
    Succeeded,
    Failed(String),
}

/// Settled result of one document's operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn status(&self) -> SlotStatus {
        match self {
            Outcome::Success(_) => SlotStatus::Succeeded,
            Outcome::Failure(reason) => SlotStatus::Failed(reason.clone()),
        }
    }
}

/// Per-document record: the operation status plus pane-specific state.
///
/// Records are immutable once published; writers build a new one and swap it in.
#[derive(Debug, Clone, Default)]
pub struct Slot<S> {
    pub status: SlotStatus,
    pub state: S,
}

/// One document of a working set as seen at snapshot time.
#[derive(Debug, Clone)]
pub struct Entry<S> {
    pub id: DocId,
    pub document: SourceDocument,
    pub slot: Arc<Slot<S>>,
}

/// Loaded documents in insertion order, each with its own status slot.
pub struct WorkingSet<S> {
    next_id: u64,
    order: Vec<DocId>,
    documents: HashMap<DocId, SourceDocument>,
    slots: Mutex<HashMap<DocId, Arc<Slot<S>>>>,
}

impl<S: Clone + Default> WorkingSet<S> {
    pub fn new() -> Self {
        WorkingSet {
            next_id: 1,
            order: Vec::new(),
            documents: HashMap::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn add(&mut self, document: SourceDocument) -> DocId {
        let id = DocId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.documents.insert(id, document);
        self.slots
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Slot::default()));
        id
    }

    /// Drop every document and slot at once. Ids keep counting up.
    pub fn reset(&mut self) {
        self.order.clear();
        self.documents.clear();
        self.slots
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn ids(&self) -> Vec<DocId> {
        self.order.clone()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn document(&self, id: DocId) -> Option<&SourceDocument> {
        self.documents.get(&id)
    }

    pub fn slot(&self, id: DocId) -> Option<Arc<Slot<S>>> {
        self.lock_slots().get(&id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Entry<S>> {
        let slots = self.lock_slots();
        self.order
            .iter()
            .filter_map(|id| {
                Some(Entry {
                    id: *id,
                    document: self.documents.get(id)?.clone(),
                    slot: slots.get(id)?.clone(),
                })
            })
            .collect()
    }

    /// Replace a slot with a record derived from the current one.
    pub fn update(&self, id: DocId, f: impl FnOnce(&Slot<S>) -> Slot<S>) {
        let mut slots = self.lock_slots();
        if let Some(current) = slots.get(&id) {
            let next = Arc::new(f(current));
            slots.insert(id, next);
        }
    }

    pub fn set_status(&self, id: DocId, status: SlotStatus) {
        self.update(id, |slot| Slot {
            status,
            state: slot.state.clone(),
        });
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<DocId, Arc<Slot<S>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone + Default> Default for WorkingSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `operation` on every document in `ids`, concurrently, and wait for all of them.
///
/// All slots are marked in progress before any work starts. Each document's
/// error or panic becomes its own `Failure` and its slot turns failed; siblings
/// are unaffected. Results come back in `ids` order regardless of completion
/// order. Ids not in the set are ignored.
pub async fn run_batch<S, T, F, Fut>(
    set: &WorkingSet<S>,
    ids: &[DocId],
    operation: F,
) -> Vec<(DocId, Outcome<T>)>
where
    S: Clone + Default,
    F: Fn(SourceDocument) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let targets: Vec<(DocId, SourceDocument)> = ids
        .iter()
        .filter_map(|&id| set.document(id).map(|doc| (id, doc.clone())))
        .collect();

    for (id, _) in &targets {
        set.set_status(*id, SlotStatus::InProgress);
    }

    let operation = &operation;
    let tasks = targets.into_iter().map(|(id, doc)| async move {
        let name = doc.name().to_string();
        let settled = AssertUnwindSafe(async move { operation(doc).await })
            .catch_unwind()
            .await;
        let outcome = match settled {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(e)) if e.is_validation() => {
                info!("{} ({}): {}", name, id, e);
                Outcome::Failure(e.to_string())
            }
            Ok(Err(e)) => {
                warn!("{} ({}): {}", name, id, e);
                Outcome::Failure(e.to_string())
            }
            Err(payload) => {
                let reason = format!("failed to process document: {}", panic_message(&*payload));
                warn!("{} ({}): {}", name, id, reason);
                Outcome::Failure(reason)
            }
        };
        set.set_status(id, outcome.status());
        (id, outcome)
    });

    let outcomes = join_all(tasks).await;
    let failed = outcomes.iter().filter(|(_, o)| !o.is_success()).count();
    info!(
        "batch finished: {} document(s), {} failed",
        outcomes.len(),
        failed
    );
    outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
