//! Inbox triage use-case service.
//!
//! # Responsibility
//! - Provide capture, list, action lookup and conversion entry points.
//! - Create target objects before removing their source items.
//! - Reject duplicate submissions while a conversion is outstanding.
//!
//! # Invariants
//! - An item leaves the inbox only after its target confirmed creation.
//! - A failed or abandoned conversion leaves the item untouched.
//! - `keep_as_note` never mutates the store.
//! - Converting an absent id is a no-op.
//! - A created object whose source item could not be removed is reported
//!   with its target reference.

use crate::model::action::{actions_for, is_action_available, ConversionKind, InboxAction};
use crate::model::inbox_item::{InboxItem, InboxItemId, InboxItemType, NewInboxItem};
use crate::model::tab::{filter_items, tab_counts, InboxTab, TabCounts};
use crate::present::{present_item, ItemView};
use crate::repo::inbox_repo::{InboxRepository, RepoError, RepoResult};
use crate::suggest::{LabelSuggester, NoLabelSuggester};
use crate::target::{ConversionPayload, ConversionTarget, TargetError, TargetKind, TargetRef};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// Conversion failure surfaced to the caller.
#[derive(Debug)]
pub enum ConversionError {
    /// The item's type does not offer this conversion.
    ActionNotAvailable {
        kind: InboxItemType,
        conversion: ConversionKind,
    },
    /// Conversion creates nothing (keep-as-note) and cannot be staged.
    NoTarget(ConversionKind),
    /// Another conversion of the same item has not completed yet.
    AlreadyInFlight(InboxItemId),
    /// The target failed; the item stays in the inbox.
    Target(TargetError),
    /// The target object exists but the item could not be removed.
    ///
    /// Retrying would create a second object; reconcile with `target` instead.
    RemoveAfterCreate { target: TargetRef, source: RepoError },
    Repo(RepoError),
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionNotAvailable { kind, conversion } => {
                write!(f, "`{conversion}` is not available for {kind} items")
            }
            Self::NoTarget(conversion) => write!(f, "`{conversion}` does not create an object"),
            Self::AlreadyInFlight(id) => write!(f, "conversion already in progress: {id}"),
            Self::Target(err) => write!(f, "{err}"),
            Self::RemoveAfterCreate { target, source } => write!(
                f,
                "created {} `{}` but the inbox item was not removed: {source}",
                target.kind.as_str(),
                target.id
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConversionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Target(err) => Some(err),
            Self::RemoveAfterCreate { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ConversionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Observable result of a triage action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Target created and item removed.
    Converted(TargetRef),
    /// Item reviewed and left in place.
    Kept,
    /// No item with that id; nothing happened.
    Missing,
}

/// Ids with an outstanding conversion.
///
/// Cloning shares the underlying set, so short-lived services built per call
/// still see each other's claims.
#[derive(Debug, Clone, Default)]
pub struct InFlightConversions {
    ids: Arc<Mutex<HashSet<InboxItemId>>>,
}

impl InFlightConversions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: InboxItemId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_claim(&self, id: InboxItemId) -> Option<InFlightClaim> {
        let inserted = self
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then(|| InFlightClaim {
            set: self.clone(),
            id,
        })
    }

    fn release(&self, id: InboxItemId) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Releases the in-flight claim when dropped.
#[derive(Debug)]
struct InFlightClaim {
    set: InFlightConversions,
    id: InboxItemId,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.set.release(self.id);
    }
}

/// Conversion staged by [`InboxService::begin_conversion`].
///
/// Hand `payload` to the target, then pass the result to
/// [`InboxService::finish_conversion`]. Dropping it instead abandons the
/// conversion and frees the item for another attempt.
#[derive(Debug)]
pub struct PendingConversion {
    pub conversion: ConversionKind,
    pub payload: ConversionPayload,
    claim: InFlightClaim,
}

impl PendingConversion {
    pub fn item_id(&self) -> InboxItemId {
        self.claim.id
    }
}

/// Explicit inbox context handed to the presentation layer.
pub struct InboxService<R: InboxRepository, T: ConversionTarget> {
    repo: R,
    target: T,
    in_flight: InFlightConversions,
    suggester: Box<dyn LabelSuggester>,
}

impl<R: InboxRepository, T: ConversionTarget> InboxService<R, T> {
    pub fn new(repo: R, target: T) -> Self {
        Self {
            repo,
            target,
            in_flight: InFlightConversions::new(),
            suggester: Box::new(NoLabelSuggester),
        }
    }

    /// Shares an in-flight set with other service instances.
    pub fn with_in_flight(mut self, in_flight: InFlightConversions) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Labels unlabelled captures with `suggester`.
    pub fn with_suggester(mut self, suggester: impl LabelSuggester + 'static) -> Self {
        self.suggester = Box::new(suggester);
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn in_flight(&self) -> &InFlightConversions {
        &self.in_flight
    }

    /// Stores a capture, filling `ai_label` from the suggester when unset.
    pub fn add_item(&self, mut item: NewInboxItem) -> RepoResult<InboxItemId> {
        if item.ai_label.is_none() {
            item.ai_label = self.suggester.suggest(item.title.as_deref(), &item.content);
        }
        let kind = item.kind;
        let id = self.repo.add_item(item)?;
        info!("event=inbox_capture module=inbox status=ok type={kind}");
        Ok(id)
    }

    /// Removes an item without creating anything. Absent ids are ignored.
    pub fn remove_item(&self, id: InboxItemId) -> RepoResult<()> {
        if self.repo.remove_item(id)? {
            info!("event=inbox_remove module=inbox status=ok");
        }
        Ok(())
    }

    pub fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>> {
        self.repo.get_item(id)
    }

    /// Items visible under `tab`, newest first.
    pub fn list_items(&self, tab: InboxTab) -> RepoResult<Vec<InboxItem>> {
        Ok(filter_items(&self.repo.list_items()?, tab))
    }

    pub fn tab_counts(&self) -> RepoResult<TabCounts> {
        Ok(tab_counts(&self.repo.list_items()?))
    }

    /// Render-ready rows for `tab`.
    pub fn present(&self, tab: InboxTab, now_ms: i64) -> RepoResult<Vec<ItemView>> {
        Ok(self
            .list_items(tab)?
            .iter()
            .map(|item| present_item(item, now_ms))
            .collect())
    }

    pub fn actions_for(&self, item: &InboxItem) -> &'static [InboxAction] {
        actions_for(item.kind)
    }

    pub fn is_converting(&self, id: InboxItemId) -> bool {
        self.in_flight.contains(id)
    }

    /// Records that the user reviewed `id` and left it in the inbox.
    pub fn keep_as_note(&self, id: InboxItemId) -> RepoResult<ConversionOutcome> {
        match self.repo.get_item(id)? {
            Some(item) => {
                info!(
                    "event=inbox_keep module=inbox status=ok type={}",
                    item.kind
                );
                Ok(ConversionOutcome::Kept)
            }
            None => Ok(ConversionOutcome::Missing),
        }
    }

    /// Converts `id` synchronously through the configured target.
    pub fn convert(
        &self,
        id: InboxItemId,
        conversion: ConversionKind,
    ) -> Result<ConversionOutcome, ConversionError> {
        if !conversion.creates_target() {
            return Ok(self.keep_as_note(id)?);
        }
        let Some(pending) = self.begin_conversion(id, conversion)? else {
            return Ok(ConversionOutcome::Missing);
        };
        let result = self.target.create(&pending.payload);
        self.finish_conversion(pending, result)
    }

    /// Claims `id` and builds the creation payload.
    ///
    /// The claim is taken before the item is read, so a submission that loses
    /// the race to a finished conversion sees the item gone.
    /// Returns `Ok(None)` when the item does not exist.
    pub fn begin_conversion(
        &self,
        id: InboxItemId,
        conversion: ConversionKind,
    ) -> Result<Option<PendingConversion>, ConversionError> {
        let Some(target_kind) = TargetKind::for_conversion(conversion) else {
            return Err(ConversionError::NoTarget(conversion));
        };
        let claim = self
            .in_flight
            .try_claim(id)
            .ok_or(ConversionError::AlreadyInFlight(id))?;
        let Some(item) = self.repo.get_item(id)? else {
            return Ok(None);
        };
        if !is_action_available(item.kind, conversion) {
            return Err(ConversionError::ActionNotAvailable {
                kind: item.kind,
                conversion,
            });
        }

        Ok(Some(PendingConversion {
            conversion,
            payload: ConversionPayload::from_item(&item, target_kind),
            claim,
        }))
    }

    /// Applies the target's answer to a staged conversion.
    pub fn finish_conversion(
        &self,
        pending: PendingConversion,
        result: Result<TargetRef, TargetError>,
    ) -> Result<ConversionOutcome, ConversionError> {
        let target = match result {
            Ok(target) => target,
            Err(err) => {
                warn!(
                    "event=inbox_convert module=inbox status=error conversion={} error={err}",
                    pending.conversion.as_str()
                );
                return Err(ConversionError::Target(err));
            }
        };

        if let Err(source) = self.repo.remove_item(pending.item_id()) {
            warn!(
                "event=inbox_convert module=inbox status=error conversion={} target_kind={} stage=remove error={source}",
                pending.conversion.as_str(),
                target.kind.as_str()
            );
            return Err(ConversionError::RemoveAfterCreate { target, source });
        }
        info!(
            "event=inbox_convert module=inbox status=ok conversion={} target_kind={}",
            pending.conversion.as_str(),
            target.kind.as_str()
        );
        Ok(ConversionOutcome::Converted(target))
    }
}
