//! Notification dispatch.
//!
//! Delivers the `ChangeInfo`s of a commit (in entity order), then its view
//! diffs (in view key order), to every live subscriber of the exact target in
//! subscription order. No registry borrow is held while an observer runs, so
//! observers may subscribe and unsubscribe; those calls are queued until the
//! pass ends.

use crate::change_info::ChangeInfo;
use crate::notify::ObserverRegistry;
use crate::subscription::Target;
use ripple_incremental::{ViewDiff, ViewKey};
use std::cell::RefCell;
use tracing::trace;

/// Outcome of a dispatch pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Notifications handed to an observer
    pub delivered: usize,
    /// Subscriptions skipped because their observer was dropped
    pub skipped: usize,
}

/// Ends the dispatch pass even if an observer panics.
struct PassGuard<'a> {
    registry: &'a RefCell<ObserverRegistry>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.registry.borrow_mut().end_dispatch();
    }
}

/// Runs one dispatch pass.
pub fn dispatch(
    registry: &RefCell<ObserverRegistry>,
    infos: &[ChangeInfo],
    diffs: &[(ViewKey, ViewDiff)],
) -> DispatchReport {
    let mut report = DispatchReport::default();
    if infos.is_empty() && diffs.is_empty() {
        return report;
    }

    registry.borrow_mut().begin_dispatch();
    let _guard = PassGuard { registry };

    for info in infos {
        let subs = registry
            .borrow()
            .subscriptions_for(&Target::Entity(info.entity()));
        for sub in subs {
            match sub.entity_observer() {
                Some(observer) => {
                    trace!("Delivering change of {} to {}", info.entity(), sub.token());
                    observer.on_entity_changed(info);
                    report.delivered += 1;
                }
                None => report.skipped += 1,
            }
        }
    }

    for (key, diff) in diffs {
        if diff.is_empty() {
            continue;
        }
        let subs = registry.borrow().subscriptions_for(&Target::View(key.clone()));
        for sub in subs {
            match sub.view_observer() {
                Some(observer) => {
                    trace!("Delivering diff of view {} to {}", key, sub.token());
                    observer.on_view_changed(key, diff);
                    report.delivered += 1;
                }
                None => report.skipped += 1,
            }
        }
    }

    report
}
