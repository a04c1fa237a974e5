//! Observer traits.
//!
//! Observers are held weakly by the registry: the caller owns the `Rc` and a
//! dropped observer simply stops receiving notifications.

use crate::change_info::ChangeInfo;
use ripple_incremental::{ViewDiff, ViewKey};

/// Receives the changes of one observed entity.
pub trait EntityObserver {
    fn on_entity_changed(&self, info: &ChangeInfo);
}

/// Receives the index-level diff of one ordered view.
pub trait ViewObserver {
    fn on_view_changed(&self, view: &ViewKey, diff: &ViewDiff);
}

impl<F> EntityObserver for F
where
    F: Fn(&ChangeInfo),
{
    fn on_entity_changed(&self, info: &ChangeInfo) {
        self(info)
    }
}

impl<F> ViewObserver for F
where
    F: Fn(&ViewKey, &ViewDiff),
{
    fn on_view_changed(&self, view: &ViewKey, diff: &ViewDiff) {
        self(view, diff)
    }
}
