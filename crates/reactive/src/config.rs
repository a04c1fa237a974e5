//! Observer center configuration.

/// What happens to a view once nobody observes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewRetention {
    /// Tear the view down when its last live subscription goes away.
    #[default]
    DropWhenUnobserved,
    /// Keep every view until the center is dropped.
    Retain,
}

/// Settings of an `ObserverCenter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CenterConfig {
    pub view_retention: ViewRetention,
    /// Deliver an all-aspects `ChangeInfo` for entities inserted by a commit
    pub notify_inserted: bool,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            view_retention: ViewRetention::default(),
            notify_inserted: true,
        }
    }
}

impl CenterConfig {
    /// Starts from the defaults.
    pub fn builder() -> CenterConfigBuilder {
        CenterConfigBuilder::default()
    }
}

/// Builder for `CenterConfig`.
#[derive(Clone, Debug, Default)]
pub struct CenterConfigBuilder {
    config: CenterConfig,
}

impl CenterConfigBuilder {
    pub fn view_retention(mut self, retention: ViewRetention) -> Self {
        self.config.view_retention = retention;
        self
    }

    pub fn notify_inserted(mut self, notify: bool) -> Self {
        self.config.notify_inserted = notify;
        self
    }

    pub fn build(self) -> CenterConfig {
        self.config
    }
}
