use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ChartError, ChartResult};
use crate::interaction::zoom::ZoomTransform;

/// View state shared by every chart plotted from one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotState {
    pub zoom: ZoomTransform,
    /// Timestamp currently hovered on any chart.
    pub tooltip_x: Option<DateTime<Utc>>,
    /// Fixed y window height; `None` auto-fits each chart.
    pub y_extent_size: Option<f64>,
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlotStateUpdate {
    pub zoom: Option<ZoomTransform>,
    pub tooltip_x: Option<Option<DateTime<Utc>>>,
    pub y_extent_size: Option<Option<f64>>,
}

impl PlotStateUpdate {
    #[must_use]
    pub fn zoom(transform: ZoomTransform) -> Self {
        Self {
            zoom: Some(transform),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tooltip_x(tooltip_x: Option<DateTime<Utc>>) -> Self {
        Self {
            tooltip_x: Some(tooltip_x),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn y_extent_size(y_extent_size: Option<f64>) -> Self {
        Self {
            y_extent_size: Some(y_extent_size),
            ..Self::default()
        }
    }

    fn validate(self) -> ChartResult<Self> {
        if let Some(zoom) = self.zoom {
            zoom.validate()?;
        }
        if let Some(Some(size)) = self.y_extent_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(ChartError::InvalidData(
                    "y extent size must be finite and > 0".to_owned(),
                ));
            }
        }
        Ok(self)
    }
}

/// Fields that changed since a subscriber last looked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlotStateChanges {
    pub zoom: bool,
    pub tooltip_x: bool,
    pub y_extent_size: bool,
}

impl PlotStateChanges {
    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.zoom && !self.tooltip_x && !self.y_extent_size
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            zoom: self.zoom || other.zoom,
            tooltip_x: self.tooltip_x || other.tooltip_x,
            y_extent_size: self.y_extent_size || other.y_extent_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct PlotStateStore {
    state: PlotState,
    revision: u64,
    next_subscription: u64,
    subscribers: IndexMap<SubscriptionId, PlotStateChanges>,
}

/// Publish/update store for [`PlotState`], shared by handle.
///
/// `update` is the only mutation path. Each committed change is queued for
/// every subscriber, which collects it with `take_changes`; reading a change
/// never writes back, so charts applying it cannot loop.
#[derive(Debug, Clone, Default)]
pub struct SharedPlotState {
    inner: Rc<RefCell<PlotStateStore>>,
}

impl SharedPlotState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PlotState) -> ChartResult<Self> {
        state.zoom.validate()?;
        let shared = Self::new();
        shared.inner.borrow_mut().state = state;
        Ok(shared)
    }

    #[must_use]
    pub fn get(&self) -> PlotState {
        self.inner.borrow().state
    }

    /// Number of committed updates that changed something.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Applies an update and queues the resulting changes for every
    /// subscriber. Values equal to the current ones are not reported.
    pub fn update(&self, update: PlotStateUpdate) -> ChartResult<PlotStateChanges> {
        let update = update.validate()?;
        let mut store = self.inner.borrow_mut();
        let mut changes = PlotStateChanges::default();

        if let Some(zoom) = update.zoom {
            if zoom != store.state.zoom {
                store.state.zoom = zoom;
                changes.zoom = true;
            }
        }
        if let Some(tooltip_x) = update.tooltip_x {
            if tooltip_x != store.state.tooltip_x {
                store.state.tooltip_x = tooltip_x;
                changes.tooltip_x = true;
            }
        }
        if let Some(y_extent_size) = update.y_extent_size {
            if y_extent_size != store.state.y_extent_size {
                store.state.y_extent_size = y_extent_size;
                changes.y_extent_size = true;
            }
        }

        if !changes.is_empty() {
            store.revision += 1;
            for pending in store.subscribers.values_mut() {
                *pending = pending.merge(changes);
            }
            trace!(
                revision = store.revision,
                subscribers = store.subscribers.len(),
                ?changes,
                "plot state updated"
            );
        }
        Ok(changes)
    }

    pub fn subscribe(&self) -> SubscriptionId {
        let mut store = self.inner.borrow_mut();
        store.next_subscription += 1;
        let id = SubscriptionId(store.next_subscription);
        store.subscribers.insert(id, PlotStateChanges::default());
        id
    }

    /// Returns `true` when the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().subscribers.shift_remove(&id).is_some()
    }

    /// Takes the changes queued for a subscriber since its last call.
    pub fn take_changes(&self, id: SubscriptionId) -> PlotStateChanges {
        self.inner
            .borrow_mut()
            .subscribers
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Whether both handles refer to the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
