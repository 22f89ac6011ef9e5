//! Optional cosmetic assets
//!
//! Loading happens in the page; the bridge reports the outcome here. Nothing in
//! the simulation waits on a slot.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Load state of an optional model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelSlot {
    #[default]
    Pending,
    Ready,
    Failed(String),
}

impl ModelSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready)
    }

    pub fn mark_ready(&mut self, name: &str) {
        match self {
            ModelSlot::Pending => {
                log::info!("{name} model loaded");
                *self = ModelSlot::Ready;
            }
            ModelSlot::Ready => {}
            // No retries mid-race
            ModelSlot::Failed(_) => log::warn!("Ignoring late {name} model after failure"),
        }
    }

    pub fn mark_failed(&mut self, name: &str, reason: &str) {
        if matches!(self, ModelSlot::Pending) {
            log::warn!("{name} model failed to load, using placeholder: {reason}");
            *self = ModelSlot::Failed(reason.to_owned());
        }
    }
}

/// Asset slots owned by the render side
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub dolphin: ModelSlot,
}

impl Assets {
    /// Draw dolphins with the detailed model this frame
    pub fn detailed_dolphins(&self, settings: &Settings) -> bool {
        self.dolphin.is_ready() && settings.wants_detailed_dolphins()
    }
}
