//! Layout module for pipview
//!
//! The player container keeps its height proportional to its width. The
//! ratio starts as a placeholder and is replaced once the video track's
//! natural size is known; at no point are two aspect constraints active.

use crate::asset::NaturalSize;
use crate::utils::error::{PipViewError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Height/width ratio of the player container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectDescriptor {
    ratio: f64,
}

impl AspectDescriptor {
    pub fn new(ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PipViewError::InvalidInput(format!("invalid aspect ratio {}", ratio)));
        }
        Ok(Self { ratio })
    }

    /// Ratio of a video track: height / width
    pub fn from_size(size: NaturalSize) -> Result<Self> {
        if !size.is_valid() {
            return Err(PipViewError::InvalidInput(format!(
                "invalid natural size {}x{}",
                size.width, size.height
            )));
        }
        Self::new(size.height / size.width)
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

/// Identifier of a constraint activated by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintId(pub u64);

/// Layout operations provided by the host view
#[cfg_attr(test, mockall::automock)]
pub trait LayoutHost {
    /// Activate `container.height == container.width * ratio`
    fn activate_aspect_constraint(&mut self, ratio: f64) -> ConstraintId;

    /// Deactivate a previously activated constraint
    fn deactivate_constraint(&mut self, id: ConstraintId);

    /// Run a synchronous layout pass
    fn layout_if_needed(&mut self);
}

/// Keeps exactly one aspect constraint active on the host
#[derive(Debug, Default)]
pub struct LayoutAdapter {
    active: Option<(ConstraintId, AspectDescriptor)>,
    swaps: u32,
}

impl LayoutAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the placeholder ratio used before any asset is loaded
    pub fn install_placeholder<H: LayoutHost + ?Sized>(
        &mut self,
        host: &mut H,
        aspect: AspectDescriptor,
    ) {
        if self.active.is_some() {
            debug!("Aspect constraint already installed; placeholder skipped");
            return;
        }
        let id = host.activate_aspect_constraint(aspect.ratio());
        self.active = Some((id, aspect));
    }

    /// Swap the active constraint for `aspect` and lay out synchronously.
    ///
    /// The old constraint is deactivated before the new one is activated.
    pub fn apply<H: LayoutHost + ?Sized>(&mut self, host: &mut H, aspect: AspectDescriptor) {
        if let Some((old, previous)) = self.active.take() {
            debug!("Deactivating aspect constraint {:?} ({:.4})", old, previous.ratio());
            host.deactivate_constraint(old);
        }

        let id = host.activate_aspect_constraint(aspect.ratio());
        self.active = Some((id, aspect));
        self.swaps += 1;
        host.layout_if_needed();

        info!("Aspect ratio set to {:.4}", aspect.ratio());
    }

    /// Deactivate the constraint, if any
    pub fn release<H: LayoutHost + ?Sized>(&mut self, host: &mut H) {
        if let Some((id, _)) = self.active.take() {
            host.deactivate_constraint(id);
        }
    }

    pub fn current(&self) -> Option<AspectDescriptor> {
        self.active.map(|(_, aspect)| aspect)
    }

    /// Number of real (non-placeholder) swaps performed
    pub fn swaps(&self) -> u32 {
        self.swaps
    }
}
