//! Drawing surface seam
//!
//! The session never renders anything; it only pulls pixels, asks how long
//! the player has been drawing, and wipes the surface between rounds. Stroke
//! notifications flow the other way as [`crate::SessionEvent::SketchChanged`].

use doodle_classifier::Raster;
use std::time::Duration;

/// Drawing surface collaborator
#[cfg_attr(test, mockall::automock)]
pub trait Canvas: Send {
    /// Current sketch pixels, or `None` if nothing has been drawn
    fn canvas_data(&self) -> Option<Raster>;

    /// Wipe the surface; `reset` also restarts the drawing timer
    fn clear(&mut self, reset: bool);

    /// Time spent drawing the current sketch
    fn time_spent_drawing(&self) -> Duration;
}

impl<C> Canvas for Box<C>
where
    C: Canvas + ?Sized,
{
    fn canvas_data(&self) -> Option<Raster> {
        (**self).canvas_data()
    }

    fn clear(&mut self, reset: bool) {
        (**self).clear(reset);
    }

    fn time_spent_drawing(&self) -> Duration {
        (**self).time_spent_drawing()
    }
}
