mod state;
mod zoom;

pub use state::{FrameOutcome, LABEL_FONT_DIVISOR, TransitionToken, ViewState, ZoomOptions};
pub use zoom::Easing;
