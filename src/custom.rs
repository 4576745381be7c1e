use std::{fmt, sync::Arc};

use crate::{Bar, Point, params::Placement};

/// Compute function of a user-defined indicator.
pub type CustomFn = dyn Fn(&[Bar]) -> Vec<Point> + Send + Sync;

/// User-defined indicator.
///
/// Wraps a function from the full bar series to one output channel. There is
/// no incremental recurrence: the registry calls the function again with the
/// whole series on every update, so cost grows with the series length.
///
/// The function runs unsandboxed inside the caller's process. Output points
/// are taken as returned; they should be ordered by time.
#[derive(Clone)]
pub struct CustomIndicator {
    name: String,
    placement: Placement,
    compute: Arc<CustomFn>,
}

impl CustomIndicator {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        placement: Placement,
        compute: impl Fn(&[Bar]) -> Vec<Point> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            placement,
            compute: Arc::new(compute),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    #[must_use]
    pub fn compute(&self, bars: &[Bar]) -> Vec<Point> {
        (self.compute)(bars)
    }
}

impl fmt::Debug for CustomIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomIndicator")
            .field("name", &self.name)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CustomIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
