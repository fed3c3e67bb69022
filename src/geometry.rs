/// Marker geometry under zoom and pan
///
/// The marker is stored as a ratio of the displayed image (0..1 on each axis).
/// On screen the image is aspect-fitted into its container, then scaled about
/// the container center and shifted by the pan offset. These functions map
/// between the two spaces.

use cgmath::Vector2;

/// Discrete zoom levels cycled by the zoom button
pub const ZOOM_STEPS: [f64; 3] = [1.0, 1.8, 2.6];

/// Bounds for continuous (pinch / wheel) zoom
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 4.0;

/// Distances closer than this count as a tie when snapping to a step
const STEP_TIE_EPSILON: f64 = 1e-9;

/// Where an aspect-fitted image lands inside its container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFrame {
    /// Top-left corner, in container coordinates
    pub origin: Vector2<f64>,
    pub size: Vector2<f64>,
}

impl ImageFrame {
    /// Fit an image of `image` size into `container`, keeping its aspect ratio.
    ///
    /// A relatively wider image fills the width and is centered vertically;
    /// otherwise it fills the height and is centered horizontally.
    pub fn fit(container: Vector2<f64>, image: Vector2<f64>) -> Self {
        if image.x <= 0.0 || image.y <= 0.0 || container.x <= 0.0 || container.y <= 0.0 {
            return Self {
                origin: container / 2.0,
                size: Vector2::new(0.0, 0.0),
            };
        }

        let image_aspect = image.x / image.y;
        let container_aspect = container.x / container.y;
        let size = if image_aspect > container_aspect {
            Vector2::new(container.x, container.x / image_aspect)
        } else {
            Vector2::new(container.y * image_aspect, container.y)
        };

        Self {
            origin: (container - size) / 2.0,
            size,
        }
    }

    /// Untransformed container point for a marker ratio
    pub fn point_at(&self, ratio: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            self.origin.x + ratio.x * self.size.x,
            self.origin.y + ratio.y * self.size.y,
        )
    }

    /// Where the image is drawn on screen once zoom and pan are applied
    pub fn displayed(&self, container: Vector2<f64>, transform: &Transform) -> ImageFrame {
        ImageFrame {
            origin: transform.apply(container, self.origin),
            size: self.size * transform.scale,
        }
    }

    /// Ratio of an untransformed container point, clamped into the image
    pub fn ratio_of(&self, point: Vector2<f64>) -> Vector2<f64> {
        let clamped = Vector2::new(
            point.x.clamp(self.origin.x, self.origin.x + self.size.x),
            point.y.clamp(self.origin.y, self.origin.y + self.size.y),
        );
        Vector2::new(
            axis_ratio(clamped.x - self.origin.x, self.size.x),
            axis_ratio(clamped.y - self.origin.y, self.size.y),
        )
    }
}

fn axis_ratio(offset: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        offset / extent
    } else {
        0.5
    }
}

/// Current zoom scale and pan offset of a view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub pan: Vector2<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            pan: Vector2::new(0.0, 0.0),
        }
    }
}

impl Transform {
    /// Container point -> screen point
    pub fn apply(&self, container: Vector2<f64>, point: Vector2<f64>) -> Vector2<f64> {
        let center = container / 2.0;
        (point - center) * self.scale + center + self.pan
    }

    /// Screen point -> container point
    pub fn invert(&self, container: Vector2<f64>, screen: Vector2<f64>) -> Vector2<f64> {
        let center = container / 2.0;
        let scale = if self.scale > 0.0 { self.scale } else { MIN_SCALE };
        (screen - self.pan - center) / scale + center
    }
}

/// Screen position of a marker ratio
pub fn marker_to_screen(
    ratio: Vector2<f64>,
    container: Vector2<f64>,
    frame: &ImageFrame,
    transform: &Transform,
) -> Vector2<f64> {
    transform.apply(container, frame.point_at(ratio))
}

/// Marker ratio for a screen position (e.g. where a drag was released),
/// clamped to the image bounds
pub fn screen_to_marker(
    screen: Vector2<f64>,
    container: Vector2<f64>,
    frame: &ImageFrame,
    transform: &Transform,
) -> Vector2<f64> {
    frame.ratio_of(transform.invert(container, screen))
}

/// Clamp a continuous scale into [MIN_SCALE, MAX_SCALE]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return MIN_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Index of the zoom step closest to `scale`; ties go to the lower index.
///
/// Distances within `STEP_TIE_EPSILON` count as equal, so 2.2 (0.4 from
/// both 1.8 and 2.6) picks 1.8, where an exact float comparison picks 2.6.
pub fn nearest_step(scale: f64) -> usize {
    let mut best = 0;
    let mut best_diff = (ZOOM_STEPS[0] - scale).abs();
    for (i, step) in ZOOM_STEPS.iter().enumerate().skip(1) {
        let diff = (step - scale).abs();
        if diff < best_diff - STEP_TIE_EPSILON {
            best = i;
            best_diff = diff;
        }
    }
    best
}

/// Zoom and pan state of one image view.
///
/// Tracks the continuous scale, the step shown by the zoom button and the
/// pan offset, including the in-progress part of pinch and pan gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub step: usize,
    pub transform: Transform,
    last_pan: Vector2<f64>,
    last_magnification: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            step: 0,
            transform: Transform::default(),
            last_pan: Vector2::new(0.0, 0.0),
            last_magnification: 1.0,
        }
    }
}

impl ZoomState {
    /// Advance 1.0 -> 1.8 -> 2.6 -> 1.0
    pub fn cycle_step(&mut self) {
        self.step = (self.step + 1) % ZOOM_STEPS.len();
        self.transform.scale = ZOOM_STEPS[self.step];
    }

    /// Pinch in progress; `magnification` is relative to the gesture start
    pub fn pinch_changed(&mut self, magnification: f64) {
        if magnification <= 0.0 || self.last_magnification <= 0.0 {
            return;
        }
        let delta = magnification / self.last_magnification;
        self.transform.scale = clamp_scale(self.transform.scale * delta);
        self.last_magnification = magnification;
    }

    /// Pinch finished: snap the step indicator to the nearest preset
    pub fn pinch_ended(&mut self) {
        self.last_magnification = 1.0;
        self.step = nearest_step(self.transform.scale);
    }

    /// One-shot zoom (mouse wheel): a pinch that starts and ends at once
    pub fn zoom_by(&mut self, factor: f64) {
        self.pinch_changed(factor);
        self.pinch_ended();
    }

    /// Pan in progress; `translation` is relative to the gesture start
    pub fn pan_changed(&mut self, translation: Vector2<f64>) {
        self.transform.pan = self.last_pan + translation;
    }

    pub fn pan_ended(&mut self) {
        self.last_pan = self.transform.pan;
    }

    /// Back to 1x, step 0, no pan
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
