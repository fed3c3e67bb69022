use cgmath::Vector2;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke};
use iced::widget::image::Handle;
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::geometry::{self, ImageFrame, Transform};
use crate::Message;

/// Radius of the progress marker, in screen pixels
const MARKER_RADIUS: f32 = 11.0;
/// Extra slack around the marker when deciding whether a press grabs it
const GRAB_SLACK: f32 = 8.0;

const FRAME_FILL: Color = Color::from_rgba(0.96, 0.92, 0.86, 0.35);
const FRAME_EDGE: Color = Color::from_rgb(0.55, 0.42, 0.33);
const MARKER_FILL: Color = Color::from_rgba(0.85, 0.55, 0.55, 0.8);

/// Zoomable image area with a draggable progress marker
///
/// The picture and the marker go through the same zoom and pan, so a marker
/// ratio always names the same spot of the picture. Pressing on the marker
/// drags it; pressing elsewhere pans the view. The mouse wheel zooms.
pub struct MarkerCanvas {
    /// Which image of the screen this canvas shows (0 = main image)
    pub index: usize,
    /// Picture to draw; built-in entries without one get a placeholder
    pub image: Option<Handle>,
    /// Pixel size of the image, used for the aspect fit
    pub image_size: Vector2<f64>,
    /// Marker position as image ratios
    pub marker: Vector2<f64>,
    pub transform: Transform,
}

impl MarkerCanvas {
    fn layout(&self, bounds: Rectangle) -> (Vector2<f64>, ImageFrame) {
        let container = Vector2::new(bounds.width as f64, bounds.height as f64);
        (container, ImageFrame::fit(container, self.image_size))
    }

    /// Screen rectangle the picture covers after zoom and pan
    fn picture_rect(&self, bounds: Rectangle) -> Rectangle {
        let (container, frame) = self.layout(bounds);
        let shown = frame.displayed(container, &self.transform);
        Rectangle::new(
            to_point(shown.origin),
            Size::new(shown.size.x as f32, shown.size.y as f32),
        )
    }

    fn marker_point(&self, bounds: Rectangle) -> Point {
        let (container, frame) = self.layout(bounds);
        to_point(geometry::marker_to_screen(
            self.marker,
            container,
            &frame,
            &self.transform,
        ))
    }

    fn grabs_marker(&self, bounds: Rectangle, pos: Point) -> bool {
        pos.distance(self.marker_point(bounds)) <= MARKER_RADIUS + GRAB_SLACK
    }

    /// Marker ratio for a release point, clamped into the picture
    fn drop_ratio(&self, bounds: Rectangle, release: Point) -> Vector2<f64> {
        let (container, frame) = self.layout(bounds);
        geometry::screen_to_marker(
            Vector2::new(release.x as f64, release.y as f64),
            container,
            &frame,
            &self.transform,
        )
    }
}

impl Program<Message> for MarkerCanvas {
    type State = DragState;

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let shown = self.picture_rect(bounds);

        match &self.image {
            // A zoomed picture is larger than the canvas; keep it inside
            Some(handle) => frame.with_clip(Rectangle::with_size(bounds.size()), |frame| {
                frame.draw_image(shown, handle)
            }),
            None => frame.fill_rectangle(shown.position(), shown.size(), FRAME_FILL),
        }
        frame.stroke(
            &Path::rectangle(shown.position(), shown.size()),
            Stroke::default().with_color(FRAME_EDGE).with_width(1.0),
        );

        let center = match state {
            DragState::Marker { current } => *current,
            _ => self.marker_point(bounds),
        };
        let marker = Path::circle(center, MARKER_RADIUS);
        frame.fill(&marker, MARKER_FILL);
        frame.stroke(&marker, Stroke::default().with_color(Color::WHITE).with_width(2.0));

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.position_in(bounds).is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                let factor = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => 1.0 + y as f64 * 0.1,
                    mouse::ScrollDelta::Pixels { y, .. } => 1.0 + y as f64 * 0.01,
                };
                return (
                    canvas::event::Status::Captured,
                    Some(Message::Zoomed {
                        index: self.index,
                        factor: factor.clamp(0.5, 2.0),
                    }),
                );
            }

            // Press: grab the marker if under the cursor, otherwise start panning
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    *state = if self.grabs_marker(bounds, pos) {
                        DragState::Marker { current: pos }
                    } else {
                        DragState::Pan { start: pos }
                    };
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => match state {
                DragState::Marker { current } => {
                    if let Some(pos) = cursor.position_in(bounds) {
                        *current = pos;
                    }
                    return (canvas::event::Status::Captured, None);
                }
                DragState::Pan { start } => {
                    if let Some(pos) = cursor.position_in(bounds) {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Panned {
                                index: self.index,
                                translation: pan_translation(*start, pos),
                            }),
                        );
                    }
                }
                DragState::Idle => {}
            },

            // Release: drop the marker where the cursor is, or finish the pan
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                match std::mem::take(state) {
                    DragState::Marker { current } => {
                        let release = cursor.position_in(bounds).unwrap_or(current);
                        let ratio = self.drop_ratio(bounds, release);
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::MarkerDropped {
                                index: self.index,
                                x: ratio.x,
                                y: ratio.y,
                            }),
                        );
                    }
                    DragState::Pan { .. } => {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::PanEnded(self.index)),
                        );
                    }
                    DragState::Idle => {}
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        match state {
            DragState::Marker { .. } | DragState::Pan { .. } => mouse::Interaction::Grabbing,
            DragState::Idle => match cursor.position_in(bounds) {
                Some(pos) if self.grabs_marker(bounds, pos) => mouse::Interaction::Grab,
                _ => mouse::Interaction::default(),
            },
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Marker follows the cursor until release
    Marker { current: Point },
    /// Pan translation is measured from `start`
    Pan { start: Point },
}

fn pan_translation(start: Point, pos: Point) -> Vector2<f64> {
    Vector2::new((pos.x - start.x) as f64, (pos.y - start.y) as f64)
}

fn to_point(v: Vector2<f64>) -> Point {
    Point::new(v.x as f32, v.y as f32)
}
