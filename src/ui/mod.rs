/// User interface pieces that are more than plain widget trees
///
/// - The zoomable image area with its draggable marker (canvas.rs)

pub mod canvas;
