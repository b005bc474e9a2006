//! The display surface a scene is presented on.

use winit::{dpi::LogicalSize, window::Window};

/// Something with a size on screen: a window, a canvas, or a test double.
pub trait DisplaySurface {
    /// Client area in logical (device independent) pixels.
    fn client_size(&self) -> LogicalSize<f64>;

    /// Physical pixels per logical pixel.
    fn pixel_ratio(&self) -> f64;

    fn aspect(&self) -> Option<f64> {
        let size = self.client_size();
        (size.width > 0.0 && size.height > 0.0).then(|| size.width / size.height)
    }
}

impl DisplaySurface for Window {
    fn client_size(&self) -> LogicalSize<f64> {
        self.inner_size().to_logical(self.scale_factor())
    }

    fn pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }
}
