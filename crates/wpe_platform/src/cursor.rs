//! Cursor shapes requested by the engine

use std::rc::Rc;

/// Cursor icons
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Default arrow cursor
    #[default]
    Default,
    /// Pointer/hand cursor (for links)
    Pointer,
    /// Text/I-beam cursor
    Text,
    /// Crosshair cursor
    Crosshair,
    /// Move cursor
    Move,
    /// Not allowed cursor
    NotAllowed,
    /// North-South resize cursor
    ResizeNS,
    /// East-West resize cursor
    ResizeEW,
    /// Northeast-Southwest resize cursor
    ResizeNESW,
    /// Northwest-Southeast resize cursor
    ResizeNWSE,
    /// Grab cursor (open hand)
    Grab,
    /// Grabbing cursor (closed hand)
    Grabbing,
    /// Wait/loading cursor
    Wait,
    /// Progress cursor (arrow with spinner)
    Progress,
    /// Help cursor
    Help,
    /// Hidden cursor
    None,
}

impl Cursor {
    /// Map a CSS cursor name to a cursor
    ///
    /// Unknown names map to [`Cursor::Default`].
    pub fn from_name(name: &str) -> Cursor {
        match name {
            "pointer" => Cursor::Pointer,
            "text" | "vertical-text" => Cursor::Text,
            "crosshair" | "cell" => Cursor::Crosshair,
            "move" | "all-scroll" => Cursor::Move,
            "not-allowed" | "no-drop" => Cursor::NotAllowed,
            "ns-resize" | "n-resize" | "s-resize" | "row-resize" => Cursor::ResizeNS,
            "ew-resize" | "e-resize" | "w-resize" | "col-resize" => Cursor::ResizeEW,
            "nesw-resize" | "ne-resize" | "sw-resize" => Cursor::ResizeNESW,
            "nwse-resize" | "nw-resize" | "se-resize" => Cursor::ResizeNWSE,
            "grab" => Cursor::Grab,
            "grabbing" => Cursor::Grabbing,
            "wait" => Cursor::Wait,
            "progress" => Cursor::Progress,
            "help" => Cursor::Help,
            "none" => Cursor::None,
            _ => Cursor::Default,
        }
    }
}

/// A cursor drawn from engine-supplied pixels
///
/// `data` holds `height` rows of `stride` bytes, each pixel four bytes of
/// premultiplied BGRA. The hotspot is in pixels from the top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorImage {
    pub data: Rc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub hotspot_x: u32,
    pub hotspot_y: u32,
}

impl CursorImage {
    pub fn new(
        data: impl Into<Rc<[u8]>>,
        width: u32,
        height: u32,
        stride: u32,
        hotspot: (u32, u32),
    ) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            stride,
            hotspot_x: hotspot.0,
            hotspot_y: hotspot.1,
        }
    }

    /// Tightly packed, straight-alpha RGBA pixels
    ///
    /// Returns `None` when `data` is too short for the declared layout.
    pub fn to_rgba(&self) -> Option<Vec<u8>> {
        let row_bytes = self.width as usize * 4;
        if (self.stride as usize) < row_bytes {
            return None;
        }
        let mut rgba = Vec::with_capacity(row_bytes * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride as usize;
            let row = self.data.get(start..start + row_bytes)?;
            for pixel in row.chunks_exact(4) {
                let [b, g, r, a] = [pixel[0], pixel[1], pixel[2], pixel[3]];
                let unpremultiply = |c: u8| match a {
                    0 => 0,
                    255 => c,
                    _ => ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8,
                };
                rgba.extend_from_slice(&[unpremultiply(r), unpremultiply(g), unpremultiply(b), a]);
            }
        }
        Some(rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_names() {
        assert_eq!(Cursor::from_name("pointer"), Cursor::Pointer);
        assert_eq!(Cursor::from_name("col-resize"), Cursor::ResizeEW);
        assert_eq!(Cursor::from_name("none"), Cursor::None);
        assert_eq!(Cursor::from_name("zoom-in"), Cursor::Default);
    }

    #[test]
    fn test_cursor_image_to_rgba() {
        // one row of two pixels plus padding: opaque blue, half-transparent red
        let data = vec![255u8, 0, 0, 255, 0, 0, 64, 128, 9, 9];
        let image = CursorImage::new(data, 2, 1, 10, (1, 0));
        assert_eq!(
            image.to_rgba(),
            Some(vec![0, 0, 255, 255, 128, 0, 0, 128])
        );
        assert_eq!(image.hotspot_x, 1);
    }

    #[test]
    fn test_cursor_image_too_short() {
        assert_eq!(CursorImage::new(vec![0u8; 7], 1, 2, 4, (0, 0)).to_rgba(), None);
        assert_eq!(CursorImage::new(vec![0u8; 8], 2, 1, 4, (0, 0)).to_rgba(), None);
    }
}
