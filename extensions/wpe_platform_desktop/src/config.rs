//! Desktop window configuration

/// Configuration for the window a view is mounted in
#[derive(Clone, Debug)]
pub struct DesktopConfig {
    /// Window title
    pub title: String,
    /// Initial width in logical pixels
    pub width: u32,
    /// Initial height in logical pixels
    pub height: u32,
    /// Whether the window can be resized
    pub resizable: bool,
    /// Whether to show window decorations (title bar, borders)
    pub decorations: bool,
    /// Whether the window should be transparent
    pub transparent: bool,
    /// Whether to start in fullscreen mode
    pub fullscreen: bool,
    /// Whether to start maximized
    pub maximized: bool,
    /// Whether to advertise DMA-BUF formats to the engine
    pub dma_buf_import: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            title: "WPE".to_string(),
            width: 1024,
            height: 768,
            resizable: true,
            decorations: true,
            transparent: false,
            fullscreen: false,
            maximized: false,
            dma_buf_import: true,
        }
    }
}

impl DesktopConfig {
    /// Create a new configuration with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn decorations(mut self, decorations: bool) -> Self {
        self.decorations = decorations;
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn maximized(mut self, maximized: bool) -> Self {
        self.maximized = maximized;
        self
    }

    /// Disable to force the engine onto shared-memory buffers
    pub fn dma_buf_import(mut self, enabled: bool) -> Self {
        self.dma_buf_import = enabled;
        self
    }
}
