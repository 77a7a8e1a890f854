//! A render target owns one drawn surface and remembers which editor
//! version produced it. Re-rendering only happens on an explicit `sync`,
//! and the old surface is always dropped before the new one is drawn.

use image::RgbaImage;
use tracing::debug;

use super::{encode, export_filename, raster, Export, ExportFormat, RenderError};
use crate::style::StyleEditor;

#[derive(Debug)]
pub struct RenderTarget {
    scale: u32,
    surface: Option<RgbaImage>,
    rendered: Option<(u64, String)>,
}

impl RenderTarget {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            surface: None,
            rendered: None,
        }
    }

    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    pub fn rendered_version(&self) -> Option<u64> {
        self.rendered.as_ref().map(|(version, _)| *version)
    }

    pub fn is_stale(&self, editor: &StyleEditor, data: &str) -> bool {
        match &self.rendered {
            Some((version, drawn)) => *version != editor.version() || drawn != data,
            None => true,
        }
    }

    /// Redraw if the editor moved on or the payload changed.
    /// Returns whether a new surface was drawn.
    pub fn sync(&mut self, editor: &StyleEditor, data: &str) -> Result<bool, RenderError> {
        if !self.is_stale(editor, data) {
            return Ok(false);
        }
        self.clear();
        let surface = raster::render(editor.config(), data, self.scale)?;
        debug!(version = editor.version(), width = surface.width(), "rendered qr surface");
        self.surface = Some(surface);
        self.rendered = Some((editor.version(), data.to_string()));
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.surface = None;
        self.rendered = None;
    }

    /// Encode the current surface for download.
    pub fn export(&self, format: ExportFormat, epoch_ms: i64) -> Result<Export, RenderError> {
        let surface = self.surface.as_ref().ok_or(RenderError::NotRendered)?;
        Ok(Export {
            filename: export_filename(format, epoch_ms),
            content_type: format.content_type(),
            bytes: encode(surface, format)?,
        })
    }

    /// Release the surface; the target cannot be used afterwards.
    pub fn dispose(mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StylePreset;

    #[test]
    fn sync_only_redraws_when_stale() {
        let mut editor = StyleEditor::default();
        let mut target = RenderTarget::new(1);
        assert!(target.sync(&editor, "hello").unwrap());
        assert!(!target.sync(&editor, "hello").unwrap());
        assert_eq!(target.rendered_version(), Some(0));

        editor.apply_preset(StylePreset::Dots);
        assert!(target.is_stale(&editor, "hello"));
        assert!(target.sync(&editor, "hello").unwrap());
        assert_eq!(target.rendered_version(), Some(1));

        assert!(target.sync(&editor, "other").unwrap());
    }

    #[test]
    fn export_requires_a_surface() {
        let mut target = RenderTarget::new(1);
        assert!(matches!(
            target.export(ExportFormat::Png, 1),
            Err(RenderError::NotRendered)
        ));
        target.sync(&StyleEditor::default(), "hello").unwrap();
        let export = target.export(ExportFormat::Png, 42).unwrap();
        assert_eq!(export.filename, "qr-code-42.png");
        assert_eq!(export.content_type, "image/png");

        target.clear();
        assert!(target.surface().is_none());
        target.dispose();
    }
}
