use super::GridRenderer;

/// Pick `requested` when supported, else Fifo (always supported) or the first
/// mode the surface offers.
pub(crate) fn select_present_mode(
    requested: wgpu::PresentMode,
    supported: &[wgpu::PresentMode],
) -> wgpu::PresentMode {
    if supported.contains(&requested) {
        return requested;
    }
    log::warn!(
        "Requested present mode {:?} not supported (available: {:?}), falling back",
        requested,
        supported
    );
    if supported.contains(&wgpu::PresentMode::Fifo) || supported.is_empty() {
        wgpu::PresentMode::Fifo
    } else {
        supported[0]
    }
}

/// Prefer an opaque surface, then the compositing modes, then whatever is offered.
pub(crate) fn select_alpha_mode(supported: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    [
        wgpu::CompositeAlphaMode::Opaque,
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
        wgpu::CompositeAlphaMode::Auto,
    ]
    .into_iter()
    .find(|mode| supported.contains(mode))
    .or_else(|| supported.first().copied())
    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

impl GridRenderer {
    pub fn reconfigure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Resize the surface to the window's new physical size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("Surface resized to {}x{}", width, height);
    }
}
