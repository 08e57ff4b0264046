use winit::dpi::PhysicalSize;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Depth attachment that tracks the surface size it was allocated for.
pub struct Depth {
    view: wgpu::TextureView,
    extent: (u32, u32),
}

impl Depth {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let extent = (size.width.max(1), size.height.max(1));
        Self {
            view: allocate(device, extent),
            extent,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        DEPTH_FORMAT
    }

    /// Reallocates only when the surface extent actually changed.
    pub fn fit(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        let extent = (size.width.max(1), size.height.max(1));
        if extent != self.extent {
            self.view = allocate(device, extent);
            self.extent = extent;
        }
    }
}

fn allocate(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("PanelDepth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
