// egui_integration.rs: label overlay host for egui 0.33

use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::renderer::OverlayTarget;

pub struct EguiContext {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl EguiContext {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let viewport_id = ctx.viewport_id();

        let state = egui_winit::State::new(
            ctx.clone(),
            viewport_id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let renderer = egui_wgpu::Renderer::new(
            device,
            output_format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            ctx,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Runs one egui pass and returns what it produced.
    pub fn run<F>(&mut self, window: &Window, ui: F) -> egui::FullOutput
    where
        F: FnOnce(&egui::Context),
    {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
        ui(&self.ctx);
        let output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, output.platform_output.clone());
        output
    }

    /// Paints `output` over the lit frame in `target`.
    pub fn render(&mut self, target: &mut OverlayTarget<'_>, window: &Window, output: egui::FullOutput) {
        let [width, height] = target.surface_size;
        if width == 0 || height == 0 {
            return;
        }

        let screen = ScreenDescriptor {
            size_in_pixels: target.surface_size,
            pixels_per_point: window.scale_factor() as f32,
        };
        let primitives = self.upload(
            target,
            &screen,
            output.shapes,
            output.pixels_per_point,
            &output.textures_delta,
        );
        self.paint(target, &screen, &primitives);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn upload(
        &mut self,
        target: &mut OverlayTarget<'_>,
        screen: &ScreenDescriptor,
        shapes: Vec<egui::epaint::ClippedShape>,
        pixels_per_point: f32,
        textures: &egui::TexturesDelta,
    ) -> Vec<egui::ClippedPrimitive> {
        for (id, delta) in &textures.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }

        let primitives = self.ctx.tessellate(shapes, pixels_per_point);
        self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &primitives,
            screen,
        );
        primitives
    }

    fn paint(
        &mut self,
        target: &mut OverlayTarget<'_>,
        screen: &ScreenDescriptor,
        primitives: &[egui::ClippedPrimitive],
    ) {
        let pass = target
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("LabelOverlayPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        // egui-wgpu wants a 'static pass.
        let mut pass = pass.forget_lifetime();
        self.renderer.render(&mut pass, primitives, screen);
    }

    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }
}
