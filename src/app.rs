// app.rs
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::asset::{AssetLoader, FsSource};
use crate::hero::HeroOrchestrator;
use crate::renderer::Gpu;
use crate::schedule::Scheduler;
use crate::settings::Settings;
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::ui::EguiContext;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};

/// Continuous redraw loop that pauses while the window is occluded.
#[derive(Debug, Default)]
struct RedrawLoop {
    occluded: bool,
}

impl RedrawLoop {
    fn is_paused(&self) -> bool {
        self.occluded
    }

    /// Returns true when the change resumes a paused loop, in which case the
    /// caller must request the next redraw itself.
    fn set_occluded(&mut self, occluded: bool) -> bool {
        let resumed = self.occluded && !occluded;
        self.occluded = occluded;
        resumed
    }
}

/// Hosts the hero panel in a winit window.
///
/// Every redraw advances the scheduler by the measured wall-clock delta and
/// then signals one frame. While the window is occluded no redraws are
/// requested; the first redraw after it reappears advances the clock by the
/// whole gap, so interval timers keep wall-clock time and the frame loop
/// pauses like a hidden browser tab.
pub struct HeroApp {
    settings: Settings,
    scheduler: Scheduler,
    hero: HeroOrchestrator,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    gpu: Option<Gpu>,
    #[cfg(target_arch = "wasm32")]
    pending_gpu: Rc<RefCell<Option<Gpu>>>,
    #[cfg(feature = "egui")]
    egui: Option<EguiContext>,
    redraw_loop: RedrawLoop,
    #[cfg(not(feature = "egui"))]
    shown_title: String,
}

impl HeroApp {
    pub fn new(settings: Settings) -> Self {
        let loader = AssetLoader::new(FsSource::default());
        let hero = HeroOrchestrator::new(settings.panel.clone(), loader);

        Self {
            #[cfg(not(feature = "egui"))]
            shown_title: settings.window.title.clone(),
            settings,
            scheduler: Scheduler::new(),
            hero,
            clock: FrameClock::new(),
            window: None,
            window_id: None,
            gpu: None,
            #[cfg(target_arch = "wasm32")]
            pending_gpu: Rc::new(RefCell::new(None)),
            #[cfg(feature = "egui")]
            egui: None,
            redraw_loop: RedrawLoop::default(),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        let resolution = &self.settings.window.resolution;
        let attributes = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));

        #[cfg(target_arch = "wasm32")]
        let attributes = {
            use winit::platform::web::WindowAttributesExtWebSys;
            attributes.with_append(true)
        };

        match event_loop.create_window(attributes) {
            Ok(window) => Some(Arc::new(window)),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn init_gpu(&mut self, window: Arc<Window>, event_loop: &ActiveEventLoop) {
        match pollster::block_on(Gpu::new(window, &self.settings.window)) {
            Ok(gpu) => self.attach_gpu(gpu),
            Err(err) => {
                log::error!("{}", err);
                event_loop.exit();
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn init_gpu(&mut self, window: Arc<Window>, _event_loop: &ActiveEventLoop) {
        let slot = self.pending_gpu.clone();
        let settings = self.settings.window.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match Gpu::new(window.clone(), &settings).await {
                Ok(gpu) => {
                    *slot.borrow_mut() = Some(gpu);
                    window.request_redraw();
                }
                Err(err) => log::error!("{}", err),
            }
        });
    }

    fn attach_gpu(&mut self, gpu: Gpu) {
        #[cfg(feature = "egui")]
        {
            if let Some(window) = &self.window {
                self.egui = Some(EguiContext::new(gpu.device(), gpu.surface_format(), window));
            }
        }
        self.gpu = Some(gpu);
    }

    fn mount(&mut self) {
        let report = self.hero.mount(&self.scheduler);
        log::info!("Hero panel mounted: {}", report);
        self.clock.reset();
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.hero.unmount();
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let dt = self.clock.tick();
        self.scheduler.advance(dt);
        if self.redraw_loop.is_paused() {
            return;
        }
        self.scheduler.frame();

        #[cfg(target_arch = "wasm32")]
        {
            let pending = self.pending_gpu.borrow_mut().take();
            if let Some(gpu) = pending {
                self.attach_gpu(gpu);
            }
        }

        let scene = self.hero.scene();
        let visual = self.hero.label_visual();

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        #[cfg(feature = "egui")]
        let result = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => {
                let output = egui.run(window, |ctx| crate::ui::paint_label(ctx, &visual));
                gpu.render_with_overlay(&scene, |target| egui.render(target, window, output))
            }
            _ => gpu.render(&scene),
        };

        #[cfg(not(feature = "egui"))]
        let result = {
            let title = crate::ui::window_title(&self.settings.window.title, &visual);
            if title != self.shown_title {
                if let Some(window) = &self.window {
                    window.set_title(&title);
                }
                self.shown_title = title;
            }
            gpu.render(&scene)
        };

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.size();
                gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
            }
            Err(err) => log::warn!("Skipped frame: {:?}", err),
        }
    }
}

impl ApplicationHandler for HeroApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let Some(window) = self.create_window(event_loop) else {
            return;
        };
        self.window_id = Some(window.id());
        self.window = Some(window.clone());

        self.init_gpu(window.clone(), event_loop);
        self.mount();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        #[cfg(feature = "egui")]
        {
            if let (Some(egui), Some(window)) = (self.egui.as_mut(), self.window.as_ref()) {
                egui.handle_event(window, &event);
            }
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) {
                    gpu.resize(window.inner_size());
                }
            }
            WindowEvent::Occluded(occluded) => {
                log::debug!("Window occluded: {}", occluded);
                if self.redraw_loop.set_occluded(occluded) {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if !self.redraw_loop.is_paused() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.shutdown(event_loop);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.hero.unmount();
    }
}
