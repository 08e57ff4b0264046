//! The hero panel: a rotating model behind a cycling, glowing label.
//!
//! [`HeroOrchestrator`] owns the two halves side by side and gives each its
//! own lifecycle. The model half waits behind a suspense boundary (a frame
//! subscription polling the [`AssetHandle`]) and renders nothing until the
//! load resolves. The label half starts immediately on mount. A timing domain
//! the host cannot provide only disables the animator that needed it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::animation::{GlowPulse, LabelVisual, RotationAnimator};
use crate::asset::{AssetHandle, AssetLoader, AssetState};
use crate::cycle::{CycleEvent, CycleState, LabelCycleController};
use crate::scene::{ComposedScene, SceneComposer};
use crate::schedule::{ScheduleError, Scheduler, Subscription};
use crate::settings::PanelSettings;

/// Which parts of the panel came up on the last mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountReport {
    pub suspense: Result<(), ScheduleError>,
    pub cycle: Result<(), ScheduleError>,
    pub glow: Result<(), ScheduleError>,
}

impl MountReport {
    pub fn is_complete(&self) -> bool {
        self.suspense.is_ok() && self.cycle.is_ok() && self.glow.is_ok()
    }

    pub fn failures(&self) -> Vec<(&'static str, ScheduleError)> {
        [
            ("suspense", self.suspense),
            ("cycle", self.cycle),
            ("glow", self.glow),
        ]
        .into_iter()
        .filter_map(|(name, result)| result.err().map(|err| (name, err)))
        .collect()
    }
}

impl fmt::Display for MountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures = self.failures();
        if failures.is_empty() {
            return write!(f, "all animators running");
        }
        for (i, (name, err)) in failures.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} unavailable ({})", name, err)?;
        }
        Ok(())
    }
}

/// Model half of the panel.
struct Stage {
    composer: SceneComposer,
    handle: Option<AssetHandle>,
    rotation: RotationAnimator,
    angular_step: f32,
    model_scale: f32,
}

impl Stage {
    fn reset(&mut self, handle: AssetHandle) {
        self.rotation.stop();
        self.rotation = RotationAnimator::new(self.angular_step);
        self.composer.detach_model();
        self.handle = Some(handle);
    }

    /// Returns true once the boundary has nothing left to wait for.
    fn resolve(&mut self, scheduler: &Scheduler) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return true;
        };

        let state = handle.poll().clone();
        let path = handle.path().to_string();
        match state {
            AssetState::Loading => false,
            AssetState::Ready(model) => {
                info!(
                    "Model {} ready: {} meshes, {} triangles",
                    path,
                    model.meshes().len(),
                    model.triangle_count()
                );
                let node = self.composer.attach_model(model, self.model_scale);
                if let Err(err) = self.rotation.start(scheduler, node) {
                    error!("Model rotation disabled: {}", err);
                }
                true
            }
            AssetState::Failed(err) => {
                warn!("Model {} unavailable ({}). Rendering the panel without it.", path, err);
                true
            }
        }
    }

    fn teardown(&mut self) {
        self.rotation.stop();
        if let Some(mut handle) = self.handle.take() {
            handle.cancel();
        }
        self.composer.detach_model();
    }
}

pub struct HeroOrchestrator {
    settings: PanelSettings,
    loader: AssetLoader,
    stage: Rc<RefCell<Stage>>,
    suspense: Rc<RefCell<Option<Subscription>>>,
    cycle: LabelCycleController,
    glow: GlowPulse,
    last_report: Option<MountReport>,
    mounted: bool,
}

impl HeroOrchestrator {
    pub fn new(settings: PanelSettings, loader: AssetLoader) -> Self {
        let stage = Stage {
            composer: SceneComposer::new(&settings.scene),
            handle: None,
            rotation: RotationAnimator::new(settings.model.angular_step),
            angular_step: settings.model.angular_step,
            model_scale: settings.model.scale,
        };

        Self {
            cycle: LabelCycleController::new(
                settings.labels.label_set(),
                settings.labels.timings(),
            ),
            glow: GlowPulse::new(settings.glow.timings()),
            settings,
            loader,
            stage: Rc::new(RefCell::new(stage)),
            suspense: Rc::new(RefCell::new(None)),
            last_report: None,
            mounted: false,
        }
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Receives every label state change while mounted.
    pub fn on_cycle_event<F>(&mut self, observer: F)
    where
        F: FnMut(&CycleEvent) + 'static,
    {
        self.cycle.set_observer(observer);
    }

    /// Starts loading the model and starts the label cycle. Mounting again
    /// first unmounts, so rotation and the cycle begin from their initial
    /// state.
    pub fn mount(&mut self, scheduler: &Scheduler) -> MountReport {
        if self.mounted {
            self.unmount();
        }
        info!("Mounting hero panel ({})", self.settings.model.path);

        let handle = self.loader.load(&self.settings.model.path);
        self.stage.borrow_mut().reset(handle);

        let suspense = self.start_suspense(scheduler);
        if let Err(err) = suspense {
            error!("Model stage disabled: {}", err);
        }

        let cycle = self.cycle.start(scheduler);
        if let Err(err) = cycle {
            error!("Label cycle disabled: {}", err);
        }

        self.glow.restart();
        let glow = self.glow.start(scheduler);
        if let Err(err) = glow {
            error!("Glow pulse disabled: {}", err);
        }

        let report = MountReport {
            suspense,
            cycle,
            glow,
        };
        if !report.is_complete() {
            warn!("Hero panel mounted partially: {}", report);
        }
        self.last_report = Some(report);
        self.mounted = true;
        report
    }

    fn start_suspense(&mut self, scheduler: &Scheduler) -> Result<(), ScheduleError> {
        if let Some(previous) = self.suspense.borrow_mut().take() {
            previous.cancel();
        }

        let stage = self.stage.clone();
        let slot = self.suspense.clone();
        let weak = scheduler.downgrade();
        let subscription = scheduler.subscribe_frame(move |_| {
            let Some(scheduler) = weak.upgrade() else {
                return;
            };
            let resolved = stage.borrow_mut().resolve(&scheduler);
            if resolved {
                debug!("Suspense boundary resolved");
                if let Some(own) = slot.borrow_mut().take() {
                    own.cancel();
                }
            }
        })?;

        *self.suspense.borrow_mut() = Some(subscription);
        Ok(())
    }

    /// Cancels every subscription and the in-flight load. Nothing mutates
    /// after this returns. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.suspense.borrow_mut().take() {
            subscription.cancel();
        }
        self.stage.borrow_mut().teardown();
        self.cycle.stop();
        self.glow.stop();

        if self.mounted {
            info!("Unmounted hero panel");
        }
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn last_report(&self) -> Option<MountReport> {
        self.last_report
    }

    pub fn scene(&self) -> ComposedScene {
        self.stage.borrow().composer.compose()
    }

    pub fn asset_state(&self) -> Option<AssetState> {
        self.stage
            .borrow()
            .handle
            .as_ref()
            .map(|handle| handle.state().clone())
    }

    pub fn is_waiting_on_model(&self) -> bool {
        self.suspense
            .borrow()
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }

    pub fn rotation_angle(&self) -> f32 {
        self.stage.borrow().rotation.angle()
    }

    pub fn is_rotating(&self) -> bool {
        self.stage.borrow().rotation.is_running()
    }

    pub fn cycle_state(&self) -> CycleState {
        self.cycle.state()
    }

    pub fn label_visual(&self) -> LabelVisual {
        let state = self.cycle.state();
        LabelVisual::compose(
            &self.cycle.label(),
            state.phase,
            self.cycle.phase_visual(),
            self.glow.sample(),
        )
    }
}

impl Drop for HeroOrchestrator {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetSource;
    use crate::cycle::Phase;
    use crate::schedule::HostCapabilities;
    use std::time::Duration;

    struct Missing;

    impl AssetSource for Missing {
        fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
            Err(format!("{} not found", path))
        }
    }

    fn orchestrator() -> HeroOrchestrator {
        HeroOrchestrator::new(PanelSettings::default(), AssetLoader::new(Missing))
    }

    fn wait_until_resolved(hero: &HeroOrchestrator, scheduler: &Scheduler) {
        for _ in 0..500 {
            scheduler.frame();
            if !hero.is_waiting_on_model() {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("model load never resolved");
    }

    #[test]
    fn label_starts_entering_first_label_on_mount() {
        let scheduler = Scheduler::new();
        let mut hero = orchestrator();
        let report = hero.mount(&scheduler);

        assert!(report.is_complete());
        let visual = hero.label_visual();
        assert_eq!(visual.text, "Analyzing");
        assert_eq!(visual.phase, Phase::Entering);
        assert_eq!(visual.opacity, 0.0);
    }

    #[test]
    fn failed_model_leaves_scene_empty_and_label_running() {
        let scheduler = Scheduler::new();
        let mut hero = orchestrator();
        hero.mount(&scheduler);
        wait_until_resolved(&hero, &scheduler);

        assert!(matches!(hero.asset_state(), Some(AssetState::Failed(_))));
        assert_eq!(hero.scene().model_count(), 0);
        assert!(!hero.is_rotating());

        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(hero.cycle_state().phase, Phase::Visible);
    }

    #[test]
    fn missing_timers_only_disable_label_animators() {
        let scheduler = Scheduler::with_capabilities(HostCapabilities::FRAME_LOOP);
        let mut hero = orchestrator();
        let report = hero.mount(&scheduler);

        assert!(report.suspense.is_ok());
        assert_eq!(report.cycle, Err(ScheduleError::TimersUnavailable));
        assert_eq!(report.glow, Err(ScheduleError::TimersUnavailable));
        assert_eq!(report.failures().len(), 2);
        assert!(hero.is_waiting_on_model());
    }

    #[test]
    fn unmount_is_idempotent_and_releases_everything() {
        let scheduler = Scheduler::new();
        let mut hero = orchestrator();
        hero.mount(&scheduler);
        assert!(scheduler.subscription_count() > 0);

        hero.unmount();
        hero.unmount();
        assert!(!hero.is_mounted());
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn report_lists_failures_by_name() {
        let report = MountReport {
            suspense: Ok(()),
            cycle: Err(ScheduleError::TimersUnavailable),
            glow: Ok(()),
        };
        assert_eq!(report.to_string(), "cycle unavailable (host has no timer service)");
    }
}
