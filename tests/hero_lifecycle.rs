//! Mounting and unmounting the whole panel against a simulated host.

mod common;

use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

use common::{MemorySource, StalledSource, TRIANGLE_PATH};
use hero_panel::asset::AssetLoader;
use hero_panel::cycle::Phase;
use hero_panel::schedule::{HostCapabilities, ScheduleError};
use hero_panel::settings::PanelSettings;
use hero_panel::{HeroOrchestrator, Scheduler};

const FRAME: Duration = Duration::from_millis(16);

fn settings() -> PanelSettings {
    let mut settings = PanelSettings::default();
    settings.model.path = TRIANGLE_PATH.to_string();
    settings
}

fn step(scheduler: &Scheduler) {
    scheduler.advance(FRAME);
    scheduler.frame();
}

fn wait_until_resolved(hero: &HeroOrchestrator, scheduler: &Scheduler) {
    for _ in 0..1000 {
        step(scheduler);
        if !hero.is_waiting_on_model() {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("model never resolved");
}

#[test]
fn ready_model_appears_and_rotates_one_step_per_frame() {
    let scheduler = Scheduler::new();
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(MemorySource::with_triangle()));
    hero.mount(&scheduler);
    assert_eq!(hero.scene().model_count(), 0);

    wait_until_resolved(&hero, &scheduler);
    assert_eq!(hero.scene().model_count(), 1);
    assert!(hero.is_rotating());

    let step_size = hero.settings().model.angular_step;
    let mut previous = hero.rotation_angle();
    for _ in 0..200 {
        step(&scheduler);
        let angle = hero.rotation_angle();
        let delta = (angle - previous).rem_euclid(TAU);
        assert!((delta - step_size).abs() < 1e-5, "delta {}", delta);
        previous = angle;
    }
}

#[test]
fn unmount_stops_every_timing_domain() {
    let scheduler = Scheduler::new();
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(MemorySource::with_triangle()));

    let calls = Rc::new(Cell::new(0usize));
    let counter = calls.clone();
    hero.on_cycle_event(move |_| counter.set(counter.get() + 1));

    hero.mount(&scheduler);
    wait_until_resolved(&hero, &scheduler);
    for _ in 0..300 {
        step(&scheduler);
    }
    assert!(calls.get() > 0);

    hero.unmount();
    assert_eq!(scheduler.subscription_count(), 0);

    let seen = calls.get();
    let angle = hero.rotation_angle();
    let cycle = hero.cycle_state();
    let scene_models = hero.scene().model_count();
    for _ in 0..1000 {
        step(&scheduler);
    }

    assert_eq!(calls.get(), seen);
    assert_eq!(hero.rotation_angle(), angle);
    assert_eq!(hero.cycle_state(), cycle);
    assert_eq!(scene_models, 0);
}

#[test]
fn unmount_during_load_discards_the_result() {
    let (source, gate, _) = StalledSource::new();
    let scheduler = Scheduler::new();
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(source));

    hero.mount(&scheduler);
    step(&scheduler);
    hero.unmount();
    drop(gate);

    for _ in 0..50 {
        step(&scheduler);
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(hero.scene().model_count(), 0);
    assert_eq!(scheduler.subscription_count(), 0);
}

#[test]
fn unresolved_load_keeps_scene_empty_while_label_cycles() {
    let (source, gate, _) = StalledSource::new();
    let scheduler = Scheduler::new();
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(source));
    hero.mount(&scheduler);

    let mut saw_exiting = false;
    for _ in 0..1000 {
        step(&scheduler);
        assert_eq!(hero.scene().model_count(), 0);
        saw_exiting |= hero.cycle_state().phase == Phase::Exiting;
    }

    assert!(hero.is_waiting_on_model());
    assert!(!hero.is_rotating());
    assert!(saw_exiting);

    hero.unmount();
    drop(gate);
}

#[test]
fn missing_frame_loop_leaves_labels_running() {
    let scheduler = Scheduler::with_capabilities(HostCapabilities::TIMERS);
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(MemorySource::with_triangle()));

    let report = hero.mount(&scheduler);
    assert_eq!(report.suspense, Err(ScheduleError::FrameLoopUnavailable));
    assert!(report.cycle.is_ok());
    assert!(report.glow.is_ok());

    scheduler.advance(Duration::from_millis(2600));
    assert_eq!(hero.cycle_state().phase, Phase::Exiting);
    assert_eq!(hero.scene().model_count(), 0);
}

#[test]
fn remount_restarts_from_first_label_and_reuses_model() {
    let source = MemorySource::with_triangle();
    let scheduler = Scheduler::new();
    let mut hero = HeroOrchestrator::new(settings(), AssetLoader::new(source.clone()));

    hero.mount(&scheduler);
    wait_until_resolved(&hero, &scheduler);
    for _ in 0..400 {
        step(&scheduler);
    }
    assert_ne!(hero.label_visual().text, "Analyzing");

    hero.mount(&scheduler);
    assert_eq!(hero.label_visual().text, "Analyzing");
    assert_eq!(hero.label_visual().phase, Phase::Entering);
    assert_eq!(hero.rotation_angle(), 0.0);

    // The cached model resolves on the first frame.
    step(&scheduler);
    assert!(!hero.is_waiting_on_model());
    assert_eq!(hero.scene().model_count(), 1);
    assert_eq!(source.fetches(TRIANGLE_PATH), 1);
}
