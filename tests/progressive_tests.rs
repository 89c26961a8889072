//! Progressive render tests
//!
//! Tests for:
//! - The AA_samples refinement sequence
//! - Starting, finishing and stopping the background worker
//! - Interrupting a pass in flight
//! - Interactive sessions driving the controller

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::*;
use retrace::prelude::*;
use retrace::retrace_render::{ProgressiveRender, aa_sample_steps};

fn universe_with_samples(aa_samples: i32) -> Arc<Universe> {
    let universe = Arc::new(Universe::new(NativeVersion::default()));
    universe.set(universe.options(), "AA_samples", aa_samples);
    universe
}

fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        std::thread::yield_now();
    }
}

// ============================================================================
// Sample Steps
// ============================================================================

#[test]
fn steps_refine_from_negative_samples() {
    assert_eq!(aa_sample_steps(-5, 3), vec![-5, -4, -3, -2, -1, 1, 3]);
    assert_eq!(aa_sample_steps(-2, 1), vec![-2, -1, 1]);
}

#[test]
fn steps_skip_intermediate_positive_samples() {
    assert_eq!(aa_sample_steps(1, 8), vec![1, 8]);
    assert_eq!(aa_sample_steps(-1, 6), vec![-1, 1, 6]);
}

#[test]
fn steps_start_at_final_when_it_is_lower() {
    assert_eq!(aa_sample_steps(3, 2), vec![2]);
    assert_eq!(aa_sample_steps(-5, -3), vec![-5, -4, -3]);
}

#[test]
fn zero_final_samples_keep_negative_steps() {
    assert_eq!(aa_sample_steps(0, 0), Vec::<i32>::new());
    assert_eq!(aa_sample_steps(-2, 0), vec![-2, -1]);
}

// ============================================================================
// Controller
// ============================================================================

#[test]
fn refinement_renders_every_step_and_restores_samples() {
    init_logging();
    let universe = universe_with_samples(3);
    let engine = Arc::new(MockEngine::default());
    let mut progressive = ProgressiveRender::new(universe.clone(), engine.clone(), -5);

    progressive.set_rendering(true);
    assert!(progressive.is_rendering());
    wait_until(|| engine.passes() == 7);
    progressive.set_rendering(false);

    assert!(!progressive.is_rendering());
    assert_eq!(*engine.aa_samples.lock(), vec![-5, -4, -3, -2, -1, 1, 3]);
    assert_eq!(universe.get_int(universe.options(), "AA_samples"), 3);
    assert_eq!(engine.interrupts.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_pass_ends_refinement() {
    init_logging();
    let universe = universe_with_samples(4);
    let engine = Arc::new(MockEngine::with_statuses(vec![
        RenderStatus::Success,
        RenderStatus::Error,
    ]));
    let mut progressive = ProgressiveRender::new(universe.clone(), engine.clone(), -2);

    progressive.set_rendering(true);
    progressive.set_rendering(false);

    let rendered = engine.aa_samples.lock().clone();
    assert!(rendered.len() <= 2);
    assert_eq!(&rendered[..], &[-2, -1][..rendered.len()]);
    assert_eq!(universe.get_int(universe.options(), "AA_samples"), 4);
}

#[test]
fn stopping_interrupts_the_pass_in_flight() {
    init_logging();
    let universe = universe_with_samples(3);
    let engine = Arc::new(MockEngine::blocking());
    let mut progressive = ProgressiveRender::new(universe.clone(), engine.clone(), -5);

    progressive.set_rendering(true);
    wait_until(|| engine.is_rendering());
    progressive.set_rendering(false);

    assert_eq!(engine.interrupts.load(Ordering::SeqCst), 1);
    assert_eq!(*engine.aa_samples.lock(), vec![-5]);
    assert_eq!(universe.get_int(universe.options(), "AA_samples"), 3);
}

#[test]
fn repeated_requests_are_ignored() {
    init_logging();
    let universe = universe_with_samples(1);
    let engine = Arc::new(MockEngine::blocking());
    let mut progressive = ProgressiveRender::new(universe, engine.clone(), 1);

    progressive.set_rendering(false);
    assert!(!progressive.is_rendering());

    progressive.set_rendering(true);
    wait_until(|| engine.is_rendering());
    progressive.set_rendering(true);
    assert_eq!(engine.passes(), 1);

    drop(progressive);
    assert_eq!(engine.interrupts.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Interactive Sessions
// ============================================================================

#[test]
fn interactive_render_runs_until_paused() {
    let f = Fixture::with_engine(
        RendererSettings::new(RenderType::Interactive),
        MockEngine::blocking(),
    );
    f.renderer.option("ai:AA_samples", Some(&2_i32.into()));

    f.renderer.render().unwrap();
    assert!(f.renderer.is_rendering());
    wait_until(|| f.engine.is_rendering());

    f.renderer.pause();
    assert!(!f.renderer.is_rendering());
    assert_eq!(*f.engine.aa_samples.lock(), vec![-5]);
    assert_eq!(f.universe().get_int(f.universe().options(), "AA_samples"), 2);
}

#[test]
fn start_samples_come_from_settings() {
    let mut settings = RendererSettings::new(RenderType::Interactive);
    settings.progressive.start_aa_samples = -1;
    let f = Fixture::with_engine(settings, MockEngine::default());
    f.renderer.option("ai:AA_samples", Some(&3_i32.into()));

    f.renderer.render().unwrap();
    wait_until(|| f.engine.passes() == 3);
    f.renderer.pause();

    assert_eq!(*f.engine.aa_samples.lock(), vec![-1, 1, 3]);
}
