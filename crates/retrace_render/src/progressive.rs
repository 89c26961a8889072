//! Progressive Render Controller
//!
//! Interactive sessions render in a background thread, refining from a
//! coarse `AA_samples` value up to the configured one:
//!
//! ```text
//!   start=-5, final=3:   -5  -4  -3  -2  -1  1  3
//!                                           ▲  ▲
//!                        0 is skipped ──────┘  └── values between 1 and
//!                                                  final are skipped
//! ```
//!
//! Each step is one blocking engine call. Stopping clears a shared flag,
//! interrupts the engine and joins the worker, so that the caller may edit
//! the scene as soon as [`ProgressiveRender::set_rendering`] returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{debug, error};
use retrace_native::{RenderEngine, RenderMode, RenderStatus, Universe};

const AA_SAMPLES: &str = "AA_samples";

/// The sequence of `AA_samples` values rendered for one refinement.
#[must_use]
pub fn aa_sample_steps(start: i32, final_samples: i32) -> Vec<i32> {
    (start.min(final_samples)..=final_samples)
        .filter(|&aa| aa != 0 && (aa <= 1 || aa == final_samples))
        .collect()
}

pub struct ProgressiveRender {
    universe: Arc<Universe>,
    engine: Arc<dyn RenderEngine>,
    start_aa_samples: i32,
    rendering: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressiveRender {
    #[must_use]
    pub fn new(universe: Arc<Universe>, engine: Arc<dyn RenderEngine>, start_aa_samples: i32) -> Self {
        Self {
            universe,
            engine,
            start_aa_samples,
            rendering: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Whether a refinement has been started and not yet stopped. Stays
    /// true after the worker finishes on its own.
    #[inline]
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.worker.is_some()
    }

    pub fn set_rendering(&mut self, rendering: bool) {
        if rendering == self.is_rendering() {
            return;
        }
        if rendering {
            self.start();
        } else {
            self.stop();
        }
    }

    fn start(&mut self) {
        self.rendering.store(true, Ordering::Release);
        let universe = self.universe.clone();
        let engine = self.engine.clone();
        let flag = self.rendering.clone();
        let start = self.start_aa_samples;

        let spawned = std::thread::Builder::new()
            .name("retrace-progressive".into())
            .spawn(move || refine(&universe, engine.as_ref(), &flag, start));
        match spawned {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                self.rendering.store(false, Ordering::Release);
                error!("Unable to start progressive render: {e}");
            }
        }
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.rendering.store(false, Ordering::Release);
        if self.engine.is_rendering() {
            self.engine.interrupt();
        }
        if worker.join().is_err() {
            error!("Progressive render thread panicked");
        }
    }
}

impl Drop for ProgressiveRender {
    fn drop(&mut self) {
        self.stop();
    }
}

fn refine(universe: &Universe, engine: &dyn RenderEngine, rendering: &AtomicBool, start: i32) {
    let options = universe.options();
    let final_samples = universe.get_int(options, AA_SAMPLES);

    for aa in aa_sample_steps(start, final_samples) {
        universe.set(options, AA_SAMPLES, aa);
        if !rendering.load(Ordering::Acquire) {
            break;
        }
        let status = engine.render(universe, RenderMode::Camera);
        if status != RenderStatus::Success {
            debug!("Progressive render stopped at AA_samples {aa}: {status:?}");
            break;
        }
    }

    universe.set(options, AA_SAMPLES, final_samples);
}
