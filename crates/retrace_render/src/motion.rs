use glam::Mat4;
use retrace_core::{Result, RetraceError};
use retrace_native::{NodeId, ParamValue, Universe};
use smallvec::SmallVec;

/// Native motion blur interpolates samples at even intervals, so sample
/// times must be evenly spaced.
pub fn ensure_uniform_time_samples(times: &[f32]) -> Result<()> {
    if times.len() < 3 {
        return Ok(());
    }
    let step = (times[times.len() - 1] - times[0]) / (times.len() - 1) as f32;
    let tolerance = step.abs() * 1e-4 + f32::EPSILON;
    for (i, t) in times.iter().enumerate() {
        let expected = times[0] + step * i as f32;
        if (t - expected).abs() > tolerance {
            return Err(RetraceError::NonUniformTimeSamples);
        }
    }
    Ok(())
}

/// A static or motion-blurred transform, remembered so that it can be
/// reapplied to nodes that are rebuilt later.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransformSamples {
    Static(Mat4),
    Animated {
        samples: SmallVec<[Mat4; 2]>,
        motion_start: f32,
        motion_end: f32,
    },
}

impl TransformSamples {
    pub fn animated(samples: &[Mat4], times: &[f32]) -> Result<Self> {
        if samples.len() != times.len() {
            return Err(RetraceError::MismatchedTimeSamples {
                samples: samples.len(),
                times: times.len(),
            });
        }
        ensure_uniform_time_samples(times)?;
        match (samples, times) {
            ([single], _) => Ok(TransformSamples::Static(*single)),
            (_, [first, .., last]) => Ok(TransformSamples::Animated {
                samples: samples.iter().copied().collect(),
                motion_start: *first,
                motion_end: *last,
            }),
            _ => Err(RetraceError::NonUniformTimeSamples),
        }
    }

    /// Writes the transform to `parameter`, plus the motion range when
    /// animated.
    pub fn apply(&self, universe: &Universe, node: NodeId, parameter: &str) {
        match self {
            TransformSamples::Static(m) => universe.set(node, parameter, *m),
            TransformSamples::Animated {
                samples,
                motion_start,
                motion_end,
            } => {
                universe.set(
                    node,
                    parameter,
                    ParamValue::Array(samples.iter().copied().map(ParamValue::Matrix).collect()),
                );
                universe.set(node, "motion_start", *motion_start);
                universe.set(node, "motion_end", *motion_end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_spacing_is_accepted() {
        assert!(ensure_uniform_time_samples(&[-0.25, 0.0, 0.25]).is_ok());
        assert!(ensure_uniform_time_samples(&[0.0, 1.0]).is_ok());
        assert!(ensure_uniform_time_samples(&[0.0, 0.1, 0.5]).is_err());
    }

    #[test]
    fn single_sample_is_static() {
        let t = TransformSamples::animated(&[Mat4::IDENTITY], &[0.0]).unwrap();
        assert_eq!(t, TransformSamples::Static(Mat4::IDENTITY));
    }

    #[test]
    fn sample_and_time_counts_must_match() {
        let samples = [Mat4::IDENTITY, Mat4::from_translation(glam::Vec3::X)];
        assert!(matches!(
            TransformSamples::animated(&samples, &[0.0, 0.5, 1.0]),
            Err(RetraceError::MismatchedTimeSamples { samples: 2, times: 3 })
        ));
        assert!(matches!(
            TransformSamples::animated(&samples[..1], &[0.0, 1.0]),
            Err(RetraceError::MismatchedTimeSamples { samples: 1, times: 2 })
        ));
        assert!(TransformSamples::animated(&samples, &[0.0, 1.0]).is_ok());
    }
}
