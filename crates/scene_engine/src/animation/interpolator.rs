//! Keyframe evaluation
//!
//! Pure functions: a clip and a time in, property values out. Nothing here
//! knows about entities or playback.

use std::collections::BTreeMap;

use super::clip::{AnimatedProperty, AnimationClip, MultiTrackClip, SingleTrackClip, TrackValue};
use crate::foundation::math::{lerp, Color};

/// Evaluated property values of a clip at one instant
pub type AnimationSample = BTreeMap<AnimatedProperty, TrackValue>;

/// Keyframes surrounding an evaluation time
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bracket<'a, T> {
    /// Time is clamped onto a keyframe, or both ends share a timestamp
    At(&'a T),
    /// Time lies strictly between two distinct timestamps
    Between { prev: &'a T, next: &'a T, ratio: f32 },
}

/// Locate the first keyframe pair with `prev.time <= t <= next.time`
///
/// Times before the first keyframe clamp to it, times after the last clamp to
/// the last one.
fn bracket<T>(frames: &[T], time_of: impl Fn(&T) -> f32, t: f32) -> Option<Bracket<'_, T>> {
    let first = frames.first()?;
    let last = frames.last()?;

    if t.is_nan() || t <= time_of(first) {
        return Some(Bracket::At(first));
    }
    if t >= time_of(last) {
        return Some(Bracket::At(last));
    }

    let (prev, next) = frames
        .windows(2)
        .map(|w| (&w[0], &w[1]))
        .find(|(prev, next)| time_of(prev) <= t && t <= time_of(next))?;

    let span = time_of(next) - time_of(prev);
    if span == 0.0 {
        return Some(Bracket::At(prev));
    }
    Some(Bracket::Between {
        prev,
        next,
        ratio: (t - time_of(prev)) / span,
    })
}

/// Blend two keyframe values with `ratio` in `0.0..=1.0`
///
/// Numbers lerp, 4-tuples lerp component-wise, text picks the nearer end.
/// Mismatched kinds keep the earlier value.
pub fn blend(prev: &TrackValue, next: &TrackValue, ratio: f32) -> TrackValue {
    match (prev, next) {
        (TrackValue::Number(a), TrackValue::Number(b)) => TrackValue::Number(lerp(*a, *b, ratio)),
        (TrackValue::Color(a), TrackValue::Color(b)) => {
            TrackValue::Color(Color(*a).lerp(Color(*b), ratio).0)
        }
        (TrackValue::Text(a), TrackValue::Text(b)) => {
            TrackValue::Text(if ratio < 0.5 { a.clone() } else { b.clone() })
        }
        _ => prev.clone(),
    }
}

/// Evaluate a single-track clip at `t`
pub fn evaluate_single(clip: &SingleTrackClip, t: f32) -> Option<TrackValue> {
    match bracket(&clip.keyframes, |k| k.time, t)? {
        Bracket::At(frame) => Some(frame.value.clone()),
        Bracket::Between { prev, next, ratio } => Some(blend(&prev.value, &next.value, ratio)),
    }
}

/// Evaluate a multi-track clip at `t`
///
/// Every property present on either side of the bracket is evaluated
/// independently; one present on only one side takes that side's value.
pub fn evaluate_multi(clip: &MultiTrackClip, t: f32) -> AnimationSample {
    let Some(found) = bracket(&clip.keyframes, |k| k.time, t) else {
        return AnimationSample::new();
    };

    match found {
        Bracket::At(frame) => frame.values.clone(),
        Bracket::Between { prev, next, ratio } => {
            let mut sample = AnimationSample::new();
            for property in prev.values.keys().chain(next.values.keys()) {
                if sample.contains_key(property) {
                    continue;
                }
                let value = match (prev.values.get(property), next.values.get(property)) {
                    (Some(a), Some(b)) => blend(a, b, ratio),
                    (Some(a), None) => a.clone(),
                    (None, Some(b)) => b.clone(),
                    (None, None) => continue,
                };
                sample.insert(*property, value);
            }
            sample
        }
    }
}

/// Evaluate any clip at `t`
pub fn evaluate(clip: &AnimationClip, t: f32) -> AnimationSample {
    match clip {
        AnimationClip::Single(single) => evaluate_single(single, t)
            .map(|value| AnimationSample::from([(single.property_name, value)]))
            .unwrap_or_default(),
        AnimationClip::Multi(multi) => evaluate_multi(multi, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::{Keyframe, MultiKeyframe};
    use approx::assert_relative_eq;

    fn number(sample: &AnimationSample, property: AnimatedProperty) -> f32 {
        match sample.get(&property) {
            Some(TrackValue::Number(v)) => *v,
            other => panic!("expected number for {property:?}, got {other:?}"),
        }
    }

    fn slide() -> AnimationClip {
        AnimationClip::single(
            AnimatedProperty::X,
            vec![
                Keyframe::new(0.0, TrackValue::Number(0.0)),
                Keyframe::new(2.0, TrackValue::Number(100.0)),
            ],
            2.0,
        )
    }

    #[test]
    fn test_midpoint_of_two_keyframes() {
        let sample = evaluate(&slide(), 1.0);
        assert_relative_eq!(number(&sample, AnimatedProperty::X), 50.0);
    }

    #[test]
    fn test_endpoints_match_first_and_last_keyframes() {
        let clip = AnimationClip::single(
            AnimatedProperty::Width,
            vec![
                Keyframe::new(0.0, TrackValue::Number(10.0)),
                Keyframe::new(1.0, TrackValue::Number(40.0)),
                Keyframe::new(3.0, TrackValue::Number(25.0)),
            ],
            4.0,
        );
        assert_relative_eq!(number(&evaluate(&clip, 0.0), AnimatedProperty::Width), 10.0);
        assert_relative_eq!(
            number(&evaluate(&clip, clip.duration()), AnimatedProperty::Width),
            25.0
        );
    }

    #[test]
    fn test_out_of_range_times_clamp() {
        assert_relative_eq!(number(&evaluate(&slide(), -5.0), AnimatedProperty::X), 0.0);
        assert_relative_eq!(number(&evaluate(&slide(), 9.0), AnimatedProperty::X), 100.0);
    }

    #[test]
    fn test_equal_timestamps_return_earlier_value() {
        let clip = SingleTrackClip {
            property_name: AnimatedProperty::Y,
            keyframes: vec![
                Keyframe::new(0.0, TrackValue::Number(0.0)),
                Keyframe::new(1.0, TrackValue::Number(5.0)),
                Keyframe::new(1.0, TrackValue::Number(50.0)),
                Keyframe::new(2.0, TrackValue::Number(60.0)),
            ],
            duration: 2.0,
        };
        let frames = &clip.keyframes[1..3];
        assert_eq!(
            bracket(frames, |k| k.time, 1.0),
            Some(Bracket::At(&frames[0]))
        );
        assert_relative_eq!(
            match evaluate_single(&clip, 1.5) {
                Some(TrackValue::Number(v)) => v,
                other => panic!("unexpected {other:?}"),
            },
            55.0
        );
    }

    #[test]
    fn test_color_interpolates_component_wise() {
        let clip = AnimationClip::single(
            AnimatedProperty::Color,
            vec![
                Keyframe::new(0.0, TrackValue::Color([0.0, 0.0, 1.0, 1.0])),
                Keyframe::new(1.0, TrackValue::Color([1.0, 0.5, 0.0, 0.0])),
            ],
            1.0,
        );
        let sample = evaluate(&clip, 0.25);
        let Some(TrackValue::Color(c)) = sample.get(&AnimatedProperty::Color) else {
            panic!("expected color");
        };
        assert_relative_eq!(c[0], 0.25);
        assert_relative_eq!(c[1], 0.125);
        assert_relative_eq!(c[2], 0.75);
        assert_relative_eq!(c[3], 0.75);
    }

    #[test]
    fn test_multi_track_mixes_lerp_threshold_and_one_sided_keys() {
        let clip = AnimationClip::multi(
            vec![
                MultiKeyframe::new(0.0)
                    .with(AnimatedProperty::X, TrackValue::Number(0.0))
                    .with(AnimatedProperty::Texture, TrackValue::Text("idle".into()))
                    .with(AnimatedProperty::Width, TrackValue::Number(32.0)),
                MultiKeyframe::new(2.0)
                    .with(AnimatedProperty::X, TrackValue::Number(10.0))
                    .with(AnimatedProperty::Texture, TrackValue::Text("run".into()))
                    .with(AnimatedProperty::Height, TrackValue::Number(64.0)),
            ],
            2.0,
        );

        let early = evaluate(&clip, 0.5);
        assert_relative_eq!(number(&early, AnimatedProperty::X), 2.5);
        assert_eq!(
            early.get(&AnimatedProperty::Texture),
            Some(&TrackValue::Text("idle".into()))
        );
        assert_relative_eq!(number(&early, AnimatedProperty::Width), 32.0);
        assert_relative_eq!(number(&early, AnimatedProperty::Height), 64.0);

        let late = evaluate(&clip, 1.0);
        assert_eq!(
            late.get(&AnimatedProperty::Texture),
            Some(&TrackValue::Text("run".into()))
        );
    }

    #[test]
    fn test_multi_track_endpoints_match_first_and_last_keyframes() {
        let first = MultiKeyframe::new(0.0)
            .with(AnimatedProperty::Y, TrackValue::Number(4.0))
            .with(AnimatedProperty::Texture, TrackValue::Text("closed".into()))
            .with(AnimatedProperty::Rotation, TrackValue::Number(0.5));
        let middle = MultiKeyframe::new(1.0)
            .with(AnimatedProperty::Y, TrackValue::Number(12.0))
            .with(AnimatedProperty::Texture, TrackValue::Text("ajar".into()));
        let last = MultiKeyframe::new(3.0)
            .with(AnimatedProperty::Y, TrackValue::Number(-2.0))
            .with(AnimatedProperty::Texture, TrackValue::Text("open".into()))
            .with(AnimatedProperty::Color, TrackValue::Color([1.0, 0.0, 0.0, 1.0]));
        let clip = AnimationClip::multi(vec![first.clone(), middle, last.clone()], 3.0);

        let start = evaluate(&clip, 0.0);
        assert_eq!(start, first.values);
        assert!(!start.contains_key(&AnimatedProperty::Color));

        let end = evaluate(&clip, clip.duration());
        assert_eq!(end, last.values);
        assert!(!end.contains_key(&AnimatedProperty::Rotation));
        assert_eq!(
            end.get(&AnimatedProperty::Texture),
            Some(&TrackValue::Text("open".into()))
        );
    }

    #[test]
    fn test_mismatched_kinds_keep_earlier_value() {
        let value = blend(&TrackValue::Number(3.0), &TrackValue::Text("x".into()), 0.9);
        assert_eq!(value, TrackValue::Number(3.0));
    }

    #[test]
    fn test_empty_clip_yields_empty_sample() {
        let clip = AnimationClip::multi(vec![], 1.0);
        assert!(evaluate(&clip, 0.5).is_empty());
    }
}
