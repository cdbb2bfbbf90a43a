//! Property tests for the classifier and stroke engine laws.

mod common;

use airsketch_model::geometry::Point2D;
use airsketch_model::gesture::{GestureEvent, GestureState};
use airsketch_model::synthetic::{synthetic_hand, HandShape};
use airsketch_processing::{CanvasDelta, StrokeConfig, StrokeEngine};
use common::{Rig, FRAME_NS};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Draw(Vec<(f64, f64)>),
    Erase(f64, f64),
}

fn point() -> impl Strategy<Value = (f64, f64)> {
    (0.0..1280.0f64, 0.0..960.0f64)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop::collection::vec(point(), 1..12).prop_map(Op::Draw),
        1 => point().prop_map(|(x, y)| Op::Erase(x, y)),
    ]
}

fn run(engine: &mut StrokeEngine, op: &Op) {
    match op {
        Op::Draw(points) => {
            let mut iter = points.iter().map(|&(x, y)| Point2D::new(x, y));
            if let Some(anchor) = iter.next() {
                engine.apply(&GestureEvent::DrawStart { anchor });
            }
            for anchor in iter {
                engine.apply(&GestureEvent::DrawContinue { anchor });
            }
            engine.apply(&GestureEvent::DrawEnd);
        }
        Op::Erase(x, y) => {
            engine.apply(&GestureEvent::Erase {
                anchor: Point2D::new(*x, *y),
            });
        }
    }
}

fn visible(engine: &StrokeEngine) -> Vec<u64> {
    engine.canvas().strokes().iter().map(|s| s.index).collect()
}

fn sealed(engine: &StrokeEngine) -> Vec<(u64, Vec<Point2D>)> {
    engine
        .canvas()
        .strokes()
        .iter()
        .map(|s| (s.index, s.points.clone()))
        .collect()
}

fn shape_strategy() -> impl Strategy<Value = HandShape> {
    prop_oneof![
        Just(HandShape::Pointing),
        Just(HandShape::OpenPalm),
        Just(HandShape::Pinch),
        Just(HandShape::Victory),
        Just(HandShape::ThreeFingers),
        Just(HandShape::Fist),
    ]
}

proptest! {
    #[test]
    fn undo_then_redo_restores_canvas(ops in prop::collection::vec(op(), 1..20)) {
        let mut engine = StrokeEngine::new(StrokeConfig::default());
        for op in &ops {
            run(&mut engine, op);
        }
        let before = visible(&engine);
        let depth = engine.canvas().undo_depth();

        for _ in 0..depth {
            engine.apply(&GestureEvent::Undo);
        }
        prop_assert!(engine.canvas().strokes().is_empty() || depth == 0);
        for _ in 0..depth {
            engine.apply(&GestureEvent::Redo);
        }
        prop_assert_eq!(visible(&engine), before);
        prop_assert_eq!(engine.canvas().redo_depth(), 0);
    }

    #[test]
    fn each_action_undoes_and_redoes_exactly(ops in prop::collection::vec(op(), 1..15)) {
        let mut engine = StrokeEngine::new(StrokeConfig::default());
        for op in &ops {
            let before = sealed(&engine);
            let depth = engine.canvas().undo_depth();
            run(&mut engine, op);
            if engine.canvas().undo_depth() == depth {
                // An erase that hit nothing records no history.
                prop_assert_eq!(sealed(&engine), before);
                continue;
            }
            let after = sealed(&engine);

            engine.apply(&GestureEvent::Undo);
            prop_assert_eq!(&sealed(&engine), &before);
            engine.apply(&GestureEvent::Redo);
            prop_assert_eq!(&sealed(&engine), &after);
        }
    }

    #[test]
    fn new_action_after_undo_clears_redo(
        ops in prop::collection::vec(op(), 0..10),
        extra in prop::collection::vec(point(), 1..5),
        erase_next in any::<bool>(),
    ) {
        let mut engine = StrokeEngine::new(StrokeConfig::default());
        run(&mut engine, &Op::Draw(vec![(40.0, 40.0), (120.0, 40.0)]));
        for op in &ops {
            run(&mut engine, op);
        }
        run(&mut engine, &Op::Draw(extra.clone()));
        engine.apply(&GestureEvent::Undo);
        prop_assert_eq!(engine.canvas().redo_depth(), 1);

        if erase_next {
            let target = engine.canvas().strokes().last().map(|s| s.points[0]);
            prop_assume!(target.is_some());
            if let Some(anchor) = target {
                let delta = engine.apply(&GestureEvent::Erase { anchor });
                prop_assert!(matches!(delta, CanvasDelta::Erased { .. }), "delta: {:?}", delta);
            }
        } else {
            run(&mut engine, &Op::Draw(extra));
        }
        prop_assert_eq!(engine.canvas().redo_depth(), 0);
        prop_assert_eq!(engine.apply(&GestureEvent::Redo), CanvasDelta::Unchanged);
    }

    #[test]
    fn sealed_points_respect_min_spacing(
        points in prop::collection::vec(point(), 1..60),
        spacing in 0.0..40.0f64,
    ) {
        let config = StrokeConfig { min_point_spacing: spacing, ..Default::default() };
        let mut engine = StrokeEngine::new(config);
        run(&mut engine, &Op::Draw(points));
        let stroke = &engine.canvas().strokes()[0];
        for pair in stroke.points.windows(2) {
            prop_assert!(pair[0].distance_to(&pair[1]) >= spacing);
        }
    }

    #[test]
    fn short_holds_emit_nothing(
        held in 1usize..5,
        shape in shape_strategy(),
        then_no_hand in any::<bool>(),
    ) {
        let mut rig = Rig::unsmoothed();
        let spot = Point2D::new(0.5, 0.5);
        let mut events = rig.hold(shape, spot, held);
        if then_no_hand {
            events.extend(rig.no_hand());
        } else {
            let other = if shape == HandShape::Fist { HandShape::Victory } else { HandShape::Fist };
            events.extend(rig.hold(other, spot, 1));
        }
        prop_assert!(events.is_empty(), "events: {:?}", events);
        prop_assert_eq!(rig.classifier.state(), GestureState::Idle);
    }

    #[test]
    fn sub_threshold_input_never_changes_canvas(
        frames in prop::collection::vec((shape_strategy(), 0.0..0.49f64, 0.3..0.7f64), 1..60),
    ) {
        let mut rig = Rig::new();
        for (i, (shape, confidence, x)) in frames.into_iter().enumerate() {
            let t = i as u64 * FRAME_NS;
            let set = synthetic_hand(shape, Point2D::new(x, 0.5), 0.2, confidence, t);
            prop_assert!(rig.frame(Some(set)).is_empty());
            prop_assert_eq!(rig.classifier.state(), GestureState::Idle);
        }
        prop_assert!(rig.engine.canvas().strokes().is_empty());
        prop_assert!(rig.engine.canvas().active().is_none());
    }
}
