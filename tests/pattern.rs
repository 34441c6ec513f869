//! End-to-end checks for the pattern-gradient demo

use aprendiz::pattern::{
    chess_neighbor_loss, mse, ramp_loss, student_loss, ArchVariant, LossWeights, PatternSession,
    PixelGrid, RunState,
};

#[test]
fn baseline_learns_to_reproduce_its_input() {
    let mut session = PatternSession::new(ArchVariant::Default, 42);
    let before = mse(session.input(), &session.baseline_prediction());
    for _ in 0..200 {
        session.step().unwrap();
    }
    let after = mse(session.input(), &session.baseline_prediction());
    assert!(after < before, "baseline mse {before} -> {after}");
    assert!(after < 0.05, "baseline mse still {after} after 200 steps");
}

#[test]
fn student_objective_improves_under_training() {
    let mut session = PatternSession::new(ArchVariant::Default, 42);
    let weights = LossWeights::default();
    let before = student_loss(&session.student_prediction(), &weights);
    for _ in 0..200 {
        session.step().unwrap();
    }
    let after = student_loss(&session.student_prediction(), &weights);
    assert!(after < before, "student loss {before} -> {after}");
}

#[test]
fn trained_student_tracks_the_ramp_target() {
    let mut session = PatternSession::new(ArchVariant::Default, 7);
    for _ in 0..300 {
        session.step().unwrap();
    }
    let prediction = session.student_prediction();
    let untrained = PatternSession::new(ArchVariant::Default, 7);
    assert!(ramp_loss(&prediction) < ramp_loss(&untrained.student_prediction()));
}

#[test]
fn auto_run_advances_until_toggled_off() {
    let mut session = PatternSession::new(ArchVariant::Compression, 3);
    session.toggle_auto();
    for _ in 0..5 {
        assert!(session.tick().is_some());
    }
    assert_eq!(session.step_count(), 5);
    session.toggle_auto();
    assert!(session.tick().is_none());
    assert_eq!(session.step_count(), 5);
}

#[test]
fn reset_mid_auto_run_starts_a_fresh_session() {
    let mut session = PatternSession::new(ArchVariant::Default, 9);
    session.toggle_auto();
    session.tick().unwrap();
    let input_before = session.input().clone();

    session.reset(ArchVariant::Compression);
    assert_eq!(session.run_state(), RunState::Idle);
    assert_eq!(session.step_count(), 0);
    assert_eq!(session.variant(), ArchVariant::Compression);
    // The shared input grid survives a reset.
    assert_eq!(session.input(), &input_before);
}

#[test]
fn all_variants_train_without_error() {
    for variant in [
        ArchVariant::Default,
        ArchVariant::Compression,
        ArchVariant::Transformation,
    ] {
        let mut session = PatternSession::new(variant, 5);
        for _ in 0..10 {
            let report = session.step().unwrap();
            assert!(report.baseline_loss.is_finite());
            assert!(report.student_loss.is_finite());
        }
    }
}

#[test]
fn chess_loss_prefers_contrast_over_flatness() {
    // A checkerboard at the target contrast scores lower than a flat grid.
    let mut checker = Vec::new();
    for r in 0..8 {
        for c in 0..8 {
            checker.push(if (r + c) % 2 == 0 { 0.35 } else { 0.65 });
        }
    }
    let checker = PixelGrid::from_slice(8, 8, &checker);
    let flat = PixelGrid::from_slice(8, 8, &[0.5; 64]);
    assert!(chess_neighbor_loss(&checker) < chess_neighbor_loss(&flat));
}
