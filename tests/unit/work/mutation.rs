use super::*;

#[test]
fn rotation_normalizes_into_quarter_turns() {
    let mut s = EditState::default();
    WorkMutation::SetRotation(5).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(1));

    WorkMutation::Rotate(-2).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(3));

    WorkMutation::Rotate(1).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(0));
}

#[test]
fn flag_and_tags() {
    let mut s = EditState::default();
    WorkMutation::SetFlagged(true).apply(&mut s);
    WorkMutation::AddTag("sea".to_string()).apply(&mut s);
    WorkMutation::AddTag("sky".to_string()).apply(&mut s);
    WorkMutation::RemoveTag("sea".to_string()).apply(&mut s);
    WorkMutation::RemoveTag("missing".to_string()).apply(&mut s);
    assert!(s.flagged);
    assert_eq!(s.tags.iter().collect::<Vec<_>>(), vec!["sky"]);

    WorkMutation::SetFlagged(false).apply(&mut s);
    assert!(!s.flagged);
}

#[test]
fn reset_clears_everything() {
    let mut s = EditState {
        rotation_turns: Some(2),
        tilt: Some(3.0),
        flagged: true,
        ..EditState::default()
    };
    WorkMutation::Reset.apply(&mut s);
    assert!(s.is_untouched());
}

#[test]
fn order_of_application_matters() {
    let base = EditState::default();
    let forward = [WorkMutation::SetRotation(1), WorkMutation::Rotate(1)];
    let backward = [WorkMutation::Rotate(1), WorkMutation::SetRotation(1)];
    assert_eq!(apply_in_order(&base, &forward).rotation_turns, Some(2));
    assert_eq!(apply_in_order(&base, &backward).rotation_turns, Some(1));

    let last_crop_wins = [
        WorkMutation::SetCrop(Some(Rect::new(0.0, 0.0, 1.0, 1.0))),
        WorkMutation::SetCrop(None),
    ];
    assert_eq!(apply_in_order(&base, &last_crop_wins).crop_rect, None);
}

#[test]
fn apply_in_order_leaves_baseline_untouched() {
    let base = EditState {
        tilt: Some(2.0),
        ..EditState::default()
    };
    let after = apply_in_order(&base, &[WorkMutation::SetTilt(None)]);
    assert_eq!(base.tilt, Some(2.0));
    assert_eq!(after.tilt, None);
}

#[test]
fn custom_mutation_runs_closure_and_keeps_label() {
    let m = WorkMutation::custom("double_tilt", |s| {
        s.tilt = s.tilt.map(|t| t * 2.0);
    });
    let mut s = EditState {
        tilt: Some(1.25),
        ..EditState::default()
    };
    m.apply(&mut s);
    assert_eq!(s.tilt, Some(2.5));
    assert_eq!(m.label(), "double_tilt");
    assert_eq!(format!("{m:?}"), "Custom { label: \"double_tilt\" }");
}

#[test]
fn rotate_at_integer_edges_stays_in_range() {
    let at = |turns: i32| EditState {
        rotation_turns: Some(turns),
        ..EditState::default()
    };

    let s = apply_in_order(&at(i32::MAX), &[WorkMutation::Rotate(1)]);
    assert_eq!(s.rotation_turns, Some(0));

    let s = apply_in_order(&at(i32::MIN), &[WorkMutation::Rotate(-1)]);
    assert_eq!(s.rotation_turns, Some(3));

    let s = apply_in_order(&at(i32::MAX), &[WorkMutation::Rotate(i32::MAX)]);
    assert_eq!(s.rotation_turns, Some(2));

    let s = apply_in_order(&EditState::default(), &[WorkMutation::Rotate(i32::MIN)]);
    assert_eq!(s.rotation_turns, Some(0));
}

#[test]
fn set_rotation_at_integer_edges() {
    let mut s = EditState::default();
    WorkMutation::SetRotation(i32::MAX).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(3));
    WorkMutation::SetRotation(i32::MIN).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(0));
    WorkMutation::SetRotation(-1).apply(&mut s);
    assert_eq!(s.rotation_turns, Some(3));
}

#[test]
fn rotate_normalizes_out_of_range_baseline() {
    // Sidecars may carry any stored integer.
    let base = EditState {
        rotation_turns: Some(-7),
        ..EditState::default()
    };
    assert_eq!(
        apply_in_order(&base, &[WorkMutation::Rotate(0)]).rotation_turns,
        Some(1)
    );
    assert_eq!(
        apply_in_order(&base, &[WorkMutation::Rotate(2)]).rotation_turns,
        Some(3)
    );
}
