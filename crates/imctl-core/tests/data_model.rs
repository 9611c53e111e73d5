use imctl_core::{ChannelMask, LightSource, Mode, SessionState};

#[test]
fn test_light_source_serializes_as_mask_string() {
    let source: LightSource = "001100".parse().unwrap();
    let json = serde_json::to_string(&source).unwrap();
    assert_eq!(json, r#"{"fluorescence":"001100"}"#);

    let back: LightSource = serde_json::from_str(&json).unwrap();
    assert_eq!(back, source);
}

#[test]
fn test_deserializing_empty_mask_fails() {
    let result: Result<ChannelMask, _> = serde_json::from_str(r#""000000""#);
    assert!(result.is_err());
}

#[test]
fn test_default_session_state_is_unknown() {
    let state = SessionState::default();
    assert_eq!(state.mode, None);
    assert_eq!(state.objective_index, None);
    assert!(state.position.is_empty());
    assert_eq!(state.image_filename_attributes.well, None);
}

#[test]
fn test_mode_serde_lowercase() {
    assert_eq!(serde_json::to_string(&Mode::Live).unwrap(), r#""live""#);
    let mode: Mode = serde_json::from_str(r#""script""#).unwrap();
    assert_eq!(mode, Mode::Script);
}
