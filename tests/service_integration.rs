use std::sync::Arc;

use ann_ai::services::{
    BUILTIN_CHARACTER, Placeholder, ServiceRegistry, ServiceToken, VideoCatalog,
    VideoCharacterService,
};
use ann_ai::types::Emotion;

#[test]
fn initialize_provides_every_known_service() {
    let mut registry = ServiceRegistry::new();
    registry.initialize();

    for token in ServiceToken::ALL {
        if token == ServiceToken::CharacterService {
            assert!(registry.get::<VideoCatalog>(token).is_ok(), "{token} failed");
        } else {
            assert!(registry.get::<Placeholder>(token).is_ok(), "{token} failed");
        }
    }
}

#[test]
fn singleton_behavior_holds_across_get_calls() {
    let mut registry = ServiceRegistry::new();

    let first = registry.get::<Placeholder>(ServiceToken::EventBus).unwrap();
    let second = registry.get::<Placeholder>(ServiceToken::EventBus).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn get_auto_initializes_the_registry() {
    let mut registry = ServiceRegistry::new();
    assert!(!registry.initialized());

    registry
        .get::<Placeholder>(ServiceToken::EventBus)
        .unwrap();
    assert!(registry.initialized());
}

#[test]
fn the_character_service_serves_the_builtin_character() {
    let mut registry = ServiceRegistry::new();

    let catalog = registry
        .get::<VideoCatalog>(ServiceToken::CharacterService)
        .unwrap();

    let path = catalog
        .video_path(BUILTIN_CHARACTER, Some(Emotion::Positive))
        .unwrap();
    assert!(catalog.available_videos(BUILTIN_CHARACTER).contains(&path));
    assert!(catalog.video_path("invalid", None).is_err());
}

#[test]
fn reset_invalidates_resolution_until_reinitialized() {
    let mut registry = ServiceRegistry::new();
    registry.initialize();
    registry.reset();
    assert!(!registry.initialized());

    let err = registry
        .container_mut()
        .resolve::<Placeholder>(ServiceToken::EventBus)
        .unwrap_err();
    assert!(err.to_string().contains("is not registered"));

    // A fresh singleton after reset is a distinct instance.
    registry.initialize();
    assert!(registry.get::<Placeholder>(ServiceToken::EventBus).is_ok());
}
