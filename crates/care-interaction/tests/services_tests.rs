// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use care_app_core::config::{ConfigError, ConfigService};
use care_dry_tests::body::DEFAULT_DT;
use care_dry_tests::{InMemoryConfigStore, RecordingHaptics, RecordingSink, ScriptedBody};
use care_interaction::config::{ESTIMATOR_KEY, FEEDBACK_OBJECTS_KEY, FEEDBACK_RULES_KEY};
use care_interaction::{
    CareServices, EventChannel, FeedbackError, HostPorts, InteractionEvent, InteractionType,
    InteractorKind, ManipulatorId, ObjectId, SourceObject,
};
use care_math::Vec3;

fn store() -> InMemoryConfigStore {
    InMemoryConfigStore::new()
        .with_json(ESTIMATOR_KEY, &serde_json::json!({ "window": 4, "iterations": 0 }))
        .with_json(
            FEEDBACK_RULES_KEY,
            &serde_json::json!({
                "rules": [
                    {
                        "interaction": "select_start",
                        "actions": [{ "type": "audio", "clip": "grab", "volume": 0.5 }],
                        "default_haptics": { "amplitude": 0.7, "duration": 0.1 }
                    },
                    {
                        "interaction": "hover_start",
                        "kinds": ["poke", "ray"],
                        "actions": [{ "type": "vfx", "effect": "outline" }]
                    }
                ]
            }),
        )
        .with_json(
            FEEDBACK_OBJECTS_KEY,
            &serde_json::json!({
                "objects": [
                    { "object": 2, "mode": "override", "overrides": { "select_start": [] } }
                ]
            }),
        )
}

fn services(store: InMemoryConfigStore) -> (CareServices, RecordingHaptics, RecordingSink) {
    let haptics = RecordingHaptics::new();
    let sink = RecordingSink::new();
    let ports = HostPorts {
        haptics: Box::new(haptics.clone()),
        sink: Box::new(sink.clone()),
        ..HostPorts::default()
    };
    let services = CareServices::from_config(&ConfigService::new(store), ports).expect("config");
    (services, haptics, sink)
}

fn grab(object: u64) -> InteractionEvent {
    InteractionEvent::from_interactor(
        InteractionType::SelectStart,
        InteractorKind::Grab,
        ManipulatorId(1),
        SourceObject::new(ObjectId(object)),
    )
}

#[test]
fn services_load_every_section() {
    let (services, _haptics, _sink) = services(store());
    let config = services.estimator().config();
    assert_eq!(config.window, 4);
    assert_eq!(config.iterations, 1);
    assert_eq!(services.router().borrow().rules().map(|r| r.len()), Some(2));
    assert!(services
        .router()
        .borrow()
        .object_settings(ObjectId(2))
        .is_some());
}

#[test]
fn channel_events_reach_router() {
    let (services, haptics, sink) = services(store());
    let channel = EventChannel::new();
    let sub = services.attach(Some(&channel)).unwrap();
    assert_eq!(
        services.attach(Some(&channel)).unwrap_err(),
        FeedbackError::AlreadyAttached
    );

    channel.emit(&grab(1));
    channel.emit(&grab(2));
    assert_eq!(sink.clips(), vec!["grab"]);
    assert_eq!(haptics.plays().len(), 1);

    assert_eq!(services.tick(0.05), 0);
    assert_eq!(services.tick(0.5), 1);

    drop(sub);
    channel.emit(&grab(1));
    assert_eq!(sink.len(), 1);
}

#[test]
fn missing_channel_is_reported_not_fatal() {
    let (services, _haptics, sink) = services(store());
    assert_eq!(
        services.attach(None).unwrap_err(),
        FeedbackError::MissingChannel
    );
    assert!(sink.is_empty());
}

#[test]
fn empty_store_yields_idle_services() {
    let (mut services, _haptics, sink) = services(InMemoryConfigStore::new());
    assert!(services.router().borrow().rules().is_none());
    services.router().borrow_mut().route(&grab(1));
    assert!(sink.is_empty());

    let mut body = ScriptedBody::constant_velocity(Vec3::ZERO, Vec3::UNIT_X, DEFAULT_DT, 4);
    let estimator = services.estimator_mut();
    estimator.begin_manipulation(ObjectId(3), ManipulatorId(1));
    loop {
        estimator.record_move(ObjectId(3), ManipulatorId(1), Some(&body));
        if !body.advance() {
            break;
        }
    }
    assert!(estimator
        .end_manipulation(ObjectId(3), ManipulatorId(1), true, Some(&mut body))
        .is_some());
}

#[test]
fn store_failure_surfaces_as_config_error() {
    let store = store();
    store.set_fail_on_load(true);
    let result = CareServices::from_config(&ConfigService::new(store), HostPorts::default());
    assert!(matches!(result, Err(ConfigError::Other(_))));
}
