//! Integration tests for the JSON command facade.

mod helpers;

use std::time::Duration;

use safeguard_core::{EngineConfig, Response, SafeguardCore};
use serde_json::{json, Value};

async fn call(core: &SafeguardCore, request: Value) -> Value {
    let reply = core.handle_json(&request.to_string()).await;
    serde_json::from_str(&reply).unwrap()
}

fn facade() -> (SafeguardCore, helpers::Harness) {
    let h = helpers::harness(EngineConfig::default());
    (SafeguardCore::new(h.engine.clone()), h)
}

#[tokio::test(start_paused = true)]
async fn full_check_in_over_json() {
    let (core, _h) = facade();

    let reply = call(
        &core,
        json!({ "command": "setCredential", "code": "4242", "intervalMinutes": 1 }),
    )
    .await;
    assert_eq!(reply, json!({ "type": "ok" }));

    let reply = call(&core, json!({ "command": "arm" })).await;
    assert_eq!(reply["type"], "armed");
    assert_eq!(reply["cycle"]["status"], "pending");

    helpers::advance(Duration::from_secs(61)).await;

    let reply = call(&core, json!({ "command": "getStatus" })).await;
    assert_eq!(reply["status"]["sessionState"], "prompting");
    assert_eq!(reply["status"]["attemptsRemaining"], 3);

    let reply = call(&core, json!({ "command": "submitCode", "code": "1111" })).await;
    assert_eq!(
        reply,
        json!({
            "type": "submitted",
            "outcome": { "outcome": "rejected", "attemptsRemaining": 2 }
        })
    );

    let reply = call(&core, json!({ "command": "submitCode", "code": "4242" })).await;
    assert_eq!(reply["outcome"]["outcome"], "verified");

    let reply = call(&core, json!({ "command": "disarm" })).await;
    assert_eq!(reply["type"], "disarmed");
    assert_eq!(reply["session"]["cyclesConfirmed"], 1);
}

#[tokio::test(start_paused = true)]
async fn errors_carry_stable_kinds() {
    let (core, _h) = facade();

    let reply = call(&core, json!({ "command": "arm" })).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["kind"], "noCredentialConfigured");

    let reply = call(
        &core,
        json!({ "command": "setCredential", "code": "12ab", "intervalMinutes": 5 }),
    )
    .await;
    assert_eq!(reply["kind"], "credential");

    let reply = call(
        &core,
        json!({ "command": "setCredential", "code": "1234", "intervalMinutes": 61 }),
    )
    .await;
    assert_eq!(reply["kind"], "credential");

    let reply = call(&core, json!({ "command": "submitCode", "code": "1234" })).await;
    assert_eq!(reply["kind"], "notPrompting");

    let reply = call(&core, json!({ "command": "disarm" })).await;
    assert_eq!(reply["kind"], "notArmed");
}

#[tokio::test(start_paused = true)]
async fn malformed_requests_are_reported() {
    let (core, _h) = facade();

    let reply: Value = serde_json::from_str(&core.handle_json("not json").await).unwrap();
    assert_eq!(reply["kind"], "invalidRequest");

    let reply = call(&core, json!({ "command": "selfDestruct" })).await;
    assert_eq!(reply["kind"], "invalidRequest");
}

#[tokio::test(start_paused = true)]
async fn locations_are_validated_and_recorded() {
    let (core, h) = facade();

    let reply = call(
        &core,
        json!({ "command": "recordLocation", "lat": 95.0, "lng": 10.0 }),
    )
    .await;
    assert_eq!(reply["kind"], "invalidLocation");

    let reply = call(
        &core,
        json!({
            "command": "recordLocation",
            "lat": -33.8688,
            "lng": 151.2093,
            "accuracyMeters": 7.5
        }),
    )
    .await;
    assert_eq!(reply["type"], "locationRecorded");
    assert_eq!(reply["sample"]["accuracyMeters"], 7.5);
    assert_eq!(h.engine.location_trail().len(), 1);

    let status = call(&core, json!({ "command": "getStatus" })).await;
    assert_eq!(status["status"]["latestLocation"]["lat"], -33.8688);
}

#[tokio::test(start_paused = true)]
async fn history_commands_return_records() {
    let (core, _h) = facade();
    call(
        &core,
        json!({ "command": "setCredential", "code": "4242", "intervalMinutes": 1 }),
    )
    .await;
    call(&core, json!({ "command": "arm" })).await;
    helpers::advance(Duration::from_secs(91)).await;
    core.engine().wait_for_dispatches().await;
    call(&core, json!({ "command": "disarm" })).await;

    let command = serde_json::from_value(json!({ "command": "alertHistory" })).unwrap();
    let response = core.handle(command).await;
    let Response::Alerts { alerts } = response else {
        panic!("expected alerts, got {response:?}");
    };
    assert_eq!(alerts.len(), 1);

    let reply = call(&core, json!({ "command": "trackingHistory" })).await;
    assert_eq!(reply["type"], "trackingSessions");
    assert_eq!(reply["sessions"][0]["alertsTriggered"], 1);
}

#[tokio::test(start_paused = true)]
async fn manual_and_test_alerts_over_json() {
    let (core, h) = facade();

    let reply = call(&core, json!({ "command": "sendTestAlert" })).await;
    assert_eq!(reply["type"], "alert");
    assert_eq!(reply["alert"]["isTest"], true);
    assert_eq!(reply["alert"]["reason"], "manual");

    let reply = call(&core, json!({ "command": "triggerEmergency" })).await;
    assert_eq!(reply["type"], "alert");
    assert_eq!(reply["alert"]["isTest"], false);
    assert_eq!(reply["alert"]["dispatchStatus"], "sent");
    assert_eq!(reply["alert"]["annotation"], "locationLost");

    // A second press inside the throttle window returns the same alert.
    let again = call(&core, json!({ "command": "triggerEmergency" })).await;
    assert_eq!(again["alert"]["id"], reply["alert"]["id"]);
    assert_eq!(h.transport.send_count(), 2);
}
