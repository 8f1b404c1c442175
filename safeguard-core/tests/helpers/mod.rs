//! Reusable fakes and fixtures for engine integration tests.
//!
//! Every collaborator is an in-process fake that records what the engine
//! asked of it. Timer-driven tests run on a paused tokio clock, so
//! `tokio::time::sleep` jumps straight to the next timer.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use safeguard_core::{
    Collaborators, DispatchReceipt, EmergencyContact, EngineConfig, EngineEvent, LocationError,
    LocationProvider, LocationSample, MemoryContactDirectory, MemoryPersistence, NewContact,
    NotificationTransport, Relation, SafetyEngine, TransportError, UiSink,
};

/// Code used by every fixture.
pub const CODE: &str = "4242";
pub const WRONG_CODE: &str = "0000";

/// Transport that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, usize)>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail.store(true, Ordering::SeqCst);
        transport
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }
}

impl NotificationTransport for RecordingTransport {
    fn send<'a>(
        &'a self,
        message: &'a str,
        recipients: &'a [EmergencyContact],
    ) -> BoxFuture<'a, Result<DispatchReceipt, TransportError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), recipients.len()));
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Unreachable("gateway offline".to_string()));
            }
            Ok(DispatchReceipt {
                delivered: recipients.len(),
                accepted_at: Utc::now(),
            })
        })
    }
}

/// Provider that always reports a permission error.
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    fn current_location(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'_, Result<LocationSample, LocationError>> {
        Box::pin(async { Err(LocationError::PermissionDenied) })
    }
}

/// Provider that never answers.
pub struct HangingLocation;

impl LocationProvider for HangingLocation {
    fn current_location(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'_, Result<LocationSample, LocationError>> {
        Box::pin(futures::future::pending())
    }
}

/// Provider that answers with a fixed position.
pub struct FixedLocation(pub LocationSample);

impl LocationProvider for FixedLocation {
    fn current_location(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'_, Result<LocationSample, LocationError>> {
        let sample = self.0;
        Box::pin(async move { Ok(sample) })
    }
}

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matches(e)).count()
    }
}

impl UiSink for RecordingSink {
    fn notify(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// An engine wired to recording fakes.
pub struct Harness {
    pub engine: SafetyEngine,
    pub transport: Arc<RecordingTransport>,
    pub sink: Arc<RecordingSink>,
    pub persistence: Arc<MemoryPersistence>,
    pub contacts: Arc<MemoryContactDirectory>,
}

pub fn contact(name: &str) -> NewContact {
    NewContact::new(name, "+44 7700 900123", Relation::Friend)
}

pub fn sample(lat: f64, lng: f64) -> LocationSample {
    LocationSample::new(lat, lng, 15.0, Utc::now()).unwrap()
}

/// Builds an engine with one contact and no location provider.
pub fn harness(config: EngineConfig) -> Harness {
    harness_with(config, RecordingTransport::default(), None)
}

pub fn harness_with(
    config: EngineConfig,
    transport: RecordingTransport,
    location: Option<Arc<dyn LocationProvider>>,
) -> Harness {
    let persistence = Arc::new(MemoryPersistence::new());
    let contacts = Arc::new(MemoryContactDirectory::load(persistence.clone()).unwrap());
    contacts.add(contact("Priya")).unwrap();

    let transport = Arc::new(transport);
    let sink = Arc::new(RecordingSink::default());
    let mut collaborators = Collaborators::new(
        persistence.clone(),
        contacts.clone(),
        transport.clone(),
    )
    .with_sink(sink.clone());
    if let Some(provider) = location {
        collaborators = collaborators.with_location(provider);
    }

    let engine = SafetyEngine::new(config, collaborators).unwrap();
    Harness {
        engine,
        transport,
        sink,
        persistence,
        contacts,
    }
}

/// Sets the fixture code with `interval_minutes` and arms.
pub async fn arm(harness: &Harness, interval_minutes: u32) {
    harness
        .engine
        .set_credential(CODE, interval_minutes)
        .await
        .unwrap();
    harness.engine.arm().await.unwrap();
}

/// Advances the paused clock, letting every timer due on the way fire.
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    settle().await;
}

/// Lets spawned tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
