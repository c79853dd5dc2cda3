//! Test fixtures shared across modules.

use crate::location::{LocationError, LocationProvider, LocationRecord};
use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A provider with a scripted outcome that counts its invocations.
pub(crate) struct ScriptedProvider {
    name: &'static str,
    outcome: Option<LocationRecord>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub(crate) fn ok(name: &'static str, record: LocationRecord) -> Self {
        Self {
            name,
            outcome: Some(record),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        Self {
            name,
            outcome: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LocationProvider for ScriptedProvider {
    async fn resolve(&self) -> Result<LocationRecord, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .ok_or_else(|| LocationError::provider(self.name, "scripted failure"))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A city-level IP record for tests.
pub(crate) fn ip_record(city: &str, lat: f64, lon: f64) -> LocationRecord {
    let mut rec = LocationRecord::from_ip(lat, lon);
    rec.city = city.into();
    rec.country = "Sweden".into();
    rec.country_code = "SE".into();
    rec.timezone = "Europe/Stockholm".into();
    rec.ip = "198.51.100.23".into();
    rec.isp = "Bahnhof AB".into();
    rec
}
