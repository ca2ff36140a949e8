//! Address geocoding via the OpenRouteService geocode endpoint.
//!
//! Appointments arrive with a postal address; tours need coordinates. The
//! geocode pass resolves every appointment that has no location row yet and
//! stores the result, leaving failures for a later retry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::queries::appointment;
use crate::types::Coordinates;

/// Resolves a free-form address to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered but found no match
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>>;

    /// Geocoder name for logging
    fn name(&self) -> &str;
}

/// OpenRouteService forward geocoder (Pelias-backed)
pub struct OrsGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OrsGeocoder {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    /// GeoJSON order: [lng, lat]
    coordinates: [f64; 2],
}

#[async_trait]
impl Geocoder for OrsGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>> {
        let url = format!(
            "{}/geocode/search?api_key={}&text={}&size=1",
            self.base_url,
            self.api_key,
            urlencoding::encode(address)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("geocode request failed")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("geocode endpoint returned HTTP {status}: {body}");
        }

        let parsed: GeocodeResponse = response
            .json()
            .await
            .context("geocode response is not valid JSON")?;

        Ok(parsed.features.first().map(|f| {
            let [lng, lat] = f.geometry.coordinates;
            Coordinates::new(lat, lng)
        }))
    }

    fn name(&self) -> &str {
        "OpenRouteService"
    }
}

/// Result of one geocoding pass
#[derive(Debug, Default)]
pub struct GeocodeSummary {
    pub resolved: usize,
    pub failed: usize,
}

/// Resolve every appointment without a location row. Failures are logged and
/// left unresolved for the next pass; a rejected geocode (outside valid
/// ranges) counts as failed as well.
pub async fn geocode_missing(pool: &PgPool, geocoder: &dyn Geocoder) -> Result<GeocodeSummary> {
    let pending = appointment::list_unresolved(pool).await?;
    info!(
        "Geocoding {} unresolved appointments via {}",
        pending.len(),
        geocoder.name()
    );

    let mut summary = GeocodeSummary::default();

    for appt in &pending {
        let address = appt.full_address();
        match geocoder.resolve(&address).await {
            Ok(Some(coords)) if coords.is_valid_geocode() => {
                appointment::set_location(pool, appt.id, coords).await?;
                summary.resolved += 1;
            }
            Ok(Some(coords)) => {
                warn!("Geocoder returned unusable coordinates for '{}': {:?}", address, coords);
                summary.failed += 1;
            }
            Ok(None) => {
                warn!("No geocode match for '{}'", address);
                summary.failed += 1;
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {:#}", address, e);
                summary.failed += 1;
            }
        }

        // Stay well under the public rate limit
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    info!(
        "Geocoding pass done: {} resolved, {} failed",
        summary.resolved, summary.failed
    );
    Ok(summary)
}
