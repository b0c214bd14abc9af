//! Catalog and radio lookups.

use crate::client::WebApiClient;
use crate::types::{ApiTrack, RecommendationsResponse, TopTracksResponse};
use async_trait::async_trait;
use cadence_core::{Catalog, CatalogError, CatalogResult, RadioSource, TrackId, TrackMetadata};
use tracing::{debug, warn};

/// Bare catalog id of a track, accepting `<scheme>:track:<id>` URIs too
fn catalog_id(id: &TrackId) -> &str {
    id.as_str().rsplit(':').next().unwrap_or(id.as_str())
}

/// Track metadata from `GET /tracks/{id}`.
pub struct WebCatalog {
    client: WebApiClient,
}

impl WebCatalog {
    pub fn new(client: WebApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Catalog for WebCatalog {
    async fn fetch_track(&self, id: &TrackId) -> CatalogResult<TrackMetadata> {
        let path = format!("/tracks/{}", catalog_id(id));
        debug!(track_id = %id, "Fetching track metadata");

        match self.client.get_json::<ApiTrack>(&path).await {
            Ok(Some(track)) => Ok(track.into()),
            Ok(None) => Err(CatalogError::NotFound(id.clone())),
            Err(e) => {
                warn!(track_id = %id, error = %e, "Track lookup failed");
                Err(e.into_catalog_error(id))
            }
        }
    }
}

/// Recommendations seeded from the listener's top tracks.
pub struct WebRadio {
    client: WebApiClient,
    batch_size: usize,
}

impl WebRadio {
    /// At most five seeds are accepted per recommendation request
    const SEEDS: usize = 5;

    pub fn new(client: WebApiClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    async fn seeds(&self) -> CatalogResult<Vec<String>> {
        let path = format!("/me/top/tracks?limit={}", Self::SEEDS);
        let top = self
            .client
            .get_json::<TopTracksResponse>(&path)
            .await
            .map_err(|e| CatalogError::transport(e.to_string()))?;
        Ok(top
            .map(|top| top.items.into_iter().map(|track| track.id).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RadioSource for WebRadio {
    async fn recommend(&self) -> CatalogResult<Vec<TrackId>> {
        let seeds = self.seeds().await?;
        if seeds.is_empty() {
            return Err(CatalogError::transport("No listening history to seed radio"));
        }

        let path = format!(
            "/recommendations?limit={}&seed_tracks={}",
            self.batch_size,
            seeds.join(",")
        );
        let batch = self
            .client
            .get_json::<RecommendationsResponse>(&path)
            .await
            .map_err(|e| CatalogError::transport(e.to_string()))?;

        let ids: Vec<TrackId> = batch
            .map(|batch| batch.tracks.into_iter().map(|track| TrackId::new(track.id)).collect())
            .unwrap_or_default();
        debug!(count = ids.len(), "Radio batch received");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_id_strips_uri_prefix() {
        assert_eq!(catalog_id(&TrackId::new("spotify:track:abc")), "abc");
        assert_eq!(catalog_id(&TrackId::new("abc")), "abc");
    }
}
