use async_trait::async_trait;
use thiserror::Error;

use crate::geo::GeoCoordinate;
use crate::model::attendance::CapturedImage;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// No fix yet; the device is still acquiring one.
    #[error("location not resolved yet")]
    Unavailable,

    /// The user (or the platform) refused location access.
    #[error("GPS Access Required")]
    AccessRequired,
}

/// One-shot, high-accuracy position lookup.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeoCoordinate, LocationError>;
}

/// Snapshot from the verification camera. The result is opaque.
#[async_trait]
pub trait PhotoCapture: Send + Sync {
    async fn capture(&self) -> Option<CapturedImage>;
}

/// Fix reported by the device alongside its request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedPosition {
    fix: Option<GeoCoordinate>,
    denied: bool,
}

impl ReportedPosition {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, denied: bool) -> Self {
        let fix = match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoCoordinate::new(lat, lon))
            }
            _ => None,
        };
        Self { fix, denied }
    }
}

#[async_trait]
impl LocationProvider for ReportedPosition {
    async fn current_position(&self) -> Result<GeoCoordinate, LocationError> {
        match (self.fix, self.denied) {
            (_, true) => Err(LocationError::AccessRequired),
            (Some(fix), false) => Ok(fix),
            (None, false) => Err(LocationError::Unavailable),
        }
    }
}

/// Snapshot uploaded by the device (data URL or bare base64).
#[derive(Debug, Clone, Default)]
pub struct UploadedPhoto(Option<CapturedImage>);

impl UploadedPhoto {
    pub fn new(raw: Option<String>) -> Self {
        Self(raw.filter(|s| !s.trim().is_empty()).map(CapturedImage::new))
    }
}

#[async_trait]
impl PhotoCapture for UploadedPhoto {
    async fn capture(&self) -> Option<CapturedImage> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn reported_position_needs_both_coordinates() {
        let full = ReportedPosition::new(Some(26.899), Some(75.739), false);
        assert_eq!(
            full.current_position().await,
            Ok(GeoCoordinate::new(26.899, 75.739))
        );

        let half = ReportedPosition::new(Some(26.899), None, false);
        assert_eq!(half.current_position().await, Err(LocationError::Unavailable));

        let nan = ReportedPosition::new(Some(f64::NAN), Some(75.739), false);
        assert_eq!(nan.current_position().await, Err(LocationError::Unavailable));
    }

    #[actix_web::test]
    async fn denial_wins_over_stale_fix() {
        let denied = ReportedPosition::new(Some(26.899), Some(75.739), true);
        assert_eq!(
            denied.current_position().await,
            Err(LocationError::AccessRequired)
        );
    }

    #[actix_web::test]
    async fn blank_upload_is_no_photo() {
        assert!(UploadedPhoto::new(Some("   ".into())).capture().await.is_none());
        assert!(UploadedPhoto::new(None).capture().await.is_none());
        assert!(
            UploadedPhoto::new(Some("data:image/jpeg;base64,/9j/4AAQ".into()))
                .capture()
                .await
                .is_some()
        );
    }
}
