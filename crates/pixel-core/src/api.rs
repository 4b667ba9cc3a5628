//! HTTP routes and request bodies of the pixel service.
//!
//! Transport lives in the client; this module only decides where each
//! [`PixelService`](crate::PixelService) call goes and what it sends.

use serde::Serialize;

use crate::cell::CellCoord;
use crate::service::ServiceError;

/// Query parameter that selects the backend (`?backend=memory`).
pub const BACKEND_PARAM: &str = "backend";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    OwnedPixels,
    Purchase,
    ConfirmPayment,
    PixelContent,
    Leaderboard,
    CellDetails(CellCoord),
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Self::OwnedPixels | Self::Leaderboard | Self::CellDetails(_) => Method::Get,
            Self::Purchase | Self::ConfirmPayment | Self::PixelContent => Method::Post,
        }
    }

    pub fn path(self) -> String {
        match self {
            Self::OwnedPixels => "/api/pixels".to_string(),
            Self::Purchase => "/api/purchases".to_string(),
            Self::ConfirmPayment => "/api/payments/confirm".to_string(),
            Self::PixelContent => "/api/pixels/content".to_string(),
            Self::Leaderboard => "/api/leaderboard".to_string(),
            Self::CellDetails(cell) => format!("/api/pixels/{}/{}", cell.x, cell.y),
        }
    }

    /// Absolute URL under `base_url`; a trailing slash on the base is ignored.
    pub fn url(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmBody<'a> {
    pub invoice: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody<'a> {
    pub pixel_ids: &'a [String],
    pub content: &'a str,
}

/// Maps a non-2xx HTTP status to a network error carrying the response body.
pub fn check_status(status: u16, body: &str) -> Result<(), ServiceError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ServiceError::Network(format!("HTTP {status}: {body}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Http,
    Memory,
}

impl Backend {
    /// Backend named by the value of [`BACKEND_PARAM`]; anything but
    /// `memory` means HTTP.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("memory") => Self::Memory,
            _ => Self::Http,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_routes() {
        let routes = [
            (Endpoint::OwnedPixels, Method::Get, "/api/pixels"),
            (Endpoint::Purchase, Method::Post, "/api/purchases"),
            (Endpoint::ConfirmPayment, Method::Post, "/api/payments/confirm"),
            (Endpoint::PixelContent, Method::Post, "/api/pixels/content"),
            (Endpoint::Leaderboard, Method::Get, "/api/leaderboard"),
            (Endpoint::CellDetails(CellCoord::new(12, 7)), Method::Get, "/api/pixels/12/7"),
        ];
        for (endpoint, method, path) in routes {
            assert_eq!(endpoint.method(), method, "{endpoint:?}");
            assert_eq!(endpoint.path(), path);
        }
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        assert_eq!(
            Endpoint::Leaderboard.url("https://pixels.example/"),
            "https://pixels.example/api/leaderboard"
        );
        assert_eq!(Endpoint::OwnedPixels.url(""), "/api/pixels");
    }

    #[test]
    fn test_content_body_uses_camel_case_ids() {
        let ids = vec!["pixel-1-2".to_string(), "pixel-1-3".to_string()];
        let body = ContentBody {
            pixel_ids: &ids,
            content: "data:image/png;base64,AA",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pixelIds": ["pixel-1-2", "pixel-1-3"],
                "content": "data:image/png;base64,AA",
            })
        );

        let confirm = serde_json::to_value(ConfirmBody { invoice: "lnbc2n1p" }).unwrap();
        assert_eq!(confirm, serde_json::json!({ "invoice": "lnbc2n1p" }));
    }

    #[test]
    fn test_non_success_status_is_network_error() {
        assert_eq!(check_status(200, ""), Ok(()));
        assert_eq!(check_status(204, ""), Ok(()));
        assert_eq!(
            check_status(503, "maintenance"),
            Err(ServiceError::Network("HTTP 503: maintenance".to_string()))
        );
        assert!(check_status(404, "").is_err());
        assert!(check_status(302, "").is_err());
    }

    #[test]
    fn test_backend_param() {
        assert_eq!(Backend::from_param(Some("memory")), Backend::Memory);
        assert_eq!(Backend::from_param(Some("Memory ")), Backend::Memory);
        assert_eq!(Backend::from_param(Some("http")), Backend::Http);
        assert_eq!(Backend::from_param(None), Backend::Http);
    }
}
