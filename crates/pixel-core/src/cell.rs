//! Cell addressing, colors and the owned-pixel record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side length of the virtual grid in cells.
pub const GRID_DIM: i64 = 10_000;

/// Total number of addressable cells.
pub const TOTAL_CELLS: u64 = (GRID_DIM as u64) * (GRID_DIM as u64);

/// Integer address of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i64,
    pub y: i64,
}

impl CellCoord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Whether the coordinate lies inside a `grid_dim` × `grid_dim` grid.
    pub fn in_grid(self, grid_dim: i64) -> bool {
        (0..grid_dim).contains(&self.x) && (0..grid_dim).contains(&self.y)
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn id(self) -> CellId {
        CellId(self)
    }
}

impl From<(i64, i64)> for CellCoord {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellIdError {
    #[error("Cell id must start with 'pixel-': '{0}'")]
    MissingPrefix(String),

    #[error("Cell id must contain an x and a y component: '{0}'")]
    MissingComponent(String),

    #[error("Invalid cell id component in '{id}': {source}")]
    InvalidComponent {
        id: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// String identity of a cell, `pixel-{x}-{y}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub CellCoord);

impl CellId {
    pub fn coord(self) -> CellCoord {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pixel-{}-{}", self.0.x, self.0.y)
    }
}

impl FromStr for CellId {
    type Err = CellIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("pixel-")
            .ok_or_else(|| CellIdError::MissingPrefix(s.to_string()))?;
        let (x, y) = rest
            .split_once('-')
            .ok_or_else(|| CellIdError::MissingComponent(s.to_string()))?;
        let parse = |part: &str| {
            part.parse::<i64>()
                .map_err(|source| CellIdError::InvalidComponent {
                    id: s.to_string(),
                    source,
                })
        };
        Ok(CellId(CellCoord::new(parse(x)?, parse(y)?)))
    }
}

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid hex color: '{0}'")]
pub struct ColorParseError(pub String);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Bitcoin orange, the default selection color.
    pub const BITCOIN: Color = Color::rgb(0xF7, 0x93, 0x1A);
    pub const BACKGROUND: Color = Color::rgb(0xF8, 0xF9, 0xFA);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(hex.to_string());
        let digits = hex.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());

        match digits.len() {
            3 => {
                let short = |i: usize| {
                    u8::from_str_radix(&digits[i..=i], 16)
                        .map(|v| v * 17)
                        .map_err(|_| err())
                };
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(err()),
        }
    }

    /// Same color with its alpha replaced by `alpha` in `[0, 1]`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// CSS `rgba()` string for canvas fill/stroke styles.
    pub fn to_css(self) -> String {
        let alpha = f32::from(self.a) / 255.0;
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BITCOIN
    }
}

/// A purchased cell as recorded by the pixel service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedPixel {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub color: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl OwnedPixel {
    pub fn new(coord: CellCoord, color: impl Into<String>, owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: coord.id().to_string(),
            x: coord.x,
            y: coord.y,
            color: color.into(),
            owner_id,
            created_at: now,
            updated_at: now,
            content: None,
        }
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

/// Transient drag rectangle; corners are kept as dragged, not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub start_x: i64,
    pub start_y: i64,
    pub end_x: i64,
    pub end_y: i64,
}

impl SelectionRect {
    pub fn at(coord: CellCoord) -> Self {
        Self {
            start_x: coord.x,
            start_y: coord.y,
            end_x: coord.x,
            end_y: coord.y,
        }
    }

    /// Returns `(min, max)` corners, both inclusive.
    pub fn normalized(&self) -> (CellCoord, CellCoord) {
        (
            CellCoord::new(self.start_x.min(self.end_x), self.start_y.min(self.end_y)),
            CellCoord::new(self.start_x.max(self.end_x), self.start_y.max(self.end_y)),
        )
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: (self.end_x - self.start_x).unsigned_abs() + 1,
            height: (self.end_y - self.start_y).unsigned_abs() + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_roundtrip() {
        let id: CellId = "pixel-3-4".parse().unwrap();
        assert_eq!(id.coord(), CellCoord::new(3, 4));
        assert_eq!(id.to_string(), "pixel-3-4");
    }

    #[test]
    fn test_cell_id_rejects_malformed() {
        assert!(matches!("tile-3-4".parse::<CellId>(), Err(CellIdError::MissingPrefix(_))));
        assert!(matches!("pixel-34".parse::<CellId>(), Err(CellIdError::MissingComponent(_))));
        assert!(matches!(
            "pixel-a-4".parse::<CellId>(),
            Err(CellIdError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#F7931A").unwrap(), Color::BITCOIN);
        assert_eq!(Color::from_hex("fff").unwrap(), Color::rgb(255, 255, 255));
        assert_eq!(Color::from_hex("#00000080").unwrap(), Color::new(0, 0, 0, 128));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_color_css() {
        assert!(
            Color::BITCOIN
                .with_alpha(0.5)
                .to_css()
                .starts_with("rgba(247, 147, 26, 0.50")
        );
        assert_eq!(Color::rgb(1, 2, 3).to_css(), "rgba(1, 2, 3, 1)");
    }

    #[test]
    fn test_selection_rect_normalized() {
        let rect = SelectionRect {
            start_x: 5,
            start_y: 1,
            end_x: 2,
            end_y: 3,
        };
        let (min, max) = rect.normalized();
        assert_eq!(min, CellCoord::new(2, 1));
        assert_eq!(max, CellCoord::new(5, 3));
        assert_eq!(rect.dimensions(), Dimensions { width: 4, height: 3 });
    }

    #[test]
    fn test_owned_pixel_wire_format() {
        let pixel = OwnedPixel::new(CellCoord::new(7, 9), "#FF0000", Some("owner-1".into()));
        let json = serde_json::to_value(&pixel).unwrap();
        assert_eq!(json["id"], "pixel-7-9");
        assert_eq!(json["ownerId"], "owner-1");
        assert!(json.get("content").is_none());
    }
}
