//! Core domain types for Coastwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoastwatchError, Result};

/// Longest description the report form accepts, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;

// ============================================================================
// Location
// ============================================================================

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject coordinates outside the valid latitude/longitude ranges
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is out of range", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is out of range", self.longitude));
        }
        Ok(())
    }

    /// Human-readable label, e.g. `Lat: 13.0827, Lng: 80.2707`
    pub fn label(&self) -> String {
        format!("Lat: {:.4}, Lng: {:.4}", self.latitude, self.longitude)
    }
}

// ============================================================================
// Hazard catalog
// ============================================================================

/// A selectable hazard category
///
/// The `id` is what the server stores; `name` and `icon` are for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HazardType {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const HAZARD_TYPES: &[HazardType] = &[
    HazardType {
        id: "flood",
        name: "Flood",
        icon: "🌊",
    },
    HazardType {
        id: "Broken Buildings",
        name: "Broken Buildings",
        icon: "🏚️",
    },
    HazardType {
        id: "oil_spill",
        name: "Oil Spill",
        icon: "🛢️",
    },
    HazardType {
        id: "ocean_trash",
        name: "Ocean Trash",
        icon: "🗑️",
    },
    HazardType {
        id: "other",
        name: "Other",
        icon: "⚠️",
    },
];

impl HazardType {
    /// Look up a catalog entry by id, falling back to a case-insensitive
    /// match on id or display name
    pub fn find(query: &str) -> Option<&'static HazardType> {
        let query = query.trim();
        HAZARD_TYPES
            .iter()
            .find(|h| h.id == query)
            .or_else(|| {
                HAZARD_TYPES.iter().find(|h| {
                    h.id.eq_ignore_ascii_case(query) || h.name.eq_ignore_ascii_case(query)
                })
            })
    }
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.icon, self.name)
    }
}

// ============================================================================
// Status and severity
// ============================================================================

/// Review status the server assigns to a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Other(String),
}

impl ReportStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Other(raw) => raw,
        }
    }
}

/// Urgency derived from report status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// `resolved` is low, `in_progress` is medium, everything else is high
    pub fn from_status(status: &str) -> Self {
        match status {
            "resolved" => Severity::Low,
            "in_progress" => Severity::Medium,
            _ => Severity::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Feed items
// ============================================================================

/// A hazard report normalized for presentation
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: String,
    /// Server hazard type, as stored
    pub hazard_type: String,
    /// Display label (first letter upper-cased)
    #[serde(rename = "type")]
    pub type_label: String,
    pub icon: &'static str,
    /// `Lat: x, Lng: y`
    pub location: String,
    pub description: String,
    pub reporter: String,
    pub relative_time: String,
    pub image_url: String,
    pub severity: Severity,
    pub status: ReportStatus,
    pub coordinates: Coordinate,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Media attachments
// ============================================================================

/// Supported image MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A photo attached to a report, held in memory until upload
#[derive(Clone, PartialEq)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: ImageMimeType,
}

impl std::fmt::Debug for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Media {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: ImageMimeType) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type,
        }
    }

    /// Read an image from disk, detecting its type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageMimeType::from_extension)
            .ok_or_else(|| {
                CoastwatchError::InvalidInput(format!(
                    "Unsupported image type for '{}'. Use jpg, png, gif or webp.",
                    path.display()
                ))
            })?;

        let bytes = std::fs::read(path).map_err(|e| {
            CoastwatchError::InvalidInput(format!(
                "Failed to read image '{}': {}",
                path.display(),
                e
            ))
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report_image.jpg".to_string());

        Ok(Self::new(bytes, file_name, mime_type))
    }
}
