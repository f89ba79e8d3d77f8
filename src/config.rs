//! Options for opening a recording session

use crate::error::{RecorderError, RecorderResult};
use crate::types::Rect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application name and picture title stored after the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub app_name: String,
    pub title: String,
}

impl Description {
    pub fn new(app_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            title: title.into(),
        }
    }

    /// UTF-16 "app_name\0title\0\0"
    pub fn to_utf16(&self) -> Vec<u16> {
        let mut units: Vec<u16> = self.app_name.encode_utf16().collect();
        units.push(0);
        units.extend(self.title.encode_utf16());
        units.push(0);
        units.push(0);
        units
    }
}

/// Resolution and physical size of the reference device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCaps {
    /// Width in pixels
    pub horz_res: i32,
    /// Height in pixels
    pub vert_res: i32,
    /// Width in millimetres
    pub horz_size: i32,
    /// Height in millimetres
    pub vert_size: i32,
}

impl Default for DeviceCaps {
    /// A 96 DPI 1920x1080 screen
    fn default() -> Self {
        Self {
            horz_res: 1920,
            vert_res: 1080,
            horz_size: 508,
            vert_size: 286,
        }
    }
}

/// How to open a recording session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetafileOptions {
    /// Picture frame in 0.01 mm units; derived from the bounds at close when unset
    pub frame: Option<Rect>,
    pub description: Option<Description>,
    /// Backing file for a disk-based metafile
    pub file: Option<PathBuf>,
}

impl MetafileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_description(mut self, app_name: &str, title: &str) -> Self {
        self.description = Some(Description::new(app_name, title));
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> RecorderResult<Self> {
        let options: MetafileOptions = serde_json::from_str(json)?;
        if let Some(frame) = options.frame {
            if frame.is_empty() {
                return Err(RecorderError::InvalidArgument(format!(
                    "frame {:?} has right < left",
                    frame
                )));
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_encoding() {
        let desc = Description::new("App", "Pic");
        let units = desc.to_utf16();
        assert_eq!(units.len(), 3 + 3 + 3);
        assert_eq!(&units[3..4], &[0]);
        assert_eq!(&units[7..], &[0, 0]);
    }

    #[test]
    fn test_options_from_json() {
        let json = r#"{
            "frame": { "left": 0, "top": 0, "right": 2100, "bottom": 2970 },
            "description": { "app_name": "Writer", "title": "Page 1" }
        }"#;
        let options = MetafileOptions::from_json(json).unwrap();
        assert_eq!(options.frame, Some(Rect::new(0, 0, 2100, 2970)));
        assert_eq!(options.description.unwrap().title, "Page 1");
        assert!(options.file.is_none());
    }

    #[test]
    fn test_options_reject_inverted_frame() {
        let json = r#"{ "frame": { "left": 10, "top": 0, "right": 0, "bottom": 5 } }"#;
        assert!(matches!(
            MetafileOptions::from_json(json),
            Err(RecorderError::InvalidArgument(_))
        ));
        assert!(matches!(
            MetafileOptions::from_json("{ not json"),
            Err(RecorderError::JsonError(_))
        ));
    }
}
