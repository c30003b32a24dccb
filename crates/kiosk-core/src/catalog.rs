//! Page resolution
//!
//! Turns a page id into the ordered slots the sequencer plays. The library
//! is a JSON document listing videos (lengths in fractional minutes) and
//! pages (video assignments with a rotation order).

use crate::{types::*, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A video known to the kiosk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: u32,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Length in minutes, if known
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Assignment of a video to a page position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVideoEntry {
    pub video_id: u32,
    pub order: u32,
    /// Number shown on screen; `order` when unset
    #[serde(default)]
    pub display_number: Option<u32>,
}

/// A page and its assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: PageId,
    pub name: String,
    #[serde(default)]
    pub videos: Vec<PageVideoEntry>,
}

/// A page ready to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPage {
    pub id: PageId,
    pub name: String,
    pub slots: Vec<VideoSlot>,
}

/// Source of resolved pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Resolve a page into its slots, in rotation order
    async fn resolve(&self, page: PageId, default_focus_seconds: u32) -> Result<ResolvedPage>;

    /// All page ids, ascending
    async fn page_ids(&self) -> Result<Vec<PageId>>;
}

/// In-memory video library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a library file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            videos = catalog.videos.len(),
            pages = catalog.pages.len(),
            "Library loaded"
        );
        Ok(catalog)
    }

    /// Resolve without going through the async trait
    pub fn resolve_page(&self, page: PageId, default_focus_seconds: u32) -> Result<ResolvedPage> {
        let entry = self
            .pages
            .iter()
            .find(|p| p.id == page)
            .ok_or(Error::PageNotFound { page: page.0 })?;

        let videos: HashMap<u32, &VideoEntry> = self.videos.iter().map(|v| (v.id, v)).collect();

        let mut assignments: Vec<&PageVideoEntry> = entry.videos.iter().collect();
        assignments.sort_by_key(|a| a.order);

        let mut slots = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let Some(video) = videos.get(&assignment.video_id) else {
                warn!(page = %page, video_id = assignment.video_id, "Assigned video not found, skipping");
                continue;
            };

            if assignment.order == 0 || assignment.order as usize > MAX_SLOTS {
                return Err(Error::InvalidPosition {
                    position: assignment.order,
                    max: MAX_SLOTS,
                });
            }
            if slots.iter().any(|s: &VideoSlot| s.position == assignment.order) {
                return Err(Error::DuplicatePosition {
                    position: assignment.order,
                });
            }

            let slot = VideoSlot::from_minutes(assignment.order, video.duration, default_focus_seconds)
                .with_title(video.title.clone())
                .with_url(video.url.clone())
                .with_display_number(assignment.display_number.unwrap_or(assignment.order));
            debug!(
                page = %page,
                position = slot.position,
                title = %slot.title,
                duration = slot.duration_seconds,
                "Slot resolved"
            );
            slots.push(slot);
        }

        if slots.is_empty() {
            warn!(page = %page, "Page has no playable videos");
        }

        Ok(ResolvedPage {
            id: entry.id,
            name: entry.name.clone(),
            slots,
        })
    }
}

#[async_trait]
impl PageSource for Catalog {
    async fn resolve(&self, page: PageId, default_focus_seconds: u32) -> Result<ResolvedPage> {
        self.resolve_page(page, default_focus_seconds)
    }

    async fn page_ids(&self) -> Result<Vec<PageId>> {
        let mut ids: Vec<PageId> = self.pages.iter().map(|p| p.id).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"{
        "videos": [
            { "id": 1, "title": "Squats", "url": "https://youtu.be/aaa", "duration": 5.5 },
            { "id": 2, "title": "Plank", "url": "https://youtu.be/bbb", "duration": null },
            { "id": 3, "title": "Lunges", "url": "https://youtu.be/ccc", "duration": 5.016 }
        ],
        "pages": [
            { "id": 1, "name": "Page 1", "videos": [
                { "video_id": 3, "order": 3 },
                { "video_id": 1, "order": 1, "display_number": 7 },
                { "video_id": 2, "order": 2 }
            ]},
            { "id": 2, "name": "Page 2", "videos": [
                { "video_id": 1, "order": 1 },
                { "video_id": 99, "order": 2 }
            ]}
        ]
    }"#;

    #[test]
    fn test_resolve_sorts_and_converts() {
        let catalog = Catalog::from_json_str(LIBRARY).unwrap();
        let page = catalog.resolve_page(PageId(1), 60).unwrap();

        let positions: Vec<u32> = page.slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);

        let durations: Vec<u32> = page.slots.iter().map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![330, 60, 300]);

        assert_eq!(page.slots[0].display_number, 7);
        assert_eq!(page.slots[1].display_number, 2);
        assert_eq!(page.slots[0].title, "Squats");
    }

    #[test]
    fn test_missing_video_is_skipped() {
        let catalog = Catalog::from_json_str(LIBRARY).unwrap();
        let page = catalog.resolve_page(PageId(2), 60).unwrap();
        assert_eq!(page.slots.len(), 1);
    }

    #[test]
    fn test_unknown_page() {
        let catalog = Catalog::from_json_str(LIBRARY).unwrap();
        let err = catalog.resolve_page(PageId(42), 60).unwrap_err();
        assert!(matches!(err, Error::PageNotFound { page: 42 }));
    }

    #[test]
    fn test_rejects_fourth_position() {
        let mut catalog = Catalog::from_json_str(LIBRARY).unwrap();
        catalog.pages[0].videos.push(PageVideoEntry {
            video_id: 1,
            order: 4,
            display_number: None,
        });
        let err = catalog.resolve_page(PageId(1), 60).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_POSITION");
    }

    #[test]
    fn test_missing_video_does_not_claim_position() {
        let mut catalog = Catalog::from_json_str(LIBRARY).unwrap();
        // Same order as a known video, sorted after it
        catalog.pages[1].videos.push(PageVideoEntry {
            video_id: 98,
            order: 1,
            display_number: None,
        });
        let page = catalog.resolve_page(PageId(2), 60).unwrap();
        assert_eq!(page.slots.len(), 1);
        assert_eq!(page.slots[0].title, "Squats");

        catalog.pages[1].videos.push(PageVideoEntry {
            video_id: 2,
            order: 1,
            display_number: None,
        });
        let err = catalog.resolve_page(PageId(2), 60).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_POSITION");
    }

    #[tokio::test]
    async fn test_page_source() {
        let catalog = Catalog::from_json_str(LIBRARY).unwrap();
        let source: &dyn PageSource = &catalog;

        assert_eq!(source.page_ids().await.unwrap(), vec![PageId(1), PageId(2)]);
        assert_eq!(source.resolve(PageId(1), 60).await.unwrap().name, "Page 1");
    }
}
