// Available and selected tracks

use crate::error::{PlayerError, Result};

/// Description of one rendition inside a track group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackFormat {
    pub id: Option<String>,
    pub sample_mime_type: Option<String>,
    pub bitrate: Option<u32>,
    pub language: Option<String>,
}

impl TrackFormat {
    pub fn new(sample_mime_type: impl Into<String>) -> Self {
        Self {
            sample_mime_type: Some(sample_mime_type.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Alternative renditions of the same content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackGroup {
    formats: Vec<TrackFormat>,
}

impl TrackGroup {
    pub fn new(formats: Vec<TrackFormat>) -> Self {
        Self { formats }
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn format(&self, index: usize) -> Option<&TrackFormat> {
        self.formats.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackGroupArray {
    groups: Vec<TrackGroup>,
}

impl TrackGroupArray {
    pub fn new(groups: Vec<TrackGroup>) -> Self {
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackGroup> {
        self.groups.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackGroup> {
        self.groups.iter()
    }
}

/// Chosen renditions within one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSelection {
    pub group_index: usize,
    pub track_indices: Vec<usize>,
}

impl TrackSelection {
    pub fn new(group_index: usize, track_indices: Vec<usize>) -> Self {
        Self {
            group_index,
            track_indices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackSelectionArray {
    selections: Vec<TrackSelection>,
}

impl TrackSelectionArray {
    pub fn new(selections: Vec<TrackSelection>) -> Self {
        Self { selections }
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackSelection> {
        self.selections.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackSelection> {
        self.selections.iter()
    }
}

/// Validated pair of available groups and per-group selections.
///
/// Selection count always equals group count and every selection points
/// at an existing group and existing tracks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tracks {
    groups: TrackGroupArray,
    selections: TrackSelectionArray,
}

impl Tracks {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(groups: TrackGroupArray, selections: TrackSelectionArray) -> Result<Self> {
        if groups.len() != selections.len() {
            return Err(PlayerError::InvalidTracks(format!(
                "{} selections for {} groups",
                selections.len(),
                groups.len()
            )));
        }

        for selection in selections.iter() {
            let group = groups.get(selection.group_index).ok_or_else(|| {
                PlayerError::InvalidTracks(format!(
                    "selection references missing group {}",
                    selection.group_index
                ))
            })?;

            if let Some(bad) = selection.track_indices.iter().find(|&&i| i >= group.len()) {
                return Err(PlayerError::InvalidTracks(format!(
                    "track {} out of range for group {} ({} tracks)",
                    bad,
                    selection.group_index,
                    group.len()
                )));
            }
        }

        Ok(Self { groups, selections })
    }

    pub fn groups(&self) -> &TrackGroupArray {
        &self.groups
    }

    pub fn selections(&self) -> &TrackSelectionArray {
        &self.selections
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_group() -> TrackGroup {
        TrackGroup::new(vec![
            TrackFormat::new("audio/mp4a-latm").with_id("a-en").with_language("en"),
            TrackFormat::new("audio/mp4a-latm").with_id("a-de").with_language("de"),
        ])
    }

    #[test]
    fn test_valid_tracks() {
        let tracks = Tracks::new(
            TrackGroupArray::new(vec![audio_group()]),
            TrackSelectionArray::new(vec![TrackSelection::new(0, vec![1])]),
        )
        .unwrap();
        assert_eq!(tracks.groups().len(), tracks.selections().len());
        assert_eq!(
            tracks.groups().get(0).and_then(|g| g.format(1)).and_then(|f| f.language.as_deref()),
            Some("de")
        );
        let selected = tracks.selections().get(0).map(|s| s.track_indices[0]);
        assert_eq!(
            selected
                .and_then(|i| tracks.groups().get(0).and_then(|g| g.format(i)))
                .and_then(|f| f.id.as_deref()),
            Some("a-de")
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Tracks::new(
            TrackGroupArray::new(vec![audio_group(), audio_group()]),
            TrackSelectionArray::new(vec![TrackSelection::new(0, vec![0])]),
        );
        assert!(matches!(result, Err(PlayerError::InvalidTracks(_))));
    }

    #[test]
    fn test_bad_group_index_rejected() {
        let result = Tracks::new(
            TrackGroupArray::new(vec![audio_group()]),
            TrackSelectionArray::new(vec![TrackSelection::new(3, vec![])]),
        );
        assert!(matches!(result, Err(PlayerError::InvalidTracks(_))));
    }

    #[test]
    fn test_bad_track_index_rejected() {
        let result = Tracks::new(
            TrackGroupArray::new(vec![audio_group()]),
            TrackSelectionArray::new(vec![TrackSelection::new(0, vec![2])]),
        );
        assert!(matches!(result, Err(PlayerError::InvalidTracks(_))));
    }
}
