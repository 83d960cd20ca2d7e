//! Input/output item sets for a conversion run.
//!
//! An [`AdaptationItem`] is one recording: its waveform file and the companion
//! pitch-track file sharing the same basename.  An [`AdaptationSet`] is the
//! ordered list of items found in a folder; the output set is derived from the
//! input set index by index, so `inputs.items[i]` is always converted into
//! `outputs.items[i]`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of source and output waveform files.
pub const WAV_EXTENSION: &str = "wav";
/// Extension of pitch-track files written next to each waveform.
pub const PITCH_EXTENSION: &str = "ptc";

// ---------------------------------------------------------------------------
// AdaptationItem
// ---------------------------------------------------------------------------

/// One (waveform, pitch track) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptationItem {
    pub audio_file: PathBuf,
    pub pitch_file: PathBuf,
}

impl AdaptationItem {
    /// Build an item from a waveform path; the pitch track lives next to it
    /// with the [`PITCH_EXTENSION`] extension.
    ///
    /// ```
    /// use std::path::Path;
    /// use codebook_vc::adaptation::AdaptationItem;
    ///
    /// let item = AdaptationItem::from_wav_path("in/s01.wav");
    /// assert_eq!(item.pitch_file, Path::new("in/s01.ptc"));
    /// ```
    pub fn from_wav_path(path: impl Into<PathBuf>) -> Self {
        let audio_file = path.into();
        let pitch_file = audio_file.with_extension(PITCH_EXTENSION);
        Self {
            audio_file,
            pitch_file,
        }
    }

    /// File stem of the waveform (`"s01"` for `in/s01.wav`).
    pub fn basename(&self) -> Option<&str> {
        self.audio_file.file_stem().and_then(|s| s.to_str())
    }
}

// ---------------------------------------------------------------------------
// AdaptationSet
// ---------------------------------------------------------------------------

/// Ordered list of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptationSet {
    pub items: Vec<AdaptationItem>,
}

impl AdaptationSet {
    pub fn new(items: Vec<AdaptationItem>) -> Self {
        Self { items }
    }

    /// List every `*.<extension>` file directly inside `folder`, sorted by
    /// file name.  The extension match is case-insensitive.
    pub fn from_folder(folder: &Path, extension: &str) -> std::io::Result<Self> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if matches {
                paths.push(entry.into_path());
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self::new(
            paths.into_iter().map(AdaptationItem::from_wav_path).collect(),
        ))
    }

    /// Derive the parallel output set: `<output_folder>/<stem><suffix>.wav`
    /// for every input item.
    ///
    /// ```
    /// use std::path::Path;
    /// use codebook_vc::adaptation::{AdaptationItem, AdaptationSet};
    ///
    /// let inputs = AdaptationSet::new(vec![AdaptationItem::from_wav_path("in/a.wav")]);
    /// let outputs = inputs.derive_outputs(Path::new("out"), "_output");
    /// assert_eq!(outputs.items[0].audio_file, Path::new("out/a_output.wav"));
    /// ```
    pub fn derive_outputs(&self, output_folder: &Path, suffix: &str) -> AdaptationSet {
        let items = self
            .items
            .iter()
            .map(|item| {
                let stem = item.basename().unwrap_or("item");
                AdaptationItem::from_wav_path(
                    output_folder.join(format!("{stem}{suffix}.{WAV_EXTENSION}")),
                )
            })
            .collect();
        AdaptationSet::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AdaptationItem> {
        self.items.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn from_folder_lists_only_matching_files_sorted() {
        let dir = tempdir().expect("temp dir");
        for name in ["b.wav", "a.WAV", "c.ptc", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        std::fs::create_dir(dir.path().join("sub.wav")).expect("dir");

        let set = AdaptationSet::from_folder(dir.path(), WAV_EXTENSION).expect("list");
        let names: Vec<_> = set.iter().filter_map(|i| i.basename()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn from_folder_ignores_nested_directories() {
        let dir = tempdir().expect("temp dir");
        std::fs::create_dir(dir.path().join("nested")).expect("dir");
        std::fs::write(dir.path().join("nested").join("x.wav"), b"x").expect("write");

        let set = AdaptationSet::from_folder(dir.path(), WAV_EXTENSION).expect("list");
        assert!(set.is_empty());
    }

    #[test]
    fn from_folder_missing_directory_is_error() {
        let dir = tempdir().expect("temp dir");
        assert!(AdaptationSet::from_folder(&dir.path().join("absent"), WAV_EXTENSION).is_err());
    }

    #[test]
    fn derive_outputs_is_index_aligned() {
        let inputs = AdaptationSet::new(vec![
            AdaptationItem::from_wav_path("in/one.wav"),
            AdaptationItem::from_wav_path("in/two.wav"),
        ]);
        let outputs = inputs.derive_outputs(Path::new("out"), "_output");

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.items[0].audio_file, Path::new("out/one_output.wav"));
        assert_eq!(outputs.items[1].audio_file, Path::new("out/two_output.wav"));
        assert_eq!(outputs.items[1].pitch_file, Path::new("out/two_output.ptc"));
    }
}
