//! Scrubbing of patient-identifying metadata across a whole series.
//!
//! Only tag values are rewritten. Pixel data is shared with the raw series,
//! and nothing is written back to disk.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use crate::series::{DecodedSeries, Volume};
use crate::tags::{normalize_code, TagMap};

pub const SCRUBBED_MARKER: &str = "REMOVED";

/// Identifying fields replaced during de-identification. This is a fixed
/// viewer deny list, not a conformance profile.
pub const SENSITIVE_TAG_CODES: [&str; 18] = [
    "0010|0010", // Patient's Name
    "0010|0020", // Patient ID
    "0010|0030", // Patient's Birth Date
    "0008|0080", // Institution Name
    "0008|0090", // Referring Physician's Name
    "0008|1030", // Study Description
    "0008|0050", // Accession Number
    "0008|0020", // Study Date
    "0008|0030", // Study Time
    "0008|0021", // Series Date
    "0008|0031", // Series Time
    "0008|1040", // Institutional Department Name
    "0010|0040", // Patient's Sex
    "0010|1010", // Patient's Age
    "0008|103E", // Series Description
    "0010|2160", // Ethnic Group
    "0012|0062", // Patient Identity Removed
    "0040|A124", // UID
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveTagSet {
    codes: BTreeSet<String>,
}

impl SensitiveTagSet {
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|code| normalize_code(code.as_ref()))
                .collect(),
        }
    }

    /// The process-wide deny list.
    pub fn standard() -> &'static SensitiveTagSet {
        static STANDARD: OnceLock<SensitiveTagSet> = OnceLock::new();
        STANDARD.get_or_init(|| SensitiveTagSet::from_codes(SENSITIVE_TAG_CODES))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code) || self.codes.contains(&normalize_code(code))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

pub fn scrub_tag_map(tags: &TagMap, sensitive: &SensitiveTagSet) -> TagMap {
    tags.iter()
        .map(|(code, value)| {
            if sensitive.contains(code) {
                (code, SCRUBBED_MARKER)
            } else {
                (code, value)
            }
        })
        .collect()
}

/// Scrubs every frame's tag map, not just the one on screen.
pub fn deidentify(tag_maps: &[TagMap], sensitive: &SensitiveTagSet) -> Vec<TagMap> {
    tag_maps
        .iter()
        .map(|tags| scrub_tag_map(tags, sensitive))
        .collect()
}

/// De-identified companion of a raw series.
#[derive(Debug, Clone)]
pub struct DeidentifiedSeries {
    pub volume: Arc<Volume>,
    pub tag_maps: Vec<TagMap>,
}

impl DeidentifiedSeries {
    pub fn slice_count(&self) -> usize {
        self.tag_maps.len()
    }
}

pub fn deidentify_series(
    series: &DecodedSeries,
    sensitive: &SensitiveTagSet,
) -> DeidentifiedSeries {
    let tag_maps = deidentify(&series.tag_maps, sensitive);
    assert_parallel(&series.tag_maps, &tag_maps, sensitive);

    let scrubbed = tag_maps
        .iter()
        .map(|tags| tags.iter().filter(|(code, _)| sensitive.contains(code)).count())
        .sum::<usize>();
    log::info!(
        "De-identified {} slice(s), {} value(s) scrubbed",
        tag_maps.len(),
        scrubbed
    );

    DeidentifiedSeries {
        volume: Arc::clone(&series.volume),
        tag_maps,
    }
}

/// Panics unless `scrubbed` is a complete parallel copy of `raw`.
pub fn assert_parallel(raw: &[TagMap], scrubbed: &[TagMap], sensitive: &SensitiveTagSet) {
    assert_eq!(
        raw.len(),
        scrubbed.len(),
        "de-identified series must cover every frame"
    );
    for (index, (raw, scrubbed)) in raw.iter().zip(scrubbed).enumerate() {
        assert!(
            raw.same_keys(scrubbed),
            "tag codes of frame {index} differ after de-identification"
        );
        for (code, value) in scrubbed.iter() {
            if sensitive.contains(code) {
                assert_eq!(value, SCRUBBED_MARKER, "frame {index} leaks {code}");
            } else {
                assert_eq!(raw.get(code), Some(value), "frame {index} altered {code}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Frame;

    fn sample_maps() -> Vec<TagMap> {
        vec![
            [
                ("0010|0010", "Doe^Jane"),
                ("0010|0020", "PID-001"),
                ("0008|0060", "CT"),
                ("0008|103e", "AXIAL 5mm"),
                ("0028|1050", "40"),
            ]
            .into_iter()
            .collect(),
            [
                ("0010|0010", "Doe^Jane"),
                ("0008|0020", "20230615"),
                ("0008|0060", "CT"),
            ]
            .into_iter()
            .collect(),
            TagMap::new(),
        ]
    }

    #[test]
    fn standard_set_has_every_listed_code() {
        let set = SensitiveTagSet::standard();
        assert_eq!(set.len(), SENSITIVE_TAG_CODES.len());
        assert!(set.contains("0008|103e"));
        assert!(set.contains("0040|A124"));
        assert!(!set.contains("0008|0060"));
    }

    #[test]
    fn scrubs_sensitive_values_on_every_frame() {
        let sensitive = SensitiveTagSet::standard();
        let raw = sample_maps();
        let scrubbed = deidentify(&raw, sensitive);

        assert_eq!(scrubbed.len(), raw.len());
        for (raw, scrubbed) in raw.iter().zip(&scrubbed) {
            assert!(raw.same_keys(scrubbed));
            for (code, value) in scrubbed.iter() {
                if sensitive.contains(code) {
                    assert_eq!(value, SCRUBBED_MARKER);
                } else {
                    assert_eq!(raw.get(code), Some(value));
                }
            }
        }
        assert_eq!(scrubbed[1].get("0008|0020"), Some(SCRUBBED_MARKER));
        assert_eq!(scrubbed[0].get("0008|103e"), Some(SCRUBBED_MARKER));
        assert_eq!(scrubbed[0].get("0028|1050"), Some("40"));
    }

    #[test]
    fn deidentify_is_idempotent() {
        let sensitive = SensitiveTagSet::standard();
        let once = deidentify(&sample_maps(), sensitive);
        let twice = deidentify(&once, sensitive);
        assert_eq!(once, twice);
    }

    #[test]
    fn custom_sets_are_honoured() {
        let sensitive = SensitiveTagSet::from_codes(["0008|0060"]);
        let scrubbed = deidentify(&sample_maps(), &sensitive);
        assert_eq!(scrubbed[0].get("0008|0060"), Some(SCRUBBED_MARKER));
        assert_eq!(scrubbed[0].get("0010|0010"), Some("Doe^Jane"));
    }

    #[test]
    fn series_shares_pixels_with_the_raw_volume() {
        let frames = (0..3)
            .map(|i| Frame::new(1, 1, vec![i]).expect("frame"))
            .collect::<Vec<_>>();
        let series = DecodedSeries::new(Volume::new(frames).expect("volume"), sample_maps())
            .expect("series");

        let deidentified = deidentify_series(&series, SensitiveTagSet::standard());
        assert!(Arc::ptr_eq(&series.volume, &deidentified.volume));
        assert_eq!(deidentified.slice_count(), 3);
        assert_eq!(series.tag_value(0, "0010|0010"), Some("Doe^Jane"));
    }

    #[test]
    #[should_panic(expected = "tag codes of frame 0 differ")]
    fn parallel_check_rejects_dropped_keys() {
        let raw = sample_maps();
        let mut scrubbed = deidentify(&raw, SensitiveTagSet::standard());
        scrubbed[0] = TagMap::new();
        assert_parallel(&raw, &scrubbed, SensitiveTagSet::standard());
    }

    #[test]
    #[should_panic(expected = "cover every frame")]
    fn parallel_check_rejects_missing_frames() {
        let raw = sample_maps();
        let scrubbed = deidentify(&raw[..1], SensitiveTagSet::standard());
        assert_parallel(&raw, &scrubbed, SensitiveTagSet::standard());
    }
}
