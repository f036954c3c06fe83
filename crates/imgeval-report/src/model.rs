//! The persisted report model consumed by the viewer.
//!
//! Serialized layout:
//!
//! ```text
//! {
//!   "imageBoxes": [
//!     { "title": "Images", "elements": [Reference, test 0, test 1, ...] },
//!     { "title": "L1",     "elements": [test 0, test 1, ...] },   // one box per metric
//!     ...
//!     { "title": "NP SMAPE", "elements": [test 0, ...] }          // optional
//!   ],
//!   "stats": [
//!     { "title": "Stats", "labels": [...],
//!       "series": [ { "label": "L1", "data": ["0.123456", ...],
//!                     "track": { "x": [[...]], "y": [[...]] } } ] }
//!   ]
//! }
//! ```
//!
//! # Alignment
//!
//! `labels[i]`, `series[m].data[i]`, element [`image_slot(i)`] of the
//! `"Images"` box, element `i` of metric box [`metric_box_index(m)`] and
//! element `i` of the optional NP box all describe the same test. The
//! model's fields are private; every mutation goes through a method
//! that checks the whole invariant before touching anything.

use serde::{Deserialize, Serialize};

use imgeval_metrics::Metric;

use crate::error::ReportError;

/// Title of the first image box.
pub const IMAGES_BOX_TITLE: &str = "Images";

/// Title of the optional signed-SMAPE image box.
pub const NEGPOS_BOX_TITLE: &str = "NP SMAPE";

/// Title of the stats block.
pub const STATS_TITLE: &str = "Stats";

/// Title of the reference entry in the `"Images"` box.
pub const REFERENCE_LABEL: &str = "Reference";

/// Version string stored on every image element.
pub const ELEMENT_VERSION: &str = "-";

/// Position of the `"Images"` box.
pub const IMAGES_BOX: usize = 0;

/// Image-box position of the false-color box for series `series_index`.
///
/// Box 0 is the `"Images"` catalog, so metric boxes are shifted by one
/// relative to the series list.
#[must_use]
pub const fn metric_box_index(series_index: usize) -> usize {
    series_index + 1
}

/// Element position in the `"Images"` box of the test at `label_index`.
///
/// Slot 0 holds the reference image.
#[must_use]
pub const fn image_slot(label_index: usize) -> usize {
    label_index + 1
}

/// A named, ordered catalog of thumbnails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBox {
    /// Box title shown by the viewer.
    pub title: String,
    /// Thumbnails, in test order.
    pub elements: Vec<ImageElement>,
}

impl ImageBox {
    fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }
}

/// One thumbnail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Test label.
    pub title: String,
    /// Always [`ELEMENT_VERSION`].
    pub version: String,
    /// Image file name, relative to the report directory.
    pub image: String,
}

impl ImageElement {
    /// Create an element with the default version marker.
    #[must_use]
    pub fn new(title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: ELEMENT_VERSION.to_owned(),
            image: image.into(),
        }
    }
}

/// The stats block: test labels and one series per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Block title.
    pub title: String,
    /// Test labels in arrival order.
    pub labels: Vec<String>,
    /// One series per metric, in metric-box order.
    pub series: Vec<Series>,
}

/// Mean errors of one metric across all tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Upper-case metric name.
    pub label: String,
    /// Six-decimal mean error per test.
    pub data: Vec<String>,
    /// Convergence curves, one per tracked test.
    #[serde(default)]
    pub track: Track,
}

/// Convergence curves of one metric: `x[k]` are the timestamps and
/// `y[k]` the errors of the `k`-th tracked test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Timestamp sequences.
    pub x: Vec<Vec<f64>>,
    /// Error sequences, parallel to `x`.
    pub y: Vec<Vec<f64>>,
}

impl Track {
    /// Number of curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if no curve has been tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Result of looking a label up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLookup {
    /// The label exists at this index of `labels`.
    Found(usize),
    /// The label is not in the report.
    NotFound,
}

/// Everything needed to append one new test to the report.
#[derive(Debug, Clone, PartialEq)]
pub struct TestEntry {
    /// Test label.
    pub label: String,
    /// LDR thumbnail element for the `"Images"` box.
    pub ldr: ImageElement,
    /// One value per report series.
    pub values: Vec<SeriesValue>,
    /// Signed visualization element; required exactly when the report
    /// has an NP box.
    pub negpos: Option<ImageElement>,
}

/// A metric result destined for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesValue {
    /// Index into `stats.series`.
    pub series: usize,
    /// Six-decimal mean error.
    pub value: String,
    /// False-color element for the metric box.
    pub falsecolor: ImageElement,
}

/// The report: image catalogs plus the stats block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    image_boxes: Vec<ImageBox>,
    #[serde(with = "singleton")]
    stats: Stats,
}

/// Serde support for the stats block, stored as a one-element list.
mod singleton {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Stats;

    /// Serialize the stats block as `[stats]`.
    pub fn serialize<S: Serializer>(stats: &Stats, serializer: S) -> Result<S::Ok, S::Error> {
        std::slice::from_ref(stats).serialize(serializer)
    }

    /// Deserialize `[stats]`, rejecting any other list length.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Stats, D::Error> {
        let mut blocks = Vec::<Stats>::deserialize(deserializer)?;
        match (blocks.pop(), blocks.is_empty()) {
            (Some(stats), true) => Ok(stats),
            (popped, _) => Err(serde::de::Error::invalid_length(
                blocks.len() + usize::from(popped.is_some()),
                &"exactly one stats block",
            )),
        }
    }
}

impl ReportModel {
    /// Create an empty report holding only the reference image.
    ///
    /// One image box and one series are created per metric, in the
    /// given order; `negpos` adds a trailing NP box.
    #[must_use]
    pub fn new(reference: ImageElement, metrics: &[Metric], negpos: bool) -> Self {
        let mut images = ImageBox::empty(IMAGES_BOX_TITLE);
        images.elements.push(reference);

        let mut image_boxes = vec![images];
        image_boxes.extend(metrics.iter().map(|m| ImageBox::empty(m.name())));
        if negpos {
            image_boxes.push(ImageBox::empty(NEGPOS_BOX_TITLE));
        }

        let series = metrics
            .iter()
            .map(|m| Series {
                label: m.name().to_owned(),
                data: Vec::new(),
                track: Track::default(),
            })
            .collect();

        Self {
            image_boxes,
            stats: Stats {
                title: STATS_TITLE.to_owned(),
                labels: Vec::new(),
                series,
            },
        }
    }

    /// All image boxes, `"Images"` first.
    #[must_use]
    pub fn image_boxes(&self) -> &[ImageBox] {
        &self.image_boxes
    }

    /// The stats block.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Test labels in arrival order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.stats.labels
    }

    /// All series, in metric-box order.
    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.stats.series
    }

    /// Number of tests in the report.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.stats.labels.len()
    }

    /// Look up a test label.
    #[must_use]
    pub fn lookup(&self, label: &str) -> LabelLookup {
        self.stats
            .labels
            .iter()
            .position(|l| l == label)
            .map_or(LabelLookup::NotFound, LabelLookup::Found)
    }

    /// Index of the series holding `metric`, matched by label.
    #[must_use]
    pub fn series_index(&self, metric: Metric) -> Option<usize> {
        self.stats
            .series
            .iter()
            .position(|s| s.label == metric.name())
    }

    /// Metric of every series, in series order.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Metric`] if a series label is not a known
    /// metric.
    pub fn metrics(&self) -> Result<Vec<Metric>, ReportError> {
        self.stats
            .series
            .iter()
            .map(|s| s.label.parse::<Metric>().map_err(ReportError::from))
            .collect()
    }

    /// Whether the report carries a trailing NP box.
    #[must_use]
    pub fn has_negpos(&self) -> bool {
        self.image_boxes.len() == metric_box_index(self.stats.series.len()) + 1
            && self
                .image_boxes
                .last()
                .is_some_and(|b| b.title == NEGPOS_BOX_TITLE)
    }

    /// Check the alignment invariant across labels, series, image boxes
    /// and convergence tracks.
    ///
    /// Besides the lengths, every element title must name the test its
    /// position belongs to, the `"Images"` box must lead with the
    /// reference, and labels and series labels must be distinct.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Corrupt`] describing the first violation.
    pub fn validate(&self) -> Result<(), ReportError> {
        let labels = &self.stats.labels;
        let n = labels.len();
        let series_count = self.stats.series.len();
        let negpos = usize::from(self.has_negpos());
        let expected_boxes = metric_box_index(series_count) + negpos;

        if self.image_boxes.len() != expected_boxes {
            return Err(ReportError::Corrupt(format!(
                "{} image boxes for {series_count} series",
                self.image_boxes.len()
            )));
        }

        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ReportError::Corrupt(format!("label {label:?} is repeated")));
            }
        }

        let images = &self.image_boxes[IMAGES_BOX];
        if images.title != IMAGES_BOX_TITLE {
            return Err(ReportError::Corrupt(format!(
                "first image box is {:?}, not {IMAGES_BOX_TITLE:?}",
                images.title
            )));
        }
        if images.elements.len() != image_slot(n) {
            return Err(ReportError::Corrupt(format!(
                "box {:?} has {} elements for {n} labels",
                images.title,
                images.elements.len()
            )));
        }
        if images.elements[0].title != REFERENCE_LABEL {
            return Err(ReportError::Corrupt(format!(
                "box {:?} starts with {:?}, not the reference",
                images.title, images.elements[0].title
            )));
        }
        check_titles(images, &images.elements[image_slot(0)..], labels)?;

        for (m, series) in self.stats.series.iter().enumerate() {
            if self.stats.series[..m].iter().any(|s| s.label == series.label) {
                return Err(ReportError::Corrupt(format!(
                    "series {} is repeated",
                    series.label
                )));
            }
            if series.data.len() != n {
                return Err(ReportError::Corrupt(format!(
                    "series {} has {} values for {n} labels",
                    series.label,
                    series.data.len()
                )));
            }
            let image_box = &self.image_boxes[metric_box_index(m)];
            if image_box.title != series.label {
                return Err(ReportError::Corrupt(format!(
                    "image box {:?} is out of order with series {}",
                    image_box.title, series.label
                )));
            }
            check_titles(image_box, &image_box.elements, labels)?;
            let track = &series.track;
            if track.x.len() != track.y.len()
                || track.x.iter().zip(&track.y).any(|(x, y)| x.len() != y.len())
            {
                return Err(ReportError::Corrupt(format!(
                    "series {} has misaligned convergence tracks",
                    series.label
                )));
            }
        }

        if negpos == 1 {
            let np = &self.image_boxes[expected_boxes - 1];
            check_titles(np, &np.elements, labels)?;
        }

        Ok(())
    }

    /// Append a new test to every series and image box at once.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DuplicateLabel`] if the label is already
    /// present, or [`ReportError::Corrupt`] if `entry` does not supply
    /// exactly one value per series (and an NP element exactly when the
    /// report has an NP box) or an element is not titled with the label.
    /// The model is unchanged on error.
    pub fn append_test(&mut self, entry: TestEntry) -> Result<(), ReportError> {
        if let LabelLookup::Found(_) = self.lookup(&entry.label) {
            return Err(ReportError::DuplicateLabel(entry.label));
        }
        let series_count = self.stats.series.len();
        if entry.values.len() != series_count || !distinct_in_range(&entry.values, series_count)
        {
            return Err(ReportError::Corrupt(format!(
                "entry {:?} supplies {} values for {series_count} series",
                entry.label,
                entry.values.len()
            )));
        }
        let mistitled = std::iter::once(&entry.ldr)
            .chain(entry.values.iter().map(|v| &v.falsecolor))
            .chain(&entry.negpos)
            .find(|element| element.title != entry.label);
        if let Some(element) = mistitled {
            return Err(ReportError::Corrupt(format!(
                "element {:?} is titled {:?}",
                element.image, element.title
            )));
        }
        let negpos = self.has_negpos();
        if entry.negpos.is_some() != negpos {
            return Err(ReportError::Corrupt(format!(
                "entry {:?} NP image does not match report layout",
                entry.label
            )));
        }

        self.image_boxes[IMAGES_BOX].elements.push(entry.ldr);
        self.stats.labels.push(entry.label);
        for value in entry.values {
            self.stats.series[value.series].data.push(value.value);
            self.image_boxes[metric_box_index(value.series)]
                .elements
                .push(value.falsecolor);
        }
        if let (Some(np), Some(np_box)) = (entry.negpos, self.image_boxes.last_mut()) {
            np_box.elements.push(np);
        }
        Ok(())
    }

    /// Overwrite an existing test's thumbnail and series values in place.
    ///
    /// `values` pairs a series index with its new six-decimal value; a
    /// subset of the series may be given. Metric-box elements are left
    /// untouched because their file names never change.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Corrupt`] if `index` or a series index is
    /// out of range or repeated, or if `ldr` is not titled with the
    /// test's label. The model is unchanged on error.
    pub fn overwrite_test(
        &mut self,
        index: usize,
        ldr: ImageElement,
        values: Vec<(usize, String)>,
    ) -> Result<(), ReportError> {
        let series_count = self.stats.series.len();
        if index >= self.stats.labels.len() {
            return Err(ReportError::Corrupt(format!(
                "test index {index} out of range for {} labels",
                self.stats.labels.len()
            )));
        }
        if ldr.title != self.stats.labels[index] {
            return Err(ReportError::Corrupt(format!(
                "element {:?} is titled {:?}, not {:?}",
                ldr.image, ldr.title, self.stats.labels[index]
            )));
        }
        for (k, (series, _)) in values.iter().enumerate() {
            if *series >= series_count || values[..k].iter().any(|(s, _)| s == series) {
                return Err(ReportError::Corrupt(format!(
                    "series index {series} is out of range or repeated"
                )));
            }
        }

        self.image_boxes[IMAGES_BOX].elements[image_slot(index)] = ldr;
        for (series, value) in values {
            self.stats.series[series].data[index] = value;
        }
        Ok(())
    }

    /// Append one convergence curve to a series.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Corrupt`] if the series index is out of
    /// range or `x` and `y` differ in length.
    pub fn append_track(
        &mut self,
        series: usize,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<(), ReportError> {
        if x.len() != y.len() {
            return Err(ReportError::Corrupt(format!(
                "{} timestamps for {} errors",
                x.len(),
                y.len()
            )));
        }
        let Some(target) = self.stats.series.get_mut(series) else {
            return Err(ReportError::Corrupt(format!(
                "series index {series} out of range"
            )));
        };
        target.track.x.push(x);
        target.track.y.push(y);
        Ok(())
    }
}

/// `elements` must be exactly one per label, titled in label order.
fn check_titles(
    image_box: &ImageBox,
    elements: &[ImageElement],
    labels: &[String],
) -> Result<(), ReportError> {
    if elements.len() != labels.len() {
        return Err(ReportError::Corrupt(format!(
            "box {:?} has {} elements for {} labels",
            image_box.title,
            elements.len(),
            labels.len()
        )));
    }
    match elements.iter().zip(labels).position(|(e, l)| &e.title != l) {
        Some(i) => Err(ReportError::Corrupt(format!(
            "box {:?} holds {:?} where {:?} belongs",
            image_box.title, elements[i].title, labels[i]
        ))),
        None => Ok(()),
    }
}

fn distinct_in_range(values: &[SeriesValue], series_count: usize) -> bool {
    values.iter().enumerate().all(|(k, v)| {
        v.series < series_count && !values[..k].iter().any(|w| w.series == v.series)
    })
}
