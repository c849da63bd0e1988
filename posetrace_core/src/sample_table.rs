//! Sample Table - ordered raw per-frame, per-joint trajectory samples.
//!
//! Rows come from a comma-separated log of the form
//! `frame, joint_name, x, y, z[, visibility]` in the source (Z-up) convention.
//! Loading is permissive: a malformed row is recorded as a rejection and
//! skipped, only an unreadable source fails the whole load.

use crate::error::{RowError, TableError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// RAW SAMPLE
// ============================================================================

/// One parsed trajectory row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Frame index this observation belongs to
    pub frame: i64,

    /// Joint name, matched verbatim against skeleton joint names
    pub joint_name: String,

    /// Position in source convention (Z-up, source units)
    pub position: Vector3<f64>,

    /// Upstream estimator visibility, if the row carried one
    pub visibility: Option<f64>,
}

impl RawSample {
    pub fn new(frame: i64, joint_name: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            frame,
            joint_name: joint_name.into(),
            position,
            visibility: None,
        }
    }

    /// Parses a single CSV line.
    ///
    /// Whitespace and `[`/`]` are stripped from every field and `,` inside a
    /// field becomes the decimal point. Fields are separated by `;` when the
    /// line contains one (decimal-comma exporters), otherwise by `,`.
    ///
    /// An unreadable visibility is dropped, the coordinates are kept.
    pub fn parse_line(line: &str) -> Result<Self, RowError> {
        let delimiter = if line.contains(';') { b';' } else { b',' };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(line.as_bytes());

        let record = match reader.records().next() {
            Some(Ok(record)) => record,
            Some(Err(e)) => return Err(RowError::Malformed(e.to_string())),
            None => return Err(RowError::MissingField(0)),
        };
        let fields: Vec<String> = record.iter().map(clean_field).collect();

        if fields.len() < 5 {
            return Err(RowError::MissingField(fields.len()));
        }

        let frame = fields[0]
            .parse::<i64>()
            .map_err(|_| RowError::InvalidFrame(fields[0].clone()))?;

        let joint_name = fields[1].clone();
        if joint_name.is_empty() {
            return Err(RowError::EmptyJointName);
        }

        let x = parse_coordinate('x', &fields[2])?;
        let y = parse_coordinate('y', &fields[3])?;
        let z = parse_coordinate('z', &fields[4])?;

        let visibility = fields
            .get(5)
            .filter(|v| !v.is_empty())
            .and_then(|raw| match raw.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    debug!("Frame {} {}: ignoring visibility {:?}", frame, joint_name, raw);
                    None
                }
            });

        Ok(Self {
            frame,
            joint_name,
            position: Vector3::new(x, y, z),
            visibility,
        })
    }
}

fn clean_field(field: &str) -> String {
    field
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '[' && *c != ']')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

fn parse_coordinate(axis: char, value: &str) -> Result<f64, RowError> {
    // f64::from_str always uses '.' regardless of host locale
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowError::InvalidCoordinate {
            axis,
            value: value.to_string(),
        }),
    }
}

/// A skipped input row, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    /// 1-based line number in the source
    pub line: usize,
    pub error: RowError,
}

// ============================================================================
// FRAME RANGE
// ============================================================================

/// Inclusive range of frame numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i64,
    pub end: i64,
}

impl FrameRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of frames in the range, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let span = self.end.abs_diff(self.start).saturating_add(1);
        usize::try_from(span).unwrap_or(usize::MAX)
    }

    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.start && frame <= self.end
    }

    pub fn frames(&self) -> impl Iterator<Item = i64> {
        self.start..=self.end
    }
}

// ============================================================================
// SAMPLE TABLE
// ============================================================================

/// Insertion-ordered collection of samples with a per-frame index.
///
/// Instance-scoped: each replay session owns its own table.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    samples: Vec<RawSample>,

    /// frame -> indices into `samples`, in table order
    by_frame: BTreeMap<i64, Vec<usize>>,

    rejected: Vec<RowRejection>,

    /// Data rows seen, parsed or rejected (header and blank lines excluded)
    row_count: usize,
}

impl SampleTable {
    /// Reads and parses a trajectory file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_lines(content.lines())?;
        info!(
            "Trajectory data loaded from {}: {} samples, {} rows skipped",
            path.display(),
            table.len(),
            table.rejected.len()
        );
        Ok(table)
    }

    /// Parses already-read rows. Blank lines are ignored, malformed rows are
    /// recorded in [`SampleTable::rejected`].
    pub fn from_lines<I, S>(lines: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        let mut first_row = true;

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let parsed = RawSample::parse_line(line);
            // an unparseable first row is the header
            if first_row && parsed.is_err() {
                debug!("Row {} taken as header", idx + 1);
            } else if parsed.is_err() {
                table.row_count += 1;
            }
            first_row = false;

            match parsed {
                Ok(sample) => table.push(sample),
                Err(error) => {
                    debug!("Skipping row {}: {}", idx + 1, error);
                    table.rejected.push(RowRejection {
                        line: idx + 1,
                        error,
                    });
                }
            }
        }

        if table.samples.is_empty() {
            return Err(TableError::NoSamples {
                rejected: table.rejected.len(),
            });
        }
        Ok(table)
    }

    /// Builds a table from already-parsed samples, preserving order.
    pub fn from_samples(samples: impl IntoIterator<Item = RawSample>) -> Self {
        let mut table = Self::default();
        for sample in samples {
            table.push(sample);
        }
        table
    }

    fn push(&mut self, sample: RawSample) {
        self.row_count += 1;
        let idx = self.samples.len();
        self.by_frame.entry(sample.frame).or_default().push(idx);
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn rejected(&self) -> &[RowRejection] {
        &self.rejected
    }

    /// Data rows read, including rejected ones.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// `(min_frame, max_frame)`: the frames of the first and last parsed
    /// samples. The header row never enters the table, so the first parsed
    /// sample is the second raw row.
    pub fn frame_range(&self) -> Option<FrameRange> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some(FrameRange::new(first.frame, last.frame))
    }

    /// Range stepped through by playback: starts at `min_frame` and spans one
    /// frame per complete block of `joints_per_frame` data rows. Rejected rows
    /// still count, so a malformed sample does not shorten playback.
    pub fn playback_range(&self, joints_per_frame: usize) -> Option<FrameRange> {
        let range = self.frame_range()?;
        let blocks = self.row_count / joints_per_frame.max(1);
        if blocks == 0 {
            return None;
        }
        let end = i64::try_from(blocks - 1)
            .ok()
            .and_then(|extra| range.start.checked_add(extra))
            .unwrap_or(i64::MAX);
        Some(FrameRange::new(range.start, end))
    }

    /// Samples of one frame, in table order.
    pub fn samples_for(&self, frame: i64) -> impl Iterator<Item = &RawSample> + '_ {
        self.by_frame
            .get(&frame)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.samples[idx])
    }

    /// The last sample for `joint_name` in `frame`.
    pub fn sample_at(&self, frame: i64, joint_name: &str) -> Option<&RawSample> {
        self.samples_for(frame)
            .filter(|s| s.joint_name == joint_name)
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
frame,joint,x,y,z,visibility
2,RHip,[100.0],[50.0],[900.0],0.9
2,LHip,-100.0,50.0,900.0,0.8
2,Head,0,0,1787
3,RHip,110.0,50.0,900.0,0.9
3,LHip,-90.0,50.0,900.0,0.7
3,Head,5,0,1790
";

    #[test]
    fn test_parse_line_strips_brackets_and_spaces() {
        let sample = RawSample::parse_line(" 7 , Head , [ 1.5 ] , [2] , [ -3.25 ] , [0.5]").unwrap();
        assert_eq!(sample.frame, 7);
        assert_eq!(sample.joint_name, "Head");
        assert_eq!(sample.position, Vector3::new(1.5, 2.0, -3.25));
        assert_eq!(sample.visibility, Some(0.5));
    }

    #[test]
    fn test_parse_line_decimal_comma_with_semicolons() {
        let sample = RawSample::parse_line("4;LAnkle;12,5;-3,75;80;0,9").unwrap();
        assert_eq!(sample.position, Vector3::new(12.5, -3.75, 80.0));
        assert_eq!(sample.visibility, Some(0.9));
    }

    #[test]
    fn test_parse_line_errors() {
        assert_eq!(
            RawSample::parse_line("frame,joint,x,y,z"),
            Err(RowError::InvalidFrame("frame".to_string()))
        );
        assert_eq!(RawSample::parse_line("1,Head,2"), Err(RowError::MissingField(3)));
        assert!(matches!(
            RawSample::parse_line("1,Head,abc,2,3"),
            Err(RowError::InvalidCoordinate { axis: 'x', .. })
        ));
        assert!(matches!(
            RawSample::parse_line("1,Head,1,2,NaN"),
            Err(RowError::InvalidCoordinate { axis: 'z', .. })
        ));
        assert_eq!(RawSample::parse_line("1,,1,2,3"), Err(RowError::EmptyJointName));
    }

    #[test]
    fn test_load_skips_malformed_rows() {
        let text = "frame,joint,x,y,z\n2,RHip,oops,0,0\n2,LHip,1,2,3\n\n2,Head,4,5,6\n";
        let table = SampleTable::from_lines(text.lines()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rejected().len(), 2);
        assert_eq!(table.rejected()[1].line, 2);
        assert_eq!(table.samples()[0].joint_name, "LHip");
        assert_eq!(table.samples()[1].joint_name, "Head");
    }

    #[test]
    fn test_load_without_samples_fails() {
        let result = SampleTable::from_lines(["frame,joint,x,y,z", "bad"]);
        assert!(matches!(result, Err(TableError::NoSamples { rejected: 2 })));
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let result = SampleTable::load("/definitely/not/here/trajectories.csv");
        assert!(matches!(result, Err(TableError::Io { .. })));
    }

    #[test]
    fn test_frame_range_and_lookup() {
        let table = SampleTable::from_lines(CSV.lines()).unwrap();
        assert_eq!(table.frame_range(), Some(FrameRange::new(2, 3)));

        let frame3: Vec<&str> = table.samples_for(3).map(|s| s.joint_name.as_str()).collect();
        assert_eq!(frame3, vec!["RHip", "LHip", "Head"]);
        assert_eq!(table.samples_for(9).count(), 0);
    }

    #[test]
    fn test_sample_at_last_occurrence_wins() {
        let table = SampleTable::from_samples([
            RawSample::new(2, "Head", Vector3::new(1.0, 0.0, 0.0)),
            RawSample::new(2, "Head", Vector3::new(2.0, 0.0, 0.0)),
            RawSample::new(3, "Head", Vector3::new(3.0, 0.0, 0.0)),
        ]);
        assert_eq!(table.sample_at(2, "Head").unwrap().position.x, 2.0);
        assert!(table.sample_at(2, "Neck").is_none());
    }

    #[test]
    fn test_playback_range_counts_complete_blocks() {
        let table = SampleTable::from_lines(CSV.lines()).unwrap();
        assert_eq!(table.playback_range(3), Some(FrameRange::new(2, 3)));
        assert_eq!(table.playback_range(4), Some(FrameRange::new(2, 2)));
        assert_eq!(table.playback_range(18), None);
    }

    #[test]
    fn test_malformed_row_keeps_its_frame_in_playback() {
        let text = "\
frame;joint;x;y;z
2;RHip;90;0;950
2;LHip;-90;0;950
3;RHip;90;0;950
3;LHip;-90;0;950
4;RHip;oops;0;950
4;LHip;-90;0;950
";
        let table = SampleTable::from_lines(text.lines()).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.row_count(), 6);
        assert_eq!(table.frame_range(), Some(FrameRange::new(2, 4)));
        assert_eq!(table.playback_range(2), Some(FrameRange::new(2, 4)));
    }

    #[test]
    fn test_unreadable_visibility_keeps_row() {
        let sample = RawSample::parse_line("3,Head,1,2,3,None").unwrap();
        assert_eq!(sample.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(sample.visibility, None);
    }

    #[test]
    fn test_unbalanced_quote_is_rejected() {
        assert!(matches!(
            RawSample::parse_line("3,\"Head,1,2,3"),
            Err(RowError::Malformed(_)) | Err(RowError::MissingField(_))
        ));
    }

    #[test]
    fn test_extreme_frame_numbers_do_not_overflow() {
        assert_eq!(FrameRange::new(i64::MIN, i64::MAX).len(), usize::MAX);
        assert_eq!(FrameRange::new(i64::MAX, i64::MAX).len(), 1);

        let table = SampleTable::from_samples([
            RawSample::new(i64::MAX - 1, "Head", Vector3::x()),
            RawSample::new(i64::MAX - 1, "Neck", Vector3::x()),
            RawSample::new(i64::MAX, "Head", Vector3::x()),
            RawSample::new(i64::MAX, "Neck", Vector3::x()),
        ]);
        assert_eq!(table.playback_range(1), Some(FrameRange::new(i64::MAX - 1, i64::MAX)));
    }

    #[test]
    fn test_frame_range_len() {
        assert_eq!(FrameRange::new(2, 5).len(), 4);
        assert!(FrameRange::new(5, 2).is_empty());
        assert_eq!(FrameRange::new(5, 2).len(), 0);
        assert!(FrameRange::new(2, 5).contains(5));
    }
}
