//! Per-key feature tables built from a pose archive.

use crate::{
    alignment::Aligner,
    features::FeatureSet,
    parser::PoseArchive,
    stats::ColumnStatistics,
    Result,
};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Features of one model at one temporal key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    /// Key the row describes (archive key, or the requested key when aligned)
    pub key: f64,
    /// Archive key the features were taken from, if any pose was found
    pub matched_key: Option<f64>,
    /// Whether the alignment offset exceeded the tolerance
    pub flagged: bool,
    /// Number of poses the model recorded at the matched key
    pub detections: usize,
    /// Values in [`FeatureTable::labels`] order, sentinels for missing data
    pub values: Vec<f64>,
}

/// Feature rows for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    /// Model the rows were extracted for
    pub model_id: String,
    /// Column labels
    pub labels: Vec<String>,
    /// Rows in key order
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// One row per archive key; keys where the model is absent get sentinel rows
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the feature set mixes dimensionalities.
    pub fn build(archive: &PoseArchive, model_id: &str, set: &FeatureSet) -> Result<Self> {
        let mut rows = Vec::with_capacity(archive.len());
        for key in archive.keys() {
            let poses = archive.poses(key, model_id).unwrap_or_default();
            let pose = poses.first();
            let features = set.extract(pose.map(|p| &p.keypoints))?;
            rows.push(FeatureRow {
                key,
                matched_key: pose.map(|_| key),
                flagged: false,
                detections: poses.len(),
                values: features.to_row(),
            });
        }

        info!("Extracted {} feature rows for model '{}'", rows.len(), model_id);
        Ok(Self {
            model_id: model_id.to_string(),
            labels: set.labels(),
            rows,
        })
    }

    /// One row per requested key (video timestamps or frame numbers), each
    /// aligned to its nearest archive key
    ///
    /// # Errors
    ///
    /// Returns `Lookup` for an empty archive, otherwise as [`FeatureTable::build`].
    pub fn build_aligned<I>(
        archive: &PoseArchive,
        requests: I,
        aligner: &Aligner,
        model_id: &str,
        set: &FeatureSet,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut rows = Vec::new();
        for requested in requests {
            let found = aligner.lookup(archive, requested, model_id)?;
            let features = set.extract(found.as_ref().map(|m| m.keypoints()))?;
            rows.push(FeatureRow {
                key: requested,
                matched_key: found.as_ref().map(|m| m.matched_key),
                flagged: found.as_ref().is_some_and(|m| m.flagged),
                detections: found.as_ref().map_or(0, |m| m.detections),
                values: features.to_row(),
            });
        }

        let flagged = rows.iter().filter(|r| r.flagged).count();
        if flagged > 0 {
            warn!("{flagged} of {} aligned rows exceeded the tolerance", rows.len());
        }

        Ok(Self {
            model_id: model_id.to_string(),
            labels: set.labels(),
            rows,
        })
    }

    /// Statistics per column, skipping sentinels
    #[must_use]
    pub fn column_statistics(&self) -> Vec<(String, Option<ColumnStatistics>)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let column = self.rows.iter().filter_map(|row| row.values.get(idx).copied());
                (label.clone(), ColumnStatistics::from_values(column))
            })
            .collect()
    }

    /// Write the table as CSV
    ///
    /// # Errors
    ///
    /// Returns `Csv` or `Io` if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec![
            "key".to_string(),
            "matched_key".to_string(),
            "flagged".to_string(),
            "detections".to_string(),
        ];
        header.extend(self.labels.iter().cloned());
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.key.to_string(),
                row.matched_key.map(|k| k.to_string()).unwrap_or_default(),
                u8::from(row.flagged).to_string(),
                row.detections.to_string(),
            ];
            record.extend(row.values.iter().map(f64::to_string));
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the table as CSV to a file
    ///
    /// # Errors
    ///
    /// As [`FeatureTable::write_csv`], plus `Io` if the file cannot be created.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(file)?;
        info!("Wrote {} rows to {}", self.rows.len(), path.as_ref().display());
        Ok(())
    }

    /// Serialize the table as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
