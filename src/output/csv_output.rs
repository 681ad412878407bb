//! CSV sink for harvested listings

use crate::crawler::ListingRecord;
use crate::output::traits::{OutputResult, RecordSink};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Columns present in every output file
pub const BASE_COLUMNS: [&str; 5] = ["title", "url", "price", "location", "image"];

/// Columns appended when enrichment is enabled
pub const EXTENDED_COLUMNS: [&str; 10] = [
    "description",
    "seller_type",
    "parameters",
    "gallery",
    "id",
    "views",
    "seller_name",
    "seller_rating",
    "seller_reviews",
    "deliveries",
];

/// Fixed column layout of one run's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Base,
    Enriched,
}

impl Schema {
    pub fn for_mode(enrich: bool) -> Self {
        if enrich {
            Self::Enriched
        } else {
            Self::Base
        }
    }

    /// Header row
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            Self::Base => BASE_COLUMNS.to_vec(),
            Self::Enriched => BASE_COLUMNS.iter().chain(EXTENDED_COLUMNS.iter()).copied().collect(),
        }
    }

    /// Renders a record as one row with exactly one cell per column
    ///
    /// Absent fields become empty cells. Under `Enriched`, a record without
    /// details still gets every extended column.
    pub fn row(&self, record: &ListingRecord) -> Vec<String> {
        let mut row = vec![
            cell(&record.title),
            record.url.clone(),
            cell(&record.price),
            cell(&record.location),
            cell(&record.image),
        ];

        if *self == Self::Enriched {
            match &record.details {
                Some(d) => row.extend([
                    cell(&d.description),
                    cell(&d.seller_type),
                    d.parameters_json(),
                    d.gallery_joined(),
                    cell(&d.listing_id),
                    cell(&d.views),
                    cell(&d.seller_name),
                    cell(&d.seller_rating),
                    cell(&d.seller_reviews),
                    cell(&d.deliveries),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(EXTENDED_COLUMNS.len())),
            }
        }

        row
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Writes one CSV file, flushing after every row
pub struct CsvSink {
    writer: csv::Writer<File>,
    schema: Schema,
    path: PathBuf,
    rows: usize,
}

impl CsvSink {
    /// Creates (or truncates) the file at `path` and writes the header
    ///
    /// Missing parent directories are created.
    pub fn create(path: &Path, schema: Schema) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().from_writer(file);
        writer.write_record(schema.columns())?;
        writer.flush()?;

        tracing::debug!("Opened {} with {:?} schema", path.display(), schema);

        Ok(Self {
            writer,
            schema,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

}

impl RecordSink for CsvSink {
    fn append(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.writer.write_record(self.schema.row(record))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows
    }

    fn close(mut self) -> OutputResult<usize> {
        self.writer.flush()?;
        tracing::debug!("Closed {} after {} rows", self.path.display(), self.rows);
        Ok(self.rows)
    }
}
