use crate::error::Result;
use csv::ReaderBuilder;

/// One parsed CSV row: column names paired with raw string values, in file
/// order. No type coercion happens here; dates and flags are interpreted by
/// the filter stage.
#[derive(Debug, Clone, Default)]
pub struct Record {
    columns: Vec<(String, String)>,
}

impl Record {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            columns: pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }
}

/// Turn CSV text into records. The portal sometimes serves the file with a
/// UTF-8 BOM and the odd short row, both are tolerated.
pub fn parse_records(csv_text: &str) -> Result<Vec<Record>> {
    let text = csv_text.strip_prefix('\u{feff}').unwrap_or(csv_text);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let columns = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();
        records.push(Record { columns });
    }

    Ok(records)
}
