// Saved-list export as CSV or JSON bytes

use bytes::Bytes;
use futures::{future, stream, Stream};

use crate::{error::ServiceError, models::ListItem, response::ApiResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    // Anything other than "csv" exports JSON
    pub fn parse(format: &str) -> Self {
        if format == "csv" {
            ExportFormat::Csv
        } else {
            ExportFormat::Json
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Csv => "trips.csv",
            ExportFormat::Json => "trips.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub body: Bytes,
}

impl ExportFile {
    pub fn render(items: &[ListItem], format: ExportFormat) -> Result<Self, ServiceError> {
        let body = match format {
            ExportFormat::Csv => to_csv(items)?,
            ExportFormat::Json => serde_json::to_vec(items)?,
        };
        Ok(Self {
            format,
            body: Bytes::from(body),
        })
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn filename(&self) -> &'static str {
        self.format.filename()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename())
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::once(future::ready(Ok(self.body)))
    }
}

// An export either yields a file or, for empty lists and failures, an envelope
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    File(ExportFile),
    Envelope(ApiResponse),
}

fn to_csv(items: &[ListItem]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for item in items {
        writer.serialize(item)?;
    }
    writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(format!("CSV flush failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use futures::StreamExt;

    fn items() -> Vec<ListItem> {
        vec![
            ListItem {
                id: "1".to_string(),
                origin: Some("CAN".to_string()),
                destination: Some("BOM".to_string()),
                cost: Some(812.0),
                duration: Some(13),
                kind: Some("train".to_string()),
                display_name: Some("from CAN to BOM by train".to_string()),
                added_date: Utc.with_ymd_and_hms(2024, 11, 24, 10, 18, 52).unwrap(),
            },
            ListItem {
                id: "2".to_string(),
                origin: None,
                destination: None,
                cost: None,
                duration: None,
                kind: None,
                display_name: None,
                added_date: Utc.with_ymd_and_hms(2024, 11, 23, 12, 58, 45).unwrap(),
            },
        ]
    }

    #[test]
    fn csv_has_header_and_one_row_per_item() {
        let file = ExportFile::render(&items(), ExportFormat::Csv).unwrap();
        let text = String::from_utf8(file.body.to_vec()).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,origin,destination,cost,duration,type,display_name,added_date"
        );
        assert!(lines[1].starts_with("1,CAN,BOM,812,13,train,from CAN to BOM by train,2024-11-24T10:18:52"));
        assert!(lines[2].starts_with("2,,,,,,,2024-11-23T12:58:45"));
        assert_eq!(lines.len(), 3);
        assert_eq!(file.content_type(), "text/csv");
        assert_eq!(file.content_disposition(), "attachment; filename=\"trips.csv\"");
    }

    #[test]
    fn json_is_an_array_of_projected_items() {
        let file = ExportFile::render(&items(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&file.body).unwrap();

        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["type"], "train");
        assert_eq!(value[1]["origin"], serde_json::Value::Null);
        assert_eq!(file.filename(), "trips.json");
        assert_eq!(file.content_type(), "application/json");
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        assert_eq!(ExportFormat::parse("csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("xml"), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("CSV"), ExportFormat::Json);
    }

    #[tokio::test]
    async fn stream_yields_the_whole_body() {
        let file = ExportFile::render(&items(), ExportFormat::Json).unwrap();
        let expected = file.body.clone();

        let chunks: Vec<_> = file.into_stream().collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), &expected);
    }
}
