use crate::domain::model::{Record, SheetTable};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use url::Url;

const SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d/";

/// CSV export URL of one tab of a publicly shared spreadsheet.
pub fn sheet_export_url(sheet_id: &str, sheet_name: &str) -> Result<String> {
    let invalid = |reason: String| EtlError::InvalidConfigValueError {
        field: "source.sheet_id".to_string(),
        value: sheet_id.to_string(),
        reason,
    };

    let mut url = Url::parse(SHEETS_BASE_URL).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("base URL cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend([sheet_id.trim(), "gviz", "tq"]);
    url.query_pairs_mut()
        .append_pair("tqx", "out:csv")
        .append_pair("sheet", sheet_name);
    Ok(url.to_string())
}

/// Downloads the export body. Any non-2xx status is an error.
pub async fn fetch_sheet_csv(client: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("Requesting sheet export: {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    tracing::debug!("Sheet export response status: {}", status);

    if !status.is_success() {
        return Err(EtlError::SourceStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.bytes().await?;
    Ok(body.to_vec())
}

/// Parses an exported sheet. Headers are trimmed, ragged rows tolerated and
/// blank rows skipped.
pub fn parse_sheet(bytes: &[u8]) -> Result<SheetTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        if row.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        records.push(Record {
            line: row.position().map(|p| p.line() as usize).unwrap_or(index + 2),
            values: row.iter().map(str::to_string).collect(),
        });
    }

    tracing::debug!("Parsed {} rows with headers {:?}", records.len(), headers);
    Ok(SheetTable { headers, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_sheet_export_url_encodes_sheet_name() {
        let url = sheet_export_url("abc123", "Respuestas de formulario 1").unwrap();
        assert_eq!(
            url,
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out%3Acsv&sheet=Respuestas+de+formulario+1"
        );
    }

    #[test]
    fn test_sheet_export_url_keeps_id_inside_path() {
        let url = sheet_export_url("//other.host?x#y", "Hoja").unwrap();
        assert!(url.starts_with("https://docs.google.com/spreadsheets/d/"));
        assert!(url.contains("%2F%2Fother.host%3Fx%23y/gviz/tq?"));
        assert!(url.ends_with("sheet=Hoja"));
    }

    #[test]
    fn test_parse_sheet_keeps_duplicated_headers_apart() {
        let csv = "Marca temporal,Código,Estado,Estilo,Estilo
17/03/2024 10:00:00,20001,Lleno,IPA,
";
        let table = parse_sheet(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Marca temporal", "Código", "Estado", "Estilo", "Estilo"]);
        assert_eq!(table.records[0].get(3), Some("IPA"));
        assert_eq!(table.records[0].get(4), Some(""));
    }

    #[test]
    fn test_parse_sheet_trims_headers_and_skips_blank_rows() {
        let csv = "\u{feff}Marca temporal, Código ,Estado\n17/03/2024 14:05:33,20001,Lleno\n,,\n18/03/2024 10:00:00,30001\n";
        let table = parse_sheet(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Marca temporal", "Código", "Estado"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get(1), Some("20001"));
        assert_eq!(table.records[0].line, 2);
        // ragged row: missing trailing cell
        assert_eq!(table.records[1].get(2), None);
        assert_eq!(table.records[1].line, 4);
    }

    #[test]
    fn test_parse_empty_sheet() {
        let table = parse_sheet(b"").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sheet_csv_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/export");
                then.status(200)
                    .header("Content-Type", "text/csv")
                    .body("Código\n20001\n");
            })
            .await;

        let client = Client::new();
        let body = fetch_sheet_csv(&client, &server.url("/export"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, b"C\xC3\xB3digo\n20001\n");
    }

    #[tokio::test]
    async fn test_fetch_sheet_csv_http_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let client = Client::new();
        let err = fetch_sheet_csv(&client, &server.url("/missing"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, EtlError::SourceStatus { status: 404, .. }));
    }
}
