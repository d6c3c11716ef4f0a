//! CSV import for seeding a donation-request catalog.
//!
//! Expected header:
//! `id,title,category,current_amount,target_amount,urgency,created_at,expires_at,supporters,kind,detail`
//!
//! `detail` depends on `kind`: a currency code for `money`, `name:qty;name:qty` for `items`, and
//! the number of hours for `volunteer`. Every imported row is listed as approved.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::engagement::domain::{
    DonationRequest, DonationRequestId, ItemNeed, RequestDetails, RequestStatus, Urgency,
};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: usize, message: String },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Row { line, message } => {
                write!(f, "catalog row {} rejected: {}", line, message)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<DonationRequest>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<DonationRequest>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut requests = Vec::new();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record?;
            // header occupies line 1
            let line = index + 2;
            requests.push(row.into_request().map_err(|message| CatalogImportError::Row {
                line,
                message,
            })?);
        }

        Ok(requests)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    title: String,
    category: String,
    current_amount: f64,
    target_amount: f64,
    urgency: String,
    created_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    expires_at: Option<String>,
    #[serde(default)]
    supporters: u32,
    kind: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    detail: Option<String>,
}

impl CatalogRow {
    fn into_request(self) -> Result<DonationRequest, String> {
        let urgency = self
            .urgency
            .parse::<Urgency>()
            .map_err(|err| err.to_string())?;
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| format!("created_at '{}' is not a date", self.created_at))?;
        let expires_at = match self.expires_at.as_deref() {
            Some(raw) => {
                Some(parse_timestamp(raw).ok_or_else(|| format!("expires_at '{raw}' is not a date"))?)
            }
            None => None,
        };
        let details = parse_details(&self.kind, self.detail.as_deref())?;

        Ok(DonationRequest {
            id: DonationRequestId(self.id),
            title: self.title,
            category: self.category,
            current_amount: self.current_amount,
            target_amount: self.target_amount,
            urgency,
            created_at,
            expires_at,
            supporters: self.supporters,
            status: RequestStatus::Approved,
            details,
        })
    }
}

fn parse_details(kind: &str, detail: Option<&str>) -> Result<RequestDetails, String> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "money" => Ok(RequestDetails::Money {
            currency: detail.unwrap_or("USD").to_ascii_uppercase(),
        }),
        "items" => {
            let items = detail
                .unwrap_or_default()
                .split(';')
                .filter(|chunk| !chunk.trim().is_empty())
                .map(parse_item)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RequestDetails::Items { items })
        }
        "volunteer" => {
            let hours_needed = match detail {
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("volunteer hours '{raw}' is not a number"))?,
                None => 0,
            };
            Ok(RequestDetails::Volunteer {
                hours_needed,
                skills: Vec::new(),
                location: None,
            })
        }
        other => Err(format!("unknown request kind '{other}'")),
    }
}

fn parse_item(chunk: &str) -> Result<ItemNeed, String> {
    let (name, quantity) = chunk
        .split_once(':')
        .ok_or_else(|| format!("item '{}' must look like name:qty", chunk.trim()))?;
    let quantity_needed = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("item quantity '{}' is not a number", quantity.trim()))?;

    Ok(ItemNeed {
        name: name.trim().to_string(),
        quantity_needed,
        quantity_pledged: 0,
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str =
        "id,title,category,current_amount,target_amount,urgency,created_at,expires_at,supporters,kind,detail\n";

    #[test]
    fn imports_each_request_kind() {
        let csv = format!(
            "{HEADER}\
req-1,Surgery fund,Medical,500,1000,HIGH,2025-05-01T08:00:00Z,2025-06-15,12,money,eur\n\
req-2,Winter coats,Community,0,40,medium,2025-05-02,,3,items,coat:30;scarf:10\n\
req-3,Beach cleanup,Environment,0,1,LOW,2025-05-03,,0,volunteer,16\n"
        );

        let requests = CatalogImporter::from_reader(Cursor::new(csv)).expect("catalog parses");

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].urgency, Urgency::High);
        assert_eq!(
            requests[0].details,
            RequestDetails::Money {
                currency: "EUR".to_string()
            }
        );
        assert!(requests[0].expires_at.is_some());
        match &requests[1].details {
            RequestDetails::Items { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].name, "coat");
                assert_eq!(items[0].quantity_needed, 30);
            }
            other => panic!("expected items, got {other:?}"),
        }
        assert!(requests[1].expires_at.is_none());
        assert_eq!(requests[2].details.kind_label(), "volunteer");
        assert!(requests
            .iter()
            .all(|request| request.status == RequestStatus::Approved));
    }

    #[test]
    fn reports_line_of_bad_row() {
        let csv = format!(
            "{HEADER}\
req-1,Surgery fund,Medical,500,1000,HIGH,2025-05-01,,0,money,\n\
req-2,Mystery,Other,0,10,SEVERE,2025-05-01,,0,money,\n"
        );

        match CatalogImporter::from_reader(Cursor::new(csv)) {
            Err(CatalogImportError::Row { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("SEVERE"));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_dates_as_midnight_utc() {
        let parsed = parse_timestamp("2025-05-01").expect("date parses");
        assert_eq!(parsed.to_rfc3339(), "2025-05-01T00:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }
}
