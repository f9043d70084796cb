use serde_json::Value;

use crate::errors::ValidationError;
use crate::request_record::RequestRecord;

/// Validates a raw list of request descriptions, keeping their order.
///
/// The first bad entry aborts the whole list.
pub fn parse_request_list(raw: &Value) -> Result<Vec<RequestRecord>, ValidationError> {
    let entries = raw.as_array().ok_or(ValidationError::NotASequence)?;
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            RequestRecord::from_value(entry).map_err(|reason| ValidationError::Record { index, reason })
        })
        .collect()
}
