//! Attribute collection for event report documents.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::EventReportError;

const REPORT_ELEMENT: &[u8] = b"MAP-event-report";
const EVENT_ELEMENT: &[u8] = b"event";
const VERSION_ATTRIBUTE: &[u8] = b"version";

/// Scan the document up to the first `event` element.
///
/// Returns the report `version` together with every attribute of that
/// element. Anything after the first event is never read.
pub(super) fn collect_attributes<R: BufRead>(
    input: R,
) -> Result<HashMap<String, String>, EventReportError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut attrs = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element) => {
                match element.name().as_ref() {
                    REPORT_ELEMENT => {
                        if let Some((key, value)) = version_attribute(&element)? {
                            tracing::debug!(version = %value, "MAP-event-report");
                            attrs.insert(key, value);
                        }
                    },
                    EVENT_ELEMENT => {
                        for attr in element.attributes() {
                            let (key, value) = decode(attr?)?;
                            attrs.insert(key, value);
                        }
                        return Ok(attrs);
                    },
                    _ => {},
                }
            },
            Event::Eof => return Err(EventReportError::MissingEvent),
            _ => {},
        }
        buf.clear();
    }
}

fn version_attribute(
    element: &BytesStart<'_>,
) -> Result<Option<(String, String)>, EventReportError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == VERSION_ATTRIBUTE {
            return decode(attr).map(Some);
        }
    }
    Ok(None)
}

fn decode(attr: Attribute<'_>) -> Result<(String, String), EventReportError> {
    let key = std::str::from_utf8(attr.key.as_ref())
        .map_err(|e| EventReportError::Encoding(e.to_string()))?
        .to_string();
    let value = attr.unescape_value()?.into_owned();
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_version_and_event_attributes() {
        let xml = r#"<MAP-event-report version="1.0"><event type="NewMessage" handle="12" folder="inbox"/></MAP-event-report>"#;
        let attrs = collect_attributes(xml.as_bytes()).unwrap();

        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs["version"], "1.0");
        assert_eq!(attrs["type"], "NewMessage");
        assert_eq!(attrs["handle"], "12");
        assert_eq!(attrs["folder"], "inbox");
    }

    #[test]
    fn test_stops_at_first_event() {
        let xml = r#"<MAP-event-report version="1.0">
            <event type="MessageDeleted" handle="1"/>
            <event type="NewMessage" handle="2" subject="later"/>
        </MAP-event-report>"#;
        let attrs = collect_attributes(xml.as_bytes()).unwrap();

        assert_eq!(attrs["type"], "MessageDeleted");
        assert_eq!(attrs["handle"], "1");
        assert!(!attrs.contains_key("subject"));
    }

    #[test]
    fn test_trailing_garbage_after_event_is_not_read() {
        let xml = r#"<MAP-event-report version="1.0"><event type="MemoryFull"/></oops><<<"#;
        let attrs = collect_attributes(xml.as_bytes()).unwrap();
        assert_eq!(attrs["type"], "MemoryFull");
    }

    #[test]
    fn test_unescapes_values() {
        let xml = r#"<MAP-event-report version="1.1"><event type="NewMessage" handle="1" subject="Tom &amp; Jerry"/></MAP-event-report>"#;
        let attrs = collect_attributes(xml.as_bytes()).unwrap();
        assert_eq!(attrs["subject"], "Tom & Jerry");
    }

    #[test]
    fn test_missing_event() {
        let xml = r#"<MAP-event-report version="1.0"></MAP-event-report>"#;
        assert_eq!(
            collect_attributes(xml.as_bytes()).unwrap_err(),
            EventReportError::MissingEvent
        );
    }

    #[test]
    fn test_malformed_document() {
        let xml = r#"<MAP-event-report version="1.0"><event type="NewMessage handle="1"/>"#;
        assert!(matches!(
            collect_attributes(xml.as_bytes()).unwrap_err(),
            EventReportError::Xml(_)
        ));
    }
}
