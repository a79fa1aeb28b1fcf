use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IngestError, IngestResult};
use crate::ingest::LogFileHandler;
use crate::log::LogFile;
use crate::settings::IngestOptions;

/// Parse a complete XML log document.
///
/// Only tokenizer-level problems are errors; anything the handler does not
/// recognise is skipped.
pub fn parse_log_bytes(bytes: &[u8], options: &IngestOptions) -> IngestResult<LogFile> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().expand_empty_elements = true;

    let mut handler = LogFileHandler::new(options.clone());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|source| IngestError::Xml {
            position: reader.error_position() as u64,
            source,
        })?;
        match event {
            Event::Start(start) => {
                let name = local_name(&start)?;
                let attributes = attributes(&start, reader.buffer_position() as u64)?;
                handler.start_element(&name, &attributes);
            }
            Event::End(end) => {
                let name = std::str::from_utf8(end.local_name().as_ref())?.to_string();
                handler.end_element(&name);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| IngestError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                })?;
                handler.characters(&text);
            }
            Event::CData(data) => {
                handler.characters(std::str::from_utf8(&data)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(handler.finish())
}

pub fn parse_log_str(text: &str, options: &IngestOptions) -> IngestResult<LogFile> {
    parse_log_bytes(text.as_bytes(), options)
}

fn local_name(start: &BytesStart<'_>) -> IngestResult<String> {
    Ok(std::str::from_utf8(start.local_name().as_ref())?.to_string())
}

fn attributes(start: &BytesStart<'_>, position: u64) -> IngestResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|source| IngestError::Attribute { position, source })?;
        let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|source| IngestError::Xml { position, source })?
            .into_owned();
        out.push((key, value));
    }
    Ok(out)
}
