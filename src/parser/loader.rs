//! Block-list JSON ingestion.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use serde_json::error::Category;

use crate::error::{Error, Result};
use crate::model::Document;

use super::builder;
use super::options::ParseOptions;
use super::raw::RawDocument;

/// Block-list parser.
///
/// Accepts either one document object or an array of document objects and
/// yields one [`Document`] per unit, in input order.
#[derive(Debug)]
pub struct BlockListParser {
    units: Vec<RawDocument>,
    input: String,
    options: ParseOptions,
}

impl BlockListParser {
    /// Open a block-list JSON file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a block-list JSON file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader_with_options(file, path.display().to_string(), options)
    }

    /// Parse block-list JSON from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse block-list JSON from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        Self::from_reader_with_options(Cursor::new(data), "<memory>", options)
    }

    /// Parse block-list JSON from a seekable reader.
    ///
    /// `input` names the stream in error messages.
    pub fn from_reader<R: Read + Seek>(reader: R, input: impl Into<String>) -> Result<Self> {
        Self::from_reader_with_options(reader, input, ParseOptions::default())
    }

    /// Parse block-list JSON from a seekable reader with custom options.
    pub fn from_reader_with_options<R: Read + Seek>(
        reader: R,
        input: impl Into<String>,
        options: ParseOptions,
    ) -> Result<Self> {
        let input = input.into();
        let units = decode_units(reader, &input)?;
        log::debug!("Decoded {} document(s) from {}", units.len(), input);
        Ok(Self {
            units,
            input,
            options,
        })
    }

    /// Number of decoded documents.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the input held no documents.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Build every document, failing on the first error.
    pub fn parse_all(self) -> Result<Vec<Document>> {
        let options = self.options;
        self.units
            .into_iter()
            .map(|unit| builder::from_raw(unit, &options))
            .collect()
    }

    /// Build every document independently, so one bad unit does not hide
    /// the others.
    pub fn parse_each(self) -> Vec<Result<Document>> {
        let options = self.options;
        self.units
            .into_iter()
            .map(|unit| builder::from_raw(unit, &options))
            .collect()
    }

    /// Build the first document.
    pub fn parse(self) -> Result<Document> {
        let unit = self
            .units
            .into_iter()
            .next()
            .ok_or(Error::EmptyInput(self.input))?;
        builder::from_raw(unit, &self.options)
    }
}

/// Decode an array of documents, or a single document when the input is not
/// an array.
fn decode_units<R: Read + Seek>(mut reader: R, input: &str) -> Result<Vec<RawDocument>> {
    let start = reader.stream_position();

    let attempt: serde_json::Result<Vec<serde_json::Value>> =
        serde_json::from_reader(BufReader::new(&mut reader));

    match attempt {
        Ok(values) => values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value(value).map_err(|source| Error::Decode {
                    input: format!("{} (document {})", input, i),
                    source,
                })
            })
            .collect(),
        Err(e) if e.classify() == Category::Data => {
            log::debug!("{} is not an array, decoding a single document", input);
            let rewind = |source: std::io::Error| Error::Rewind {
                input: input.to_string(),
                source,
            };
            let start = start.map_err(rewind)?;
            reader.seek(SeekFrom::Start(start)).map_err(rewind)?;

            let unit: RawDocument = serde_json::from_reader(BufReader::new(&mut reader))
                .map_err(|source| decode_error(input, source))?;
            Ok(vec![unit])
        }
        Err(e) => Err(decode_error(input, e)),
    }
}

fn decode_error(input: &str, source: serde_json::Error) -> Error {
    if source.is_io() {
        Error::Io(source.into())
    } else {
        Error::Decode {
            input: input.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "DocumentMetadata": {"Pages": 1},
        "Blocks": [
            {"Id": "p1", "BlockType": "PAGE", "Page": 1,
             "Relationships": [{"Type": "CHILD", "Ids": ["l1"]}]},
            {"Id": "l1", "BlockType": "LINE", "Text": "Hello World", "Page": 1}
        ]
    }"#;

    #[test]
    fn test_single_object() {
        let parser = BlockListParser::from_bytes(SINGLE.as_bytes()).unwrap();
        assert_eq!(parser.len(), 1);
        let doc = parser.parse().unwrap();
        assert_eq!(doc.pages()[0].lines()[0].text(), "Hello World");
    }

    #[test]
    fn test_array_of_objects() {
        let json = format!("[{}, {}]", SINGLE, SINGLE);
        let docs = BlockListParser::from_bytes(json.as_bytes())
            .unwrap()
            .parse_all()
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_fallback_respects_start_position() {
        let mut data = b"garbage".to_vec();
        data.extend_from_slice(SINGLE.as_bytes());
        let mut cursor = Cursor::new(data);
        cursor.seek(SeekFrom::Start(7)).unwrap();
        let doc = BlockListParser::from_reader(cursor, "offset")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_syntax_error_names_input() {
        let err = BlockListParser::from_reader(Cursor::new(b"{ not json"), "broken.json")
            .unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_scalar_input_is_a_decode_error() {
        let err = BlockListParser::from_bytes(b"42").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_bad_array_element_names_its_position() {
        let json = format!("[{}, {{\"Blocks\": 3}}]", SINGLE);
        let err = BlockListParser::from_bytes(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("document 1"));
    }

    #[test]
    fn test_empty_array_has_no_document() {
        let parser = BlockListParser::from_bytes(b"[]").unwrap();
        assert!(parser.is_empty());
        assert!(matches!(parser.parse(), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_parse_each_isolates_failures() {
        let json = format!("[{}, {{\"Blocks\": [null]}}]", SINGLE);
        let results = BlockListParser::from_bytes(json.as_bytes())
            .unwrap()
            .parse_each();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::NullBlock(0))));
    }
}
