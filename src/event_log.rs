//! An owned element tree for BigBlueButton `events.xml` files.
//!
//! The recording archive keeps every session event as an `<event>` element under a single
//! `<recording>` root, e.g.
//!
//! ```xml
//! <recording id="...">
//!   <event timestamp="2300" module="PARTICIPANT" eventname="RecordStatusEvent">
//!     <userId>w_jkbe7vlnnwgc</userId>
//!     <status>true</status>
//!   </event>
//! </recording>
//! ```
//!
//! Files are small enough to be loaded in full, so the document is read once into an
//! [`XmlElement`] tree and searched from there. Text is decoded according to the BOM or the
//! `encoding` of the XML declaration, older servers wrote `ISO-8859-1` logs.
use crate::err::{Error, Result};

use log::{debug, trace};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Attribute holding the event type of an `<event>` element.
pub const EVENT_NAME_ATTRIBUTE: &str = "eventname";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// The value of the `eventname` attribute, if this element is an event.
    pub fn event_name(&self) -> Option<&str> {
        self.attribute(EVENT_NAME_ATTRIBUTE)
    }

    /// Direct text content of the element, `None` if the element has no text at all.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// All elements below this one in document order (pre-order), not including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[derive(Debug, Clone)]
pub struct EventLog {
    root: XmlElement,
}

impl EventLog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading events from {}", path.display());

        let file = File::open(path).map_err(|source| Error::FailedToOpenFile {
            source,
            path: path.to_path_buf(),
        })?;

        Self::from_reader(Reader::from_reader(BufReader::new(file)))
    }

    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_reader(Reader::from_str(xml))
    }

    fn from_reader<R: BufRead>(reader: Reader<R>) -> Result<Self> {
        let root = parse_document(reader)?;
        debug!(
            "Parsed document with root `{}` ({} top level elements)",
            root.name,
            root.children.len()
        );
        Ok(EventLog { root })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

fn parse_document<R: BufRead>(mut reader: Reader<R>) -> Result<XmlElement> {
    reader.config_mut().expand_empty_elements = true;

    let mut open: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let offset = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::malformed(e, reader.error_position()))?;

        match event {
            Event::Start(start) => {
                let element = element_from_start(&start, reader.decoder(), offset)?;
                if open.is_empty() && root.is_some() {
                    return Err(Error::MultipleRootElements {
                        name: element.name,
                        offset,
                    });
                }
                trace!("Offset {}: <{}>", offset, element.name);
                open.push(element);
            }
            Event::End(end) => {
                // `check_end_names` (on by default) makes the reader fail on an end tag that
                // does not close the innermost open element, so there is always one to pop.
                let Some(element) = open.pop() else {
                    return Err(Error::UnexpectedEndTag {
                        name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        offset,
                    });
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| Error::malformed(e, offset))?;
                append_text(&mut open, &text, offset)?;
            }
            Event::CData(cdata) => {
                let text = cdata.decode().map_err(|e| Error::malformed(e, offset))?;
                append_text(&mut open, &text, offset)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes.
            _ => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(Error::UnclosedElement {
            name: element.name.clone(),
        });
    }

    root.ok_or(Error::MissingRootElement)
}

fn element_from_start(start: &BytesStart, decoder: Decoder, offset: u64) -> Result<XmlElement> {
    let decode = |bytes: &[u8]| -> Result<String> {
        decoder
            .decode(bytes)
            .map(|name| name.into_owned())
            .map_err(|e| Error::malformed(e, offset))
    };

    let mut element = XmlElement::new(decode(start.name().as_ref())?);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::malformed(e, offset))?;
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| Error::malformed(e, offset))?;

        element.attributes.push(XmlAttribute {
            name: decode(attr.key.as_ref())?,
            value: value.into_owned(),
        });
    }

    Ok(element)
}

fn append_text(open: &mut [XmlElement], text: &str, offset: u64) -> Result<()> {
    match open.last_mut() {
        Some(element) => {
            element
                .text
                .get_or_insert_with(String::new)
                .push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::TextOutsideRootElement { offset }),
    }
}
