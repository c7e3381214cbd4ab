//! XML deserialization of website configuration documents.
//!
//! Unknown elements are skipped so that documents carrying fields this crate
//! does not model still parse.

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use sitecfg_model::{
    Condition, ErrorDocument, IndexDocument, Protocol, Redirect, RedirectAllRequestsTo,
    RoutingRule, WebsiteConfiguration,
};

use crate::error::XmlError;
use crate::serialize::WEBSITE_ROOT;

/// Trait for deserializing document types from XML.
///
/// The root element has already been consumed by the caller; the
/// implementation reads child elements until the matching end tag.
pub trait XmlDeserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize an XML document into a typed value.
///
/// Finds the root element, checks its name, and delegates to the type's
/// [`XmlDeserialize`] implementation.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed, the root element has a
/// different name, or deserialization fails.
pub fn from_xml<T: XmlDeserialize>(root_element: &str, xml: &[u8]) -> Result<T, XmlError> {
    // Text is kept verbatim: leading and trailing spaces are part of keys and
    // prefixes. Whitespace between structural elements is ignored by the
    // child walkers.
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    // Skip the XML declaration and find the root element.
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = tag_name(&e)?;
                if name != root_element {
                    return Err(XmlError::UnexpectedElement(name));
                }
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement(root_element.to_owned()));
            }
            _ => {}
        }
    }
}

/// Deserialize a [`WebsiteConfiguration`] document.
///
/// # Errors
///
/// Returns `XmlError` if the document is malformed.
pub fn website_from_xml(xml: &[u8]) -> Result<WebsiteConfiguration, XmlError> {
    from_xml(WEBSITE_ROOT, xml)
}

/// How a child element was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    /// `<Tag>...</Tag>`: content follows.
    Open,
    /// `<Tag/>`: no content, no end tag.
    Empty,
}

fn tag_name(e: &BytesStart<'_>) -> Result<String, XmlError> {
    let name = e.name();
    std::str::from_utf8(name.as_ref())
        .map(ToOwned::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Walk the children of the current element, calling `on_child` with each
/// child's tag name. Returns once the current element's end tag is consumed.
fn for_each_child<F>(
    reader: &mut Reader<&[u8]>,
    context: &str,
    mut on_child: F,
) -> Result<(), XmlError>
where
    F: FnMut(&mut Reader<&[u8]>, &str, Child) -> Result<(), XmlError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = tag_name(&e)?;
                on_child(reader, &name, Child::Open)?;
            }
            Event::Empty(e) => {
                let name = tag_name(&e)?;
                on_child(reader, &name, Child::Empty)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in {context}"
                )));
            }
            _ => {}
        }
    }
}

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => push_reference(&mut text, &e)?,
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Append the character an entity or character reference stands for.
fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<(), XmlError> {
    if let Some(ch) = reference.resolve_char_ref()? {
        text.push(ch);
        return Ok(());
    }
    let name = reference
        .decode()
        .map_err(|err| XmlError::ParseError(err.to_string()))?;
    let resolved = resolve_predefined_entity(&name)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity reference &{name};")))?;
    text.push_str(resolved);
    Ok(())
}

fn read_text(reader: &mut Reader<&[u8]>, child: Child) -> Result<String, XmlError> {
    match child {
        Child::Open => read_text_content(reader),
        Child::Empty => Ok(String::new()),
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>, child: Child) -> Result<(), XmlError> {
    if child == Child::Empty {
        return Ok(());
    }
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_protocol(text: &str) -> Result<Protocol, XmlError> {
    text.parse::<Protocol>()
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Deserialize a nested element, treating `<Tag/>` as the type's empty value.
fn nested<T: XmlDeserialize + Default>(
    reader: &mut Reader<&[u8]>,
    child: Child,
) -> Result<T, XmlError> {
    match child {
        Child::Open => T::deserialize_xml(reader),
        Child::Empty => Ok(T::default()),
    }
}

impl XmlDeserialize for Condition {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut condition = Condition::default();
        for_each_child(reader, "Condition", |reader, tag, child| {
            match tag {
                "HttpErrorCodeReturnedEquals" => {
                    condition.http_error_code_returned_equals = Some(read_text(reader, child)?);
                }
                "KeyPrefixEquals" => {
                    condition.key_prefix_equals = Some(read_text(reader, child)?);
                }
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;
        Ok(condition)
    }
}

impl XmlDeserialize for Redirect {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut redirect = Redirect::default();
        for_each_child(reader, "Redirect", |reader, tag, child| {
            match tag {
                "HostName" => redirect.host_name = Some(read_text(reader, child)?),
                "HttpRedirectCode" => {
                    redirect.http_redirect_code = Some(read_text(reader, child)?);
                }
                "Protocol" => {
                    redirect.protocol = Some(parse_protocol(&read_text(reader, child)?)?);
                }
                "ReplaceKeyPrefixWith" => {
                    redirect.replace_key_prefix_with = Some(read_text(reader, child)?);
                }
                "ReplaceKeyWith" => {
                    redirect.replace_key_with = Some(read_text(reader, child)?);
                }
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;
        Ok(redirect)
    }
}

impl XmlDeserialize for RoutingRule {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut condition = None;
        let mut redirect = None;
        for_each_child(reader, "RoutingRule", |reader, tag, child| {
            match tag {
                "Condition" => condition = Some(nested::<Condition>(reader, child)?),
                "Redirect" => redirect = Some(nested::<Redirect>(reader, child)?),
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;

        let redirect = redirect.ok_or_else(|| XmlError::MissingElement("Redirect".to_owned()))?;
        Ok(RoutingRule {
            condition,
            redirect,
        })
    }
}

impl XmlDeserialize for RedirectAllRequestsTo {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut host_name = None;
        let mut protocol = None;
        for_each_child(reader, "RedirectAllRequestsTo", |reader, tag, child| {
            match tag {
                "HostName" => host_name = Some(read_text(reader, child)?),
                "Protocol" => protocol = Some(parse_protocol(&read_text(reader, child)?)?),
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;

        let host_name = host_name.ok_or_else(|| XmlError::MissingElement("HostName".to_owned()))?;
        Ok(RedirectAllRequestsTo {
            host_name,
            protocol,
        })
    }
}

impl XmlDeserialize for IndexDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut suffix = None;
        for_each_child(reader, "IndexDocument", |reader, tag, child| {
            match tag {
                "Suffix" => suffix = Some(read_text(reader, child)?),
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;

        let suffix = suffix.ok_or_else(|| XmlError::MissingElement("Suffix".to_owned()))?;
        Ok(IndexDocument { suffix })
    }
}

impl XmlDeserialize for ErrorDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        for_each_child(reader, "ErrorDocument", |reader, tag, child| {
            match tag {
                "Key" => key = Some(read_text(reader, child)?),
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;

        let key = key.ok_or_else(|| XmlError::MissingElement("Key".to_owned()))?;
        Ok(ErrorDocument { key })
    }
}

impl XmlDeserialize for WebsiteConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = WebsiteConfiguration::default();
        for_each_child(reader, WEBSITE_ROOT, |reader, tag, child| {
            match (tag, child) {
                ("ErrorDocument", Child::Open) => {
                    config.error_document = Some(ErrorDocument::deserialize_xml(reader)?);
                }
                ("IndexDocument", Child::Open) => {
                    config.index_document = Some(IndexDocument::deserialize_xml(reader)?);
                }
                ("RedirectAllRequestsTo", Child::Open) => {
                    config.redirect_all_requests_to =
                        Some(RedirectAllRequestsTo::deserialize_xml(reader)?);
                }
                ("RoutingRules", Child::Open) => {
                    config.routing_rules = deserialize_list(reader, "RoutingRule")?;
                }
                ("ErrorDocument" | "IndexDocument" | "RedirectAllRequestsTo", Child::Empty) => {
                    return Err(XmlError::MissingElement(format!("content of {tag}")));
                }
                _ => skip_element(reader, child)?,
            }
            Ok(())
        })?;
        Ok(config)
    }
}

/// Deserialize a list of `item_tag` children, preserving document order.
fn deserialize_list<T: XmlDeserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();
    for_each_child(reader, "list", |reader, tag, child| {
        if tag == item_tag && child == Child::Open {
            items.push(T::deserialize_xml(reader)?);
        } else if tag == item_tag {
            return Err(XmlError::MissingElement(format!("content of {tag}")));
        } else {
            skip_element(reader, child)?;
        }
        Ok(())
    })?;
    Ok(items)
}
