//! XML serialization of website configuration documents.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use sitecfg_model::{
    Condition, ErrorDocument, IndexDocument, Redirect, RedirectAllRequestsTo, RoutingRule,
    WebsiteConfiguration,
};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Root element of the website configuration document.
pub const WEBSITE_ROOT: &str = "WebsiteConfiguration";

/// Trait for serializing document types to XML.
///
/// Implementors write their content as child elements inside the current XML
/// context. The root element name and namespace are handled by [`to_xml`].
///
/// Uses `io::Result` because `quick_xml::Writer` closures require `io::Result<()>`.
pub trait XmlSerialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete XML document with declaration and namespace.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: XmlSerialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Serialize a [`WebsiteConfiguration`] document.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn website_to_xml(config: &WebsiteConfiguration) -> Result<Vec<u8>, XmlError> {
    to_xml(WEBSITE_ROOT, config)
}

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<tag>text</tag>` only if the value is `Some`.
///
/// `Some("")` still produces an (empty) element: an empty replacement is a
/// different instruction than no replacement.
fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

impl XmlSerialize for Condition {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Condition").write_inner_content(|w| {
            write_optional_text(
                w,
                "HttpErrorCodeReturnedEquals",
                self.http_error_code_returned_equals.as_deref(),
            )?;
            write_optional_text(w, "KeyPrefixEquals", self.key_prefix_equals.as_deref())?;
            Ok(())
        })?;
        Ok(())
    }
}

impl XmlSerialize for Redirect {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Redirect").write_inner_content(|w| {
            write_optional_text(w, "HostName", self.host_name.as_deref())?;
            write_optional_text(w, "HttpRedirectCode", self.http_redirect_code.as_deref())?;
            write_optional_text(w, "Protocol", self.protocol.as_ref().map(|p| p.as_str()))?;
            write_optional_text(
                w,
                "ReplaceKeyPrefixWith",
                self.replace_key_prefix_with.as_deref(),
            )?;
            write_optional_text(w, "ReplaceKeyWith", self.replace_key_with.as_deref())?;
            Ok(())
        })?;
        Ok(())
    }
}

impl XmlSerialize for RoutingRule {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("RoutingRule")
            .write_inner_content(|w| {
                if let Some(ref cond) = self.condition {
                    cond.serialize_xml(w)?;
                }
                self.redirect.serialize_xml(w)?;
                Ok(())
            })?;
        Ok(())
    }
}

impl XmlSerialize for RedirectAllRequestsTo {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("RedirectAllRequestsTo")
            .write_inner_content(|w| {
                write_text_element(w, "HostName", &self.host_name)?;
                write_optional_text(w, "Protocol", self.protocol.as_ref().map(|p| p.as_str()))?;
                Ok(())
            })?;
        Ok(())
    }
}

impl XmlSerialize for IndexDocument {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("IndexDocument")
            .write_inner_content(|w| {
                write_text_element(w, "Suffix", &self.suffix)?;
                Ok(())
            })?;
        Ok(())
    }
}

impl XmlSerialize for ErrorDocument {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("ErrorDocument")
            .write_inner_content(|w| {
                write_text_element(w, "Key", &self.key)?;
                Ok(())
            })?;
        Ok(())
    }
}

impl XmlSerialize for WebsiteConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if let Some(ref rart) = self.redirect_all_requests_to {
            rart.serialize_xml(writer)?;
        }
        if let Some(ref idx) = self.index_document {
            idx.serialize_xml(writer)?;
        }
        if let Some(ref err) = self.error_document {
            err.serialize_xml(writer)?;
        }
        if !self.routing_rules.is_empty() {
            writer
                .create_element("RoutingRules")
                .write_inner_content(|w| {
                    for rule in &self.routing_rules {
                        rule.serialize_xml(w)?;
                    }
                    Ok(())
                })?;
        }
        Ok(())
    }
}
