//! RestXml serialization/deserialization for website configuration documents.
//!
//! The remote service stores and returns the website configuration as an XML
//! document. This crate converts between that wire format and the
//! [`sitecfg_model::WebsiteConfiguration`] type.
//!
//! # Conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Root element: `WebsiteConfiguration`
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{XmlDeserialize, from_xml, website_from_xml};
pub use error::XmlError;
pub use serialize::{S3_NAMESPACE, WEBSITE_ROOT, XmlSerialize, to_xml, website_to_xml};
