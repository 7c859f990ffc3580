/// SOAP envelope codec
///
/// Parsing and rendering of SOAP 1.1 envelopes with quick-xml. Incoming
/// envelopes are read into a small namespace-agnostic element tree
/// ([`XmlNode`], prefixes stripped) from which the operation dispatch pulls
/// structured arguments; outgoing responses and faults are written back
/// through the same tree shape.
///
/// # Example
///
/// ```
/// use userdir_api::soap::envelope::parse_operation;
///
/// let body = r#"<?xml version="1.0"?>
/// <soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
///                   xmlns:usr="http://www.example.com/soap/user">
///   <soapenv:Body>
///     <usr:GetUserByIdRequest>
///       <usr:id>64b1f0a2e13d2a0001aa0001</usr:id>
///     </usr:GetUserByIdRequest>
///   </soapenv:Body>
/// </soapenv:Envelope>"#;
///
/// let operation = parse_operation(body).unwrap();
/// assert_eq!(operation.name, "GetUserByIdRequest");
/// assert_eq!(operation.child_text("id"), Some("64b1f0a2e13d2a0001aa0001"));
/// ```

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// SOAP 1.1 envelope namespace
const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of the user service contract
pub const SERVICE_NS: &str = "http://www.example.com/soap/user";

/// Envelope processing errors
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document root is not a SOAP Envelope
    #[error("document root is not a SOAP Envelope")]
    NotAnEnvelope,

    /// The envelope has no Body element
    #[error("SOAP Body is missing")]
    MissingBody,

    /// The Body carries no operation element
    #[error("SOAP Body is empty")]
    EmptyBody,

    /// UTF-8 error while rendering
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// SOAP fault categories
///
/// `Client` marks failures caused by the request (validation, not-found,
/// conflicts, unparseable envelopes); `Server` marks failures behind the
/// service (the record store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    Client,
    Server,
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCode::Client => write!(f, "Client"),
            FaultCode::Server => write!(f, "Server"),
        }
    }
}

/// One XML element: local name, text content, child elements
///
/// Namespace prefixes are stripped on parse, so lookups work regardless of
/// the prefix a client chose for the service namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Creates an empty element
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Creates a text-only element
    pub fn text(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
            children: Vec::new(),
        }
    }

    /// Appends a child element
    pub fn push(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// Finds the first child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns the text of the named child, if the child exists
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }
}

fn local_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).to_string()
}

/// Parses an XML document into an element tree
fn parse_tree(input: &str) -> Result<XmlNode, EnvelopeError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(XmlNode::new(&local_name(start.name())));
            }
            Event::Empty(start) => {
                let node = XmlNode::new(&local_name(start.name()));
                attach(&mut stack, &mut root, node);
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(text.unescape()?.trim());
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .text
                        .push_str(String::from_utf8_lossy(data.as_ref()).trim());
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(EnvelopeError::EmptyBody)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            // First completed top-level element wins
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

/// Extracts the operation element from a SOAP envelope
///
/// The first element inside `soap:Body` names the operation (e.g.
/// `GetAllUsersRequest`) and carries its arguments as children.
///
/// # Errors
///
/// Malformed XML, a non-Envelope root, a missing Body or an empty Body.
pub fn parse_operation(input: &str) -> Result<XmlNode, EnvelopeError> {
    let root = parse_tree(input)?;

    if root.name != "Envelope" {
        return Err(EnvelopeError::NotAnEnvelope);
    }

    let body = root.child("Body").ok_or(EnvelopeError::MissingBody)?;
    body.children.first().cloned().ok_or(EnvelopeError::EmptyBody)
}

fn render_envelope(
    body: impl FnOnce(&mut Writer<Cursor<Vec<u8>>>) -> Result<(), quick_xml::Error>,
) -> Result<String, EnvelopeError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut envelope = BytesStart::new("soap:Envelope");
    envelope.push_attribute(("xmlns:soap", SOAP_ENV_NS));
    writer.write_event(Event::Start(envelope))?;
    writer.write_event(Event::Start(BytesStart::new("soap:Body")))?;

    body(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("soap:Body")))?;
    writer.write_event(Event::End(BytesEnd::new("soap:Envelope")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

fn write_node(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    node: &XmlNode,
) -> Result<(), quick_xml::Error> {
    if node.children.is_empty() && node.text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(node.name.as_str())))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(node.name.as_str())))?;

    if !node.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&node.text)))?;
    }

    for child in &node.children {
        write_node(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

/// Renders a success envelope: `<{operation}Response>` in the service
/// namespace wrapping the given `result` element
pub fn render_response(operation: &str, result: &XmlNode) -> Result<String, EnvelopeError> {
    let response_name = format!("{}Response", operation);

    render_envelope(|writer| {
        let mut response = BytesStart::new(response_name.as_str());
        response.push_attribute(("xmlns", SERVICE_NS));
        writer.write_event(Event::Start(response))?;

        write_node(writer, result)?;

        writer.write_event(Event::End(BytesEnd::new(response_name.as_str())))?;
        Ok(())
    })
}

/// Renders a fault envelope with the given code and message
pub fn render_fault(code: FaultCode, message: &str) -> Result<String, EnvelopeError> {
    render_envelope(|writer| {
        writer.write_event(Event::Start(BytesStart::new("soap:Fault")))?;

        write_node(writer, &XmlNode::text("faultcode", &code.to_string()))?;
        write_node(writer, &XmlNode::text("faultstring", message))?;

        writer.write_event(Event::End(BytesEnd::new("soap:Fault")))?;
        Ok(())
    })
}
