//! XML utilities for WebDAV/CalDAV operations.
//!
//! Request bodies are generated with the `quick-xml` writer. Responses are
//! read with the `quick-xml` pull parser and matched on *local* element
//! names, so `<D:href>`, `<href xmlns="DAV:">` and `<d:href>` are all the
//! same element regardless of which prefix a server picks.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::warn;

use crate::error::{CalDavError, CalDavResult};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";
/// CalDAV namespace
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// One `<response>` of a Depth-1 collection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCollection {
    /// The `href` of the response, as sent by the server.
    pub href: String,
    /// The `displayname` property, if present.
    pub display_name: Option<String>,
}

/// Body for the `current-user-principal` lookup.
pub fn current_user_principal_body() -> CalDavResult<String> {
    build_xml(|w| {
        let mut propfind = BytesStart::new("propfind");
        propfind.push_attribute(("xmlns", DAV_NS));
        w.write_event(Event::Start(propfind))?;
        w.write_event(Event::Start(BytesStart::new("prop")))?;
        w.write_event(Event::Empty(BytesStart::new("current-user-principal")))?;
        w.write_event(Event::End(BytesEnd::new("prop")))?;
        w.write_event(Event::End(BytesEnd::new("propfind")))
    })
}

/// Body for the `calendar-home-set` lookup.
pub fn calendar_home_set_body() -> CalDavResult<String> {
    build_xml(|w| {
        let mut propfind = BytesStart::new("propfind");
        propfind.push_attribute(("xmlns", DAV_NS));
        propfind.push_attribute(("xmlns:C", CALDAV_NS));
        w.write_event(Event::Start(propfind))?;
        w.write_event(Event::Start(BytesStart::new("prop")))?;
        w.write_event(Event::Empty(BytesStart::new("C:calendar-home-set")))?;
        w.write_event(Event::End(BytesEnd::new("prop")))?;
        w.write_event(Event::End(BytesEnd::new("propfind")))
    })
}

/// Body for listing the collections under calendar-home.
pub fn list_collections_body() -> CalDavResult<String> {
    build_xml(|w| {
        let mut propfind = BytesStart::new("propfind");
        propfind.push_attribute(("xmlns", DAV_NS));
        propfind.push_attribute(("xmlns:C", CALDAV_NS));
        w.write_event(Event::Start(propfind))?;
        w.write_event(Event::Start(BytesStart::new("prop")))?;
        w.write_event(Event::Empty(BytesStart::new("displayname")))?;
        w.write_event(Event::Empty(BytesStart::new("resourcetype")))?;
        w.write_event(Event::End(BytesEnd::new("prop")))?;
        w.write_event(Event::End(BytesEnd::new("propfind")))
    })
}

/// Body for the busy-interval `calendar-query` REPORT.
///
/// `start` and `end` must already be in compact CalDAV form
/// (`YYYYMMDDTHHMMSSZ`). The same bounds are used for server-side
/// recurrence expansion and for the VEVENT time-range filter.
pub fn calendar_query_body(start: &str, end: &str) -> CalDavResult<String> {
    build_xml(|w| {
        let mut query = BytesStart::new("c:calendar-query");
        query.push_attribute(("xmlns:d", DAV_NS));
        query.push_attribute(("xmlns:c", CALDAV_NS));
        w.write_event(Event::Start(query))?;

        w.write_event(Event::Start(BytesStart::new("d:prop")))?;
        w.write_event(Event::Start(BytesStart::new("c:calendar-data")))?;
        let mut expand = BytesStart::new("c:expand");
        expand.push_attribute(("start", start));
        expand.push_attribute(("end", end));
        w.write_event(Event::Empty(expand))?;
        w.write_event(Event::End(BytesEnd::new("c:calendar-data")))?;
        w.write_event(Event::End(BytesEnd::new("d:prop")))?;

        w.write_event(Event::Start(BytesStart::new("c:filter")))?;
        let mut vcalendar = BytesStart::new("c:comp-filter");
        vcalendar.push_attribute(("name", "VCALENDAR"));
        w.write_event(Event::Start(vcalendar))?;
        let mut vevent = BytesStart::new("c:comp-filter");
        vevent.push_attribute(("name", "VEVENT"));
        w.write_event(Event::Start(vevent))?;
        let mut time_range = BytesStart::new("c:time-range");
        time_range.push_attribute(("start", start));
        time_range.push_attribute(("end", end));
        w.write_event(Event::Empty(time_range))?;
        w.write_event(Event::End(BytesEnd::new("c:comp-filter")))?;
        w.write_event(Event::End(BytesEnd::new("c:comp-filter")))?;
        w.write_event(Event::End(BytesEnd::new("c:filter")))?;

        w.write_event(Event::End(BytesEnd::new("c:calendar-query")))
    })
}

/// Finds the first `href` nested inside the property named `property`
/// (e.g. `current-user-principal` or `calendar-home-set`).
///
/// Returns `None` when the property is absent, empty (servers answer
/// unsupported properties with an empty element in a 404 propstat), or the
/// body is not XML.
pub fn extract_property_href(xml: &str, property: &str) -> Option<String> {
    let mut found = None;
    walk(xml, |node| {
        if let Node::Text(path, text) = node {
            if found.is_none()
                && path.last().is_some_and(|n| n == "href")
                && path.iter().any(|n| n == property)
                && !text.trim().is_empty()
            {
                found = Some(text.trim().to_string());
            }
        }
    });
    found
}

/// Extracts every `(href, displayname)` pair of a multistatus listing.
///
/// Only the `href` that is a direct child of `response` counts; hrefs
/// nested in property values are ignored.
pub fn parse_collection_listing(xml: &str) -> Vec<ListedCollection> {
    let mut collections = Vec::new();
    let mut current: Option<ListedCollection> = None;

    walk(xml, |node| match node {
        Node::Open("response") => {
            current = Some(ListedCollection {
                href: String::new(),
                display_name: None,
            });
        }
        Node::Close("response") => {
            if let Some(entry) = current.take() {
                if !entry.href.is_empty() {
                    collections.push(entry);
                }
            }
        }
        Node::Text(path, text) => {
            let Some(entry) = current.as_mut() else {
                return;
            };
            match path {
                [.., parent, last] if parent == "response" && last == "href" => {
                    entry.href.push_str(text.trim());
                }
                [.., last] if last == "displayname" => {
                    entry
                        .display_name
                        .get_or_insert_with(String::new)
                        .push_str(text);
                }
                _ => {}
            }
        }
        _ => {}
    });

    collections
}

/// Extracts every `calendar-data` payload, with or without CDATA wrapping.
pub fn extract_calendar_data(xml: &str) -> Vec<String> {
    let mut payloads = Vec::new();
    let mut current: Option<String> = None;

    walk(xml, |node| match node {
        Node::Open("calendar-data") => current = Some(String::new()),
        Node::Close("calendar-data") => {
            if let Some(buf) = current.take() {
                let payload = buf.trim();
                if !payload.is_empty() {
                    payloads.push(payload.to_string());
                }
            }
        }
        Node::Text(path, text) if path.last().is_some_and(|n| n == "calendar-data") => {
            if let Some(buf) = current.as_mut() {
                buf.push_str(text);
            }
        }
        _ => {}
    });

    payloads
}

fn build_xml<F>(body: F) -> CalDavResult<String>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> io::Result<()>,
{
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .and_then(|()| body(&mut writer))
        .map_err(|e| CalDavError::encoding(format!("failed to build XML body: {}", e)))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| CalDavError::encoding(format!("XML body is not UTF-8: {}", e)))
}

/// A parse step reported by [`walk`]. Names are local names.
enum Node<'a> {
    Open(&'a str),
    Close(&'a str),
    /// Text or CDATA content, with the path of enclosing elements.
    Text(&'a [String], &'a str),
}

/// Pull-parses `xml` and reports every element boundary and text node.
///
/// Parsing stops at the first syntax error; whatever was seen before it is
/// still reported.
fn walk<F>(xml: &str, mut visit: F)
where
    F: FnMut(Node<'_>),
{
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                visit(Node::Open(&local));
                path.push(local);
            }
            Ok(Event::Empty(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                visit(Node::Open(&local));
                visit(Node::Close(&local));
            }
            Ok(Event::End(_)) => {
                if let Some(local) = path.pop() {
                    visit(Node::Close(&local));
                }
            }
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => visit(Node::Text(&path, &text)),
                Err(err) => warn!(error = %err, "Skipping undecodable XML text"),
            },
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e);
                visit(Node::Text(&path, &text));
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(
                    error = %err,
                    position = reader.buffer_position(),
                    "Malformed XML response, keeping partial results"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }
}
