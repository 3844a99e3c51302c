use std::io;

use jobfeed_core::JobListing;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

pub const CHANNEL_TITLE: &str = "EBRD Job Vacancies";
pub const CHANNEL_LINK: &str = "https://jobs.ebrd.com/search/";
pub const CHANNEL_DESCRIPTION: &str = "Current job opportunities at EBRD";
pub const CHANNEL_LANGUAGE: &str = "en";

/// Channel metadata for the generated feed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            title: CHANNEL_TITLE.to_string(),
            link: CHANNEL_LINK.to_string(),
            description: CHANNEL_DESCRIPTION.to_string(),
            language: CHANNEL_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to write feed xml: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize feed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("serialized feed is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes the deduplicated listings as a pretty-printed RSS 2.0
/// document. `build_date` is a preformatted RFC 822 timestamp supplied by
/// the caller, so the builder itself never reads a clock: the same input
/// always produces the same document.
///
/// Each listing becomes one `<item>`; its description carries the location
/// and posting date on two lines. The writer escapes text content, so
/// titles containing `&` or `<` stay well-formed.
pub fn build_feed_xml(
    listings: &[JobListing],
    options: &FeedOptions,
    build_date: &str,
) -> Result<String, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &options.title)?;
    write_text_element(&mut writer, "link", &options.link)?;
    write_text_element(&mut writer, "description", &options.description)?;
    write_text_element(&mut writer, "language", &options.language)?;
    write_text_element(&mut writer, "lastBuildDate", build_date)?;

    for listing in listings {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", &listing.title)?;
        write_text_element(&mut writer, "link", &listing.link)?;
        let description = format!(
            "Location: {}\nPosting Date: {}",
            listing.location, listing.posting_date
        );
        write_text_element(&mut writer, "description", &description)?;
        write_text_element(&mut writer, "pubDate", build_date)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&listing.link)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

fn write_text_element<W: io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), FeedError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
