//! Channel page parsing.
//!
//! Pattern-based extraction of message text and timestamps from the public
//! web preview of a channel. The page is not treated as a DOM; the patterns
//! match the preview markup closely enough to pull out message blocks.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use super::filter::is_candidate_post;
use crate::types::message::RawMessage;

/// Maximum accepted messages taken from one page.
pub const MAX_MESSAGES_PER_PAGE: usize = 20;

/// Format of the `title` attribute on the message date link.
const TITLE_DATE_FORMAT: &str = "%b %d, %Y at %H:%M:%S";

lazy_static! {
    static ref MESSAGE_BLOCK: Regex = Regex::new(
        r#"(?is)<div class="tgme_widget_message[^"]*"[^>]*data-post="[^"]+"[^>]*>(.*?)</div>\s*</div>"#
    ).unwrap();

    // The block pattern consumes the closing tag of the last inner element,
    // so the inner patterns also accept end of input.
    static ref MESSAGE_TEXT: Regex = Regex::new(
        r#"(?is)<div class="tgme_widget_message_text[^"]*"[^>]*>(.*?)(?:</div>|\z)"#
    ).unwrap();

    static ref MEDIA_CAPTION: Regex = Regex::new(
        r#"(?is)<div class="tgme_widget_message_media_caption[^"]*"[^>]*>(.*?)(?:</div>|\z)"#
    ).unwrap();

    static ref TIME_DATETIME: Regex = Regex::new(
        r#"(?i)<time[^>]+datetime="([^"]+)""#
    ).unwrap();

    static ref DATE_TITLE: Regex = Regex::new(
        r#"(?i)<span class="tgme_widget_message_date"[^>]*title="([^"]+)""#
    ).unwrap();

    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// True when the page carries the "channel doesn't exist" markers.
pub fn is_channel_unavailable(html: &str) -> bool {
    html.contains("tgme_page_description") && html.contains("channel doesn't exist")
}

/// Extract candidate messages from a channel page.
///
/// Blocks without text, and blocks rejected by the pre-filter, are skipped.
/// Messages without a parseable timestamp get `now - k minutes`, where `k`
/// is the number already accepted from this page, so they keep page order.
pub fn parse_channel_page(html: &str, channel: &str, now: DateTime<Utc>) -> Vec<RawMessage> {
    parse_channel_page_capped(html, channel, now, MAX_MESSAGES_PER_PAGE)
}

/// [`parse_channel_page`] with an explicit cap.
pub fn parse_channel_page_capped(
    html: &str,
    channel: &str,
    now: DateTime<Utc>,
    cap: usize,
) -> Vec<RawMessage> {
    let mut messages: Vec<RawMessage> = Vec::new();
    if cap == 0 {
        return messages;
    }

    for block in MESSAGE_BLOCK.captures_iter(html) {
        let Some(body) = block.get(1).map(|m| m.as_str()) else {
            continue;
        };

        let Some(content) = extract_content(body) else {
            continue;
        };
        if !is_candidate_post(&content) {
            continue;
        }

        let posted_at = extract_timestamp(body)
            .unwrap_or_else(|| now - Duration::minutes(messages.len() as i64));

        messages.push(RawMessage::new(content, posted_at, channel));
        if messages.len() >= cap {
            break;
        }
    }

    messages
}

/// Cleaned text of the first text or caption element with non-empty content.
fn extract_content(block: &str) -> Option<String> {
    [&*MESSAGE_TEXT, &*MEDIA_CAPTION]
        .iter()
        .filter_map(|pattern| pattern.captures(block))
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_html(m.as_str()))
        .find(|text| !text.is_empty())
}

/// Message timestamp from the `datetime` attribute, else the date title.
fn extract_timestamp(block: &str) -> Option<DateTime<Utc>> {
    let from_datetime = TIME_DATETIME
        .captures(block)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_datetime_attr(m.as_str()));
    if from_datetime.is_some() {
        return from_datetime;
    }

    DATE_TITLE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_title_date(m.as_str()))
}

/// Parse an ISO-8601 `datetime` attribute such as `2024-08-25T04:15:51+00:00`.
fn parse_datetime_attr(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    // Offset-less values are read as UTC
    let head: String = value.trim().chars().take(19).collect();
    NaiveDateTime::parse_from_str(&head, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a title such as `Aug 25, 2024 at 09:45:51`.
///
/// Only this one English format is understood.
pub fn parse_title_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), TITLE_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Strip tags, decode the common entities and collapse whitespace.
pub fn clean_html(fragment: &str) -> String {
    let text = LINE_BREAK.replace_all(fragment, " ");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
