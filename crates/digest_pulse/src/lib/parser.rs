//! # Parsers
//!
//! Small text formats coming back from the video platform: ISO-8601
//! durations from the Data API and WebVTT subtitle files written by `yt-dlp`.

use std::{sync::LazyLock, time::Duration};

use itertools::Itertools;
use regex::Regex;

use crate::error::ParseError;

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$").unwrap()
});

static VTT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Parses durations such as `PT1H2M3S` or `P1DT30M` as returned by the
/// YouTube Data API `contentDetails.duration` field.
pub fn parse_iso8601_duration(value: &str) -> Result<Duration, ParseError> {
    let invalid = || ParseError::Duration(value.to_string());

    let captures = ISO_DURATION_RE.captures(value.trim()).ok_or_else(invalid)?;
    if captures.iter().skip(1).all(|group| group.is_none()) {
        return Err(invalid());
    }

    let whole = |idx: usize| -> Result<u64, ParseError> {
        captures
            .get(idx)
            .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
            .unwrap_or(Ok(0))
    };

    let days = whole(1)?;
    let hours = whole(2)?;
    let minutes = whole(3)?;
    let seconds = captures
        .get(4)
        .map(|m| m.as_str().parse::<f64>().map_err(|_| invalid()))
        .unwrap_or(Ok(0.0))?;

    let whole_secs = days
        .checked_mul(86_400)
        .zip(hours.checked_mul(3_600))
        .zip(minutes.checked_mul(60))
        .and_then(|((d, h), m)| d.checked_add(h)?.checked_add(m))
        .ok_or_else(invalid)?;
    let fraction = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;

    Duration::from_secs(whole_secs)
        .checked_add(fraction)
        .ok_or_else(invalid)
}

/// Flattens a WebVTT document into plain transcript text.
///
/// Drops the header block, `NOTE` blocks, cue identifiers, timing lines and
/// inline tags. Auto-generated subtitles repeat the previous cue's line as a
/// rolling caption; consecutive duplicate lines are collapsed.
pub fn parse_vtt(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = vtt.trim_start().starts_with("WEBVTT");
    let mut in_note = false;

    for raw in vtt.lines() {
        let line = raw.trim();

        if in_header || in_note {
            if line.is_empty() {
                in_header = false;
                in_note = false;
            }
            continue;
        }

        if line.starts_with("NOTE") {
            in_note = true;
            continue;
        }

        if line.is_empty() || line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let text = VTT_TAG_RE.replace_all(line, "");
        let text = decode_entities(&text).split_whitespace().join(" ");

        if text.is_empty() || lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
