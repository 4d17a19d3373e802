//! # Report
//!
//! Rendering of a finished run into the text and HTML digests, and the
//! [`Notifier`] seam through which they are delivered.

pub mod notifier;

use std::{fmt::Display, future::Future};

use digest_datastore::Channel;
use itertools::Itertools;

use crate::outcome::{ItemOutcome, Outcome, RunResult, WorkItem};

pub const DEFAULT_REPORT_TITLE: &str = "Crypto YouTube Summary Report";

pub trait Notifier {
    type Error: Display + Send;

    fn deliver(&self, result: &RunResult) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

pub fn subject(result: &RunResult, title: &str) -> String {
    format!("{} - {}", title, result.started_at.format("%Y-%m-%d"))
}

fn totals_line(result: &RunResult) -> String {
    format!(
        "Status: {} ({} summarized, {} skipped, {} failed)",
        result.status,
        result.summarized_count(),
        result.skipped_count(),
        result.failed_count()
    )
}

fn item_label(outcome: &ItemOutcome) -> String {
    match &outcome.item {
        WorkItem::Video(task) => format!("{} ({})", task.title, task.duration_label()),
        WorkItem::Channel(channel) => format!("channel listing for {}", channel.title),
    }
}

fn channel_url(result: &RunResult, channel_index: usize) -> Option<String> {
    result.channels.get(channel_index).map(Channel::url)
}

fn text_item(outcome: &ItemOutcome) -> String {
    match &outcome.outcome {
        Outcome::Summarized { summary } => {
            let mut header = vec![format!("* {}", item_label(outcome))];
            if let Some(task) = outcome.video() {
                header.push(format!("  {}", task.url()));
                if let Some(published) = task.published_at {
                    header.push(format!("  Published: {}", published.format("%Y-%m-%d")));
                }
            }
            format!("{}\n\n{}", header.join("\n"), summary.trim())
        }
        Outcome::Skipped { reason } => format!("- Skipped {}: {}", item_label(outcome), reason),
        Outcome::Failed { stage, detail } => {
            format!("- Failed {} at {}: {}", item_label(outcome), stage, detail)
        }
    }
}

/// Plain-text digest, grouped by channel in processing order
pub fn render_text(result: &RunResult, title: &str) -> String {
    let mut out = format!(
        "{}\n{}\nRun: {} - {}\n",
        subject(result, title),
        totals_line(result),
        result.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        result.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if let Some(failure) = &result.discovery_failure {
        out.push_str(&format!("\nChannel discovery failed: {failure}\n"));
    }
    if result.outcomes.is_empty() {
        out.push_str("\nNo videos were processed.\n");
        return out;
    }

    for (channel_index, group) in &result.outcomes.iter().chunk_by(|o| o.channel_index) {
        let group = group.collect::<Vec<_>>();
        out.push_str(&format!("\n== {} ==\n", group[0].channel_title()));
        if let Some(url) = channel_url(result, channel_index) {
            out.push_str(&format!("{url}\n"));
        }

        let items = group.into_iter().map(text_item).join("\n\n");
        out.push_str(&format!("\n{items}\n"));
    }

    out
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_item(outcome: &ItemOutcome) -> String {
    let label = escape_html(&item_label(outcome));

    match &outcome.outcome {
        Outcome::Summarized { summary } => {
            let heading = match outcome.video() {
                Some(task) => format!(
                    r#"<h3><a href="{}">{label}</a></h3>"#,
                    escape_html(&task.url())
                ),
                None => format!("<h3>{label}</h3>"),
            };
            let paragraphs = summary
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| format!("<p>{}</p>", escape_html(p)))
                .join("\n");

            format!("<div class=\"video\">\n{heading}\n{paragraphs}\n</div>")
        }
        Outcome::Skipped { reason } => format!(
            r#"<p class="meta">Skipped {label}: {}</p>"#,
            escape_html(&reason.to_string())
        ),
        Outcome::Failed { stage, detail } => format!(
            r#"<p class="issue">Failed {label} at {stage}: {}</p>"#,
            escape_html(detail)
        ),
    }
}

/// Standalone HTML digest. All collaborator-provided text is escaped.
pub fn render_html(result: &RunResult, title: &str) -> String {
    let subject = escape_html(&subject(result, title));

    let mut out = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{subject}</title>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 900px; margin: 0 auto; padding: 20px; color: #333; }}
h1 {{ color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }}
h2 {{ color: #2980b9; margin-top: 30px; }}
.video {{ background: #f9f9f9; border-left: 4px solid #3498db; padding: 12px 16px; margin: 16px 0; }}
.meta {{ color: #7f8c8d; font-size: 0.9em; }}
.issue {{ color: #c0392b; }}
</style>
</head>
<body>
<h1>{subject}</h1>
<p class="meta">{totals}</p>
"#,
        totals = escape_html(&totals_line(result)),
    );

    if let Some(failure) = &result.discovery_failure {
        out.push_str(&format!(
            "<p class=\"issue\">Channel discovery failed: {}</p>\n",
            escape_html(failure)
        ));
    }
    if result.outcomes.is_empty() {
        out.push_str("<p>No videos were processed.</p>\n");
    }

    for (channel_index, group) in &result.outcomes.iter().chunk_by(|o| o.channel_index) {
        let group = group.collect::<Vec<_>>();
        let channel_title = escape_html(group[0].channel_title());
        let heading = match channel_url(result, channel_index) {
            Some(url) => format!(r#"<a href="{}">{channel_title}</a>"#, escape_html(&url)),
            None => channel_title,
        };

        out.push_str(&format!("<h2>{heading}</h2>\n"));
        out.push_str(&group.into_iter().map(html_item).join("\n"));
        out.push('\n');
    }

    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use digest_datastore::VideoTask;

    use super::*;
    use crate::outcome::{Delivery, RunStatus, SkipReason, Stage};

    fn task(channel: &str, video_id: &str, title: &str) -> VideoTask {
        VideoTask {
            channel_id: format!("id-{channel}"),
            channel_title: channel.into(),
            video_id: video_id.into(),
            title: title.into(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()),
            duration_secs: 754,
        }
    }

    fn channel(id: &str, title: &str) -> Channel {
        Channel {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            relevance: 0.8,
        }
    }

    fn result() -> RunResult {
        let outcomes = vec![
            ItemOutcome {
                channel_index: 0,
                video_index: Some(0),
                item: WorkItem::Video(task("Chain Daily", "v1", "BTC <breaks> out")),
                outcome: Outcome::Summarized {
                    summary: "Bitcoin & friends rallied.".into(),
                },
            },
            ItemOutcome {
                channel_index: 0,
                video_index: Some(1),
                item: WorkItem::Video(task("Chain Daily", "v2", "Quiet day")),
                outcome: Outcome::Skipped {
                    reason: SkipReason::NoTranscript,
                },
            },
            ItemOutcome {
                channel_index: 1,
                video_index: None,
                item: WorkItem::Channel(channel("UC2", "DeFi Weekly")),
                outcome: Outcome::Failed {
                    stage: Stage::Discovery,
                    detail: "quotaExceeded".into(),
                },
            },
        ];

        RunResult {
            started_at: Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2026, 10, 16, 6, 5, 0).unwrap(),
            channels: vec![channel("UC1", "Chain Daily"), channel("UC2", "DeFi Weekly")],
            status: RunStatus::from_outcomes(&outcomes),
            outcomes,
            discovery_failure: None,
            delivery: Delivery::Skipped,
        }
    }

    #[test]
    fn test_subject_uses_run_date() {
        assert_eq!(subject(&result(), "Digest"), "Digest - 2026-10-16");
    }

    #[test]
    fn test_text_report_groups_by_channel() {
        let text = render_text(&result(), "Digest");

        assert!(text.starts_with("Digest - 2026-10-16\n"));
        assert!(text.contains("Status: partial success (1 summarized, 1 skipped, 1 failed)"));
        assert!(text.contains("== Chain Daily ==\nhttps://www.youtube.com/channel/UC1\n"));
        assert!(text.contains("* BTC <breaks> out (12:34)\n  https://www.youtube.com/watch?v=v1"));
        assert!(text.contains("Bitcoin & friends rallied."));
        assert!(text.contains("- Skipped Quiet day (12:34): no transcript available"));
        assert!(text.contains("== DeFi Weekly =="));
        assert!(text.contains("- Failed channel listing for DeFi Weekly at discovery: quotaExceeded"));

        let chain = text.find("== Chain Daily ==").unwrap();
        let defi = text.find("== DeFi Weekly ==").unwrap();
        assert!(chain < defi);
    }

    #[test]
    fn test_html_report_escapes_content() {
        let html = render_html(&result(), "Digest");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Digest - 2026-10-16</title>"));
        assert!(html.contains("BTC &lt;breaks&gt; out (12:34)"));
        assert!(html.contains("<p>Bitcoin &amp; friends rallied.</p>"));
        assert!(!html.contains("<breaks>"));
        assert!(html.contains(
            r#"<h2><a href="https://www.youtube.com/channel/UC2">DeFi Weekly</a></h2>"#
        ));
        assert!(html.contains(r#"<p class="meta">Skipped Quiet day (12:34): no transcript available</p>"#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_empty_run_report() {
        let mut result = result();
        result.outcomes.clear();
        result.status = RunStatus::Failure;
        result.discovery_failure = Some("All 2 discovery queries failed".into());

        let text = render_text(&result, "Digest");
        assert!(text.contains("Channel discovery failed: All 2 discovery queries failed"));
        assert!(text.contains("No videos were processed."));
    }
}
