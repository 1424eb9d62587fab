//! Image-URL rewriting for applicant summaries
//!
//! Summaries are rich text authored inside the base; embedded screenshots
//! come out as workspace asset URLs that require a session to view. Before
//! rendering, each asset URL is swapped for a direct download link resolved
//! through the API.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::api::{Result, StoreClient};
use offerbook_core::models::fields;
use offerbook_core::RawRows;

/// Matches a workspace asset URL; capture 1 is the asset path the download
/// link endpoint expects.
const IMAGE_URL_PATTERN: &str =
    r"https://.+?/workspace/[0-9]+?/asset/.+?(/images/auto-upload/.+?\.png)";

fn image_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(IMAGE_URL_PATTERN).expect("static pattern compiles"))
}

/// Extract the asset paths of all workspace image URLs in `summary`, with
/// the byte range each full URL occupies.
fn asset_urls(summary: &str) -> Vec<(std::ops::Range<usize>, String)> {
    image_url_pattern()
        .captures_iter(summary)
        .filter_map(|caps| {
            let full = caps.get(0)?;
            let path = caps.get(1)?;
            Some((full.range(), path.as_str().to_string()))
        })
        .collect()
}

/// Rewrite workspace asset URLs in every applicant summary to direct
/// links. Returns the number of URLs rewritten.
pub async fn rewrite_image_urls(client: &StoreClient, applicants: &mut RawRows) -> Result<usize> {
    let mut rewritten = 0usize;

    for row in applicants.values_mut() {
        let Some(summary) = row
            .get(fields::SUMMARY)
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };

        let urls = asset_urls(&summary);
        if urls.is_empty() {
            continue;
        }

        let mut updated = String::with_capacity(summary.len());
        let mut last = 0usize;
        for (range, path) in urls {
            let direct = client.image_direct_url(&path).await?;
            updated.push_str(&summary[last..range.start]);
            updated.push_str(&direct);
            last = range.end;
            rewritten += 1;
        }
        updated.push_str(&summary[last..]);

        if let Some(object) = row.as_object_mut() {
            object.insert(fields::SUMMARY.to_string(), Value::String(updated));
        }
    }

    debug!("rewrote {} image urls", rewritten);
    Ok(rewritten)
}
