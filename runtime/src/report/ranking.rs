//! The ranking table.

use crate::site::SiteRecord;
use std::io::Write;

pub const RANKING_HEADER: [&str; 8] = [
    "rank",
    "site",
    "privacy_score",
    "third_party_domains",
    "tracking_domains",
    "cookies",
    "pre_consent_cookies",
    "has_banner",
];

/// One CSV row per record, in the order given. Ranks start at 1.
pub fn write_ranking<'a, W, I>(out: W, records: I) -> csv::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a SiteRecord>,
{
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(RANKING_HEADER)?;
    for (i, record) in records.into_iter().enumerate() {
        let m = &record.metrics;
        writer.write_record([
            (i + 1).to_string(),
            record.site_url.clone(),
            format!("{:.2}", record.score.composite),
            m.third_party_count.to_string(),
            m.tracking_count.to_string(),
            m.cookie_count.to_string(),
            m.pre_consent_cookie_count.to_string(),
            m.has_banner.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
