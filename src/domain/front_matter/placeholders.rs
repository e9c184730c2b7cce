//! Template placeholders substituted into headers before parsing.

use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::abbrlink::{AbbrlinkSettings, unix_timestamp_string};

const DATE_PLACEHOLDER: &str = "{{ date }}";
const ABBRLINK_PLACEHOLDER: &str = "{{ abbrlink }}";
const SLUG_PLACEHOLDER: &str = "{{ slug }}";

/// Values captured once per parse call.
///
/// `{{ abbrlink }}` and `{{ slug }}` share one computed identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    date: String,
    abbrlink: String,
}

impl Placeholders {
    /// Capture the current instant and derive the abbrlink from it.
    pub fn capture(settings: &AbbrlinkSettings) -> Self {
        Self::at(Local::now(), &unix_timestamp_string(OffsetDateTime::now_utc()), settings)
    }

    pub fn at<Tz: TimeZone>(now: DateTime<Tz>, timestamp: &str, settings: &AbbrlinkSettings) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let abbrlink = match settings.generate(timestamp) {
            Ok(id) => id.into_string(),
            Err(err) => {
                debug!(error = %err, "abbrlink placeholder left empty");
                String::new()
            }
        };
        Self {
            date: now.to_rfc3339_opts(SecondsFormat::Micros, false),
            abbrlink,
        }
    }

    pub fn fixed(date: impl Into<String>, abbrlink: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            abbrlink: abbrlink.into(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn abbrlink(&self) -> &str {
        &self.abbrlink
    }

    pub fn apply(&self, header: &str) -> String {
        header
            .replace(DATE_PLACEHOLDER, &self.date)
            .replace(ABBRLINK_PLACEHOLDER, &self.abbrlink)
            .replace(SLUG_PLACEHOLDER, &self.abbrlink)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    #[test]
    fn abbrlink_and_slug_share_one_value() {
        let now = FixedOffset::east_opt(8 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single())
            .expect("valid instant");
        let settings = AbbrlinkSettings::new("crc32", "hex");
        let placeholders = Placeholders::at(now, "123456789", &settings);

        let applied = placeholders.apply("date: {{ date }}\nabbrlink: {{ abbrlink }}\nslug: {{ slug }}");
        assert_eq!(
            applied,
            "date: 2024-05-06T07:08:09.000000+08:00\nabbrlink: cbf43926\nslug: cbf43926"
        );
    }

    #[test]
    fn unsupported_algorithm_substitutes_empty_identifier() {
        let settings = AbbrlinkSettings::new("sha1", "dec");
        let placeholders = Placeholders::at(Local::now(), "1", &settings);
        assert_eq!(placeholders.abbrlink(), "");
        assert_eq!(placeholders.apply("slug: {{ slug }}"), "slug: ");
    }
}
