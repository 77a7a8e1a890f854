use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Tablet => "Tablet",
            DeviceClass::Desktop => "Desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mobile" => Ok(DeviceClass::Mobile),
            "Tablet" => Ok(DeviceClass::Tablet),
            "Desktop" => Ok(DeviceClass::Desktop),
            other => Err(anyhow::anyhow!("unknown device class '{}'", other)),
        }
    }
}

/// Campaign attribution carried on the redirect request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utm {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl Utm {
    /// Pull `utm_*` parameters out of a query map; blank values are dropped.
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        let take = |key: &str| {
            query
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            source: take("utm_source"),
            medium: take("utm_medium"),
            campaign: take("utm_campaign"),
            term: take("utm_term"),
            content: take("utm_content"),
        }
    }
}

/// What a scan was recorded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    QrCode { unique_id: String },
    ShortCode { short_code: String, qrcode_id: Option<String> },
}

/// A scan about to be written.
#[derive(Debug, Clone)]
pub struct NewScan {
    pub target: ScanTarget,
    pub scanned_at: i64,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub device: DeviceClass,
    pub browser: String,
    pub os: String,
    pub utm: Utm,
    pub ip: Option<String>,
}

/// Stored scan. Scans are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: i64,
    pub qrcode_id: Option<String>,
    pub short_code: Option<String>,
    pub scanned_at: i64,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub device: DeviceClass,
    pub browser: String,
    pub os: String,
    pub utm: Utm,
    pub ip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm_ignores_blank_values() {
        let mut query = BTreeMap::new();
        query.insert("utm_source".to_string(), "newsletter".to_string());
        query.insert("utm_medium".to_string(), "  ".to_string());
        query.insert("shortcode".to_string(), "promo1".to_string());
        let utm = Utm::from_query(&query);
        assert_eq!(utm.source.as_deref(), Some("newsletter"));
        assert_eq!(utm.medium, None);
    }

    #[test]
    fn device_class_round_trips_through_text() {
        for class in [DeviceClass::Mobile, DeviceClass::Tablet, DeviceClass::Desktop] {
            assert_eq!(class.as_str().parse::<DeviceClass>().unwrap(), class);
        }
    }
}
