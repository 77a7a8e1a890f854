use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{DeviceClass, ScanEvent};

pub const TOP_REFERRERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// UTC `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrerCount {
    /// `<utm_source> / <utm_medium>`
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total_scans: u64,
    /// Distinct user agents.
    pub unique_devices: u64,
    pub daily: Vec<DailyCount>,
    pub devices: BTreeMap<DeviceClass, u64>,
    pub top_referrers: Vec<ReferrerCount>,
}

fn utc_day(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn referrer_key(scan: &ScanEvent) -> String {
    format!(
        "{} / {}",
        scan.utm.source.as_deref().unwrap_or("direct"),
        scan.utm.medium.as_deref().unwrap_or("none")
    )
}

pub fn summarize(scans: &[ScanEvent]) -> ScanSummary {
    let mut daily: BTreeMap<String, u64> = BTreeMap::new();
    let mut devices: BTreeMap<DeviceClass, u64> = BTreeMap::new();
    let mut referrers: HashMap<String, u64> = HashMap::new();
    let mut agents: HashSet<&str> = HashSet::new();

    for scan in scans {
        *daily.entry(utc_day(scan.scanned_at)).or_default() += 1;
        *devices.entry(scan.device).or_default() += 1;
        *referrers.entry(referrer_key(scan)).or_default() += 1;
        agents.insert(scan.user_agent.as_str());
    }

    let mut top_referrers: Vec<ReferrerCount> = referrers
        .into_iter()
        .map(|(source, count)| ReferrerCount { source, count })
        .collect();
    top_referrers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
    top_referrers.truncate(TOP_REFERRERS);

    ScanSummary {
        total_scans: scans.len() as u64,
        unique_devices: agents.len() as u64,
        daily: daily
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        devices,
        top_referrers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Utm;

    fn scan(at: i64, agent: &str, device: DeviceClass, source: Option<&str>) -> ScanEvent {
        ScanEvent {
            id: 0,
            qrcode_id: Some("abc".into()),
            short_code: None,
            scanned_at: at,
            user_agent: agent.into(),
            referrer: None,
            device,
            browser: "Unknown".into(),
            os: "Unknown".into(),
            utm: Utm {
                source: source.map(Into::into),
                medium: source.map(|_| "email".to_string()),
                ..Utm::default()
            },
            ip: None,
        }
    }

    #[test]
    fn empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_scans, 0);
        assert!(summary.daily.is_empty());
        assert!(summary.top_referrers.is_empty());
    }

    #[test]
    fn groups_by_day_device_and_referrer() {
        // 2023-11-14 22:13:20 UTC and the next day
        let day1 = 1_700_000_000;
        let day2 = day1 + 86_400;
        let scans = vec![
            scan(day1, "a", DeviceClass::Mobile, Some("newsletter")),
            scan(day1 + 10, "a", DeviceClass::Mobile, Some("newsletter")),
            scan(day2, "b", DeviceClass::Desktop, None),
        ];
        let summary = summarize(&scans);

        assert_eq!(summary.total_scans, 3);
        assert_eq!(summary.unique_devices, 2);
        assert_eq!(
            summary.daily,
            vec![
                DailyCount { date: "2023-11-14".into(), count: 2 },
                DailyCount { date: "2023-11-15".into(), count: 1 },
            ]
        );
        assert_eq!(summary.devices[&DeviceClass::Mobile], 2);
        assert_eq!(summary.top_referrers[0].source, "newsletter / email");
        assert_eq!(summary.top_referrers[1].source, "direct / none");
    }

    #[test]
    fn keeps_only_top_three_referrers() {
        let scans: Vec<ScanEvent> = ["a", "b", "c", "d"]
            .iter()
            .map(|s| scan(0, "ua", DeviceClass::Desktop, Some(s)))
            .collect();
        assert_eq!(summarize(&scans).top_referrers.len(), TOP_REFERRERS);
    }
}
