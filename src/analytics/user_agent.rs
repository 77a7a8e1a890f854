//! Coarse user-agent classification. Checks run in a fixed order because
//! many agents carry several product tokens (Edge also says Chrome, Chrome
//! also says Safari, iPhone agents also say Mac OS X).

use crate::models::DeviceClass;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub device: DeviceClass,
    pub browser: &'static str,
    pub os: &'static str,
}

pub fn classify(user_agent: &str) -> UserAgentInfo {
    let ua = user_agent.to_ascii_lowercase();
    UserAgentInfo {
        device: device_class(&ua),
        browser: browser(&ua),
        os: os(&ua),
    }
}

fn device_class(ua: &str) -> DeviceClass {
    let mobile = ["mobile", "android", "iphone", "ipad", "ipod"]
        .iter()
        .any(|t| ua.contains(t));
    if !mobile {
        return DeviceClass::Desktop;
    }
    if ua.contains("tablet") || ua.contains("ipad") {
        DeviceClass::Tablet
    } else {
        DeviceClass::Mobile
    }
}

fn browser(ua: &str) -> &'static str {
    if ua.contains("edg/") || ua.contains("edge/") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("samsungbrowser") {
        "Samsung Internet"
    } else if ua.contains("firefox") || ua.contains("fxios") {
        "Firefox"
    } else if ua.contains("chrome") || ua.contains("crios") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "Unknown"
    }
}

fn os(ua: &str) -> &'static str {
    if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        "iOS"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/118.0 Mobile/15E148 Safari/604.1";
    const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Edg/120.0";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";

    #[test]
    fn iphone_is_mobile_safari_on_ios() {
        let info = classify(IPHONE);
        assert_eq!(info.device, DeviceClass::Mobile);
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn ipad_is_tablet() {
        let info = classify(IPAD);
        assert_eq!(info.device, DeviceClass::Tablet);
        assert_eq!(info.browser, "Chrome");
    }

    #[test]
    fn edge_wins_over_chrome() {
        let info = classify(EDGE);
        assert_eq!(info.browser, "Edge");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.device, DeviceClass::Desktop);
    }

    #[test]
    fn android_before_linux() {
        let info = classify(ANDROID);
        assert_eq!(info.os, "Android");
        assert_eq!(info.device, DeviceClass::Mobile);
    }

    #[test]
    fn empty_agent() {
        let info = classify("");
        assert_eq!(info, UserAgentInfo { device: DeviceClass::Desktop, browser: "Unknown", os: "Unknown" });
    }
}
