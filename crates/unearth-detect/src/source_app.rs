//! Guess which app produced a file from where it lives.

const APP_PATTERNS: &[(&str, &str)] = &[
    // Social media
    ("whatsapp", "WhatsApp"),
    ("telegram", "Telegram"),
    ("instagram", "Instagram"),
    ("facebook", "Facebook"),
    ("twitter", "Twitter/X"),
    ("snapchat", "Snapchat"),
    ("tiktok", "TikTok"),
    // Messaging
    ("viber", "Viber"),
    ("signal", "Signal"),
    ("discord", "Discord"),
    ("wechat", "WeChat"),
    // Media
    ("spotify", "Spotify"),
    ("youtube", "YouTube"),
    ("vlc", "VLC"),
    // Camera and gallery
    ("dcim", "Camera"),
    ("camera", "Camera"),
    ("screenshot", "Screenshots"),
    ("screen_recording", "Screen Recording"),
    // Browsers
    ("chrome", "Chrome"),
    ("firefox", "Firefox"),
    ("opera", "Opera"),
    ("brave", "Brave"),
    // Productivity
    ("download", "Downloads"),
    ("documents", "Documents"),
    ("drive", "Google Drive"),
    ("dropbox", "Dropbox"),
    ("onedrive", "OneDrive"),
    // Editors
    ("snapseed", "Snapseed"),
    ("lightroom", "Lightroom"),
    ("picsart", "PicsArt"),
    ("inshot", "InShot"),
    ("capcut", "CapCut"),
    ("kinemaster", "KineMaster"),
];

/// Name the app a path most likely belongs to.
///
/// Known folder names are matched first (case-insensitively, first entry
/// wins). Otherwise a `/com.<vendor>.<app>/` package directory yields the
/// capitalised vendor segment.
pub fn detect_source_app(path: &str) -> Option<String> {
    let lower = path.to_lowercase();

    if let Some((_, app)) = APP_PATTERNS.iter().find(|(pattern, _)| lower.contains(pattern)) {
        return Some((*app).to_string());
    }

    lower
        .split('/')
        .filter_map(|segment| segment.strip_prefix("com."))
        .find_map(|rest| {
            let (vendor, app) = rest.split_once('.')?;
            (!vendor.is_empty() && !app.is_empty()).then(|| capitalize(vendor))
        })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
