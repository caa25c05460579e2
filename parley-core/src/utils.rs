pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";

/// Public STUN servers used when nothing else is configured.
pub fn default_stun_urls() -> Vec<String> {
    [
        DEFAULT_STUN_ADDR,
        DEFAULT_STUN_ADDR_2,
        DEFAULT_STUN_ADDR_3,
        DEFAULT_STUN_ADDR_4,
    ]
    .iter()
    .map(|url| url.to_string())
    .collect()
}
