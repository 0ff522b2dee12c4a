//! Best-effort process memory probe. Platforms without a cheap resident-size
//! source report nothing and the caller skips the sample.

#[cfg(target_os = "linux")]
pub fn usage_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * page_size())
}

#[cfg(target_os = "linux")]
fn page_size() -> u64 {
    // 4 KiB everywhere this app ships; sysconf would need libc.
    4096
}

#[cfg(not(target_os = "linux"))]
pub fn usage_bytes() -> Option<u64> {
    None
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn reports_a_positive_resident_size() {
        let usage = usage_bytes().expect("statm should be readable on linux");
        assert!(usage > 0);
    }
}
