pub const MEMORY_MIN_MB: u32 = 128;
pub const MEMORY_MAX_MB: u32 = 3008;
pub const MEMORY_STEP_MB: u32 = 64;
pub const DEFAULT_MEMORY_MB: u32 = 1024;

pub const TIMEOUT_MIN_SEC: u32 = 1;
pub const TIMEOUT_MAX_SEC: u32 = 60;
pub const DEFAULT_TIMEOUT_SEC: u32 = 10;

/// Clamps to `[128, 3008]` and snaps to the nearest 64 MB step above the minimum.
pub fn clamp_memory_mb(requested: u32) -> u32 {
    let clamped = requested.clamp(MEMORY_MIN_MB, MEMORY_MAX_MB);
    let offset = clamped - MEMORY_MIN_MB;
    let steps = (offset + MEMORY_STEP_MB / 2) / MEMORY_STEP_MB;
    (MEMORY_MIN_MB + steps * MEMORY_STEP_MB).min(MEMORY_MAX_MB)
}

pub fn clamp_timeout_sec(requested: u32) -> u32 {
    requested.clamp(TIMEOUT_MIN_SEC, TIMEOUT_MAX_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_bounds() {
        assert_eq!(clamp_memory_mb(0), 128);
        assert_eq!(clamp_memory_mb(128), 128);
        assert_eq!(clamp_memory_mb(10_000), 3008);
        assert_eq!(clamp_memory_mb(3008), 3008);
    }

    #[test]
    fn test_memory_snaps_to_step() {
        assert_eq!(clamp_memory_mb(1024), 1024);
        assert_eq!(clamp_memory_mb(1000), 1024);
        assert_eq!(clamp_memory_mb(150), 128);
        assert_eq!(clamp_memory_mb(160), 192);
        assert_eq!((clamp_memory_mb(777) - MEMORY_MIN_MB) % MEMORY_STEP_MB, 0);
    }

    #[test]
    fn test_timeout_bounds() {
        assert_eq!(clamp_timeout_sec(0), 1);
        assert_eq!(clamp_timeout_sec(30), 30);
        assert_eq!(clamp_timeout_sec(61), 60);
    }
}
