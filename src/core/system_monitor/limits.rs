use crate::error::{Result, VantaError};

/// Validate a caller-supplied result limit
pub fn parse_limit(limit: i64) -> Result<usize> {
    usize::try_from(limit)
        .map_err(|_| VantaError::invalid_input(format!("limit must be >= 0, got {}", limit)))
}

/// Validate a caller-supplied pid (`0..=u32::MAX`)
pub fn parse_pid(pid: i64) -> Result<u32> {
    u32::try_from(pid)
        .map_err(|_| VantaError::invalid_input(format!("pid {} is out of range", pid)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(0).unwrap(), 0);
        assert_eq!(parse_limit(25).unwrap(), 25);
        assert!(parse_limit(-1).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid(0).unwrap(), 0);
        assert_eq!(parse_pid(u32::MAX as i64).unwrap(), u32::MAX);
        assert!(parse_pid(-4).unwrap_err().is_invalid_input());
        assert!(parse_pid(u32::MAX as i64 + 1).unwrap_err().is_invalid_input());
    }
}
