use std::fmt;

/// Remaining checker credits, classified against the low-balance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceStatus {
    Healthy(f64),
    Low(f64),
    Unavailable,
}

impl BalanceStatus {
    pub fn classify(balance: Option<f64>, threshold: f64) -> Self {
        match balance {
            Some(b) if b < threshold => BalanceStatus::Low(b),
            Some(b) => BalanceStatus::Healthy(b),
            None => BalanceStatus::Unavailable,
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, BalanceStatus::Low(_))
    }
}

impl fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceStatus::Healthy(b) => write!(f, "Checker balance: {b:.0}"),
            BalanceStatus::Low(b) => write!(f, "Checker balance: {b:.0} (low)"),
            BalanceStatus::Unavailable => f.write_str("Checker balance: unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            BalanceStatus::classify(Some(5_000.0), 1_000.0),
            BalanceStatus::Healthy(5_000.0)
        );
        assert!(BalanceStatus::classify(Some(999.0), 1_000.0).is_low());
        assert_eq!(
            BalanceStatus::classify(None, 1_000.0),
            BalanceStatus::Unavailable
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BalanceStatus::Low(12.0).to_string(),
            "Checker balance: 12 (low)"
        );
        assert_eq!(
            BalanceStatus::Unavailable.to_string(),
            "Checker balance: unavailable"
        );
    }
}
