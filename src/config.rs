use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::AmortizationMethod;

/// longest gap between due dates, one year
pub const MAX_CADENCE_DAYS: u32 = 366;

/// hard ceiling on the number of installments of one loan
pub const MAX_TENURE: u32 = 10_000;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub amortization_method: AmortizationMethod,
    /// days between consecutive due dates
    pub cadence_days: u32,
    /// balances this close to zero count as zero
    pub dust_tolerance: Money,
    pub max_tenure: Option<u32>,
}

impl LedgerConfig {
    /// weekly equal installments, the reference behaviour
    pub fn weekly() -> Self {
        Self {
            amortization_method: AmortizationMethod::EqualSplit,
            cadence_days: 7,
            dust_tolerance: Money::from_decimal(dec!(0.000001)),
            max_tenure: None,
        }
    }

    /// equal installments on an arbitrary cadence
    pub fn with_cadence(cadence_days: u32) -> Self {
        Self {
            cadence_days,
            ..Self::weekly()
        }
    }

    pub fn amortization_method(mut self, method: AmortizationMethod) -> Self {
        self.amortization_method = method;
        self
    }

    pub fn max_tenure(mut self, tenure: u32) -> Self {
        self.max_tenure = Some(tenure);
        self
    }

    pub fn dust_tolerance(mut self, tolerance: Money) -> Self {
        self.dust_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cadence_days == 0 || self.cadence_days > MAX_CADENCE_DAYS {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "cadence_days must be between 1 and {}, got {}",
                    MAX_CADENCE_DAYS, self.cadence_days
                ),
            });
        }

        if self.dust_tolerance.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("dust_tolerance must not be negative, got {}", self.dust_tolerance),
            });
        }

        if let Some(max) = self.max_tenure {
            if max == 0 || max > MAX_TENURE {
                return Err(LedgerError::InvalidConfiguration {
                    message: format!("max_tenure must be between 1 and {}, got {}", MAX_TENURE, max),
                });
            }
        }

        Ok(())
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::weekly()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.cadence_days, 7);
        assert_eq!(config.amortization_method, AmortizationMethod::EqualSplit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_cadence() {
        let config = LedgerConfig::with_cadence(0);
        assert!(matches!(
            config.validate(),
            Err(LedgerError::InvalidConfiguration { .. })
        ));
        assert!(LedgerConfig::weekly().max_tenure(0).validate().is_err());
    }

    #[test]
    fn test_validation_bounds_cadence_and_tenure() {
        assert!(LedgerConfig::with_cadence(MAX_CADENCE_DAYS).validate().is_ok());
        assert!(LedgerConfig::with_cadence(MAX_CADENCE_DAYS + 1).validate().is_err());
        assert!(LedgerConfig::weekly().max_tenure(MAX_TENURE + 1).validate().is_err());

        let err = LedgerConfig::from_json(
            r#"{"amortization_method":"EqualSplit","cadence_days":4294967295,"dust_tolerance":"0.000001","max_tenure":null}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let config = LedgerConfig::with_cadence(14)
            .amortization_method(AmortizationMethod::EqualSplitLastAdjusted)
            .max_tenure(52);
        let json = serde_json::to_string(&config).unwrap();

        let parsed = LedgerConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.dust_tolerance.to_string(), "0.000001");
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = LedgerConfig::from_json("{\"cadence_days\": 7}").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfiguration { .. }));
    }
}
