//! Outcome Classifier
//!
//! Maps a transfer amount onto the simulated branch using two configured
//! closed ranges. Anything unparsable falls through to [`ProtocolOutcome::Normal`].

use std::fmt;
use std::str::FromStr;

/// Simulated branch for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolOutcome {
    Normal,
    Rejected,
    OtpVerification,
}

impl ProtocolOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolOutcome::Normal => "NORMAL",
            ProtocolOutcome::Rejected => "REJECTED",
            ProtocolOutcome::OtpVerification => "OTP_VERIFICATION",
        }
    }
}

impl fmt::Display for ProtocolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed interval `[from, to]` parsed from `"<from>-<to>"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountRange {
    pub from: f64,
    pub to: f64,
}

impl AmountRange {
    /// Both ends inclusive
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.from && amount <= self.to
    }

    /// `None` for absent, empty or malformed input
    pub fn parse_opt(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|r| r.parse().ok())
    }
}

impl FromStr for AmountRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("range '{}' is not <from>-<to>", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("range '{}': {}", s, e))
        };
        Ok(Self {
            from: parse(from)?,
            to: parse(to)?,
        })
    }
}

/// Parse a wire amount. Empty, non-numeric or non-finite values yield `None`.
pub fn parse_amount(amount: &str) -> Option<f64> {
    amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Rejected is checked first, then OTP, else normal
pub fn classify(
    amount: Option<&str>,
    rejected: Option<&AmountRange>,
    otp: Option<&AmountRange>,
) -> ProtocolOutcome {
    let Some(value) = amount.and_then(parse_amount) else {
        return ProtocolOutcome::Normal;
    };

    if rejected.is_some_and(|r| r.contains(value)) {
        ProtocolOutcome::Rejected
    } else if otp.is_some_and(|r| r.contains(value)) {
        ProtocolOutcome::OtpVerification
    } else {
        ProtocolOutcome::Normal
    }
}

/// The two configured ranges, parsed once at startup
#[derive(Debug, Clone, Default)]
pub struct OutcomeClassifier {
    rejected: Option<AmountRange>,
    otp: Option<AmountRange>,
}

impl OutcomeClassifier {
    pub fn new(rejected: Option<AmountRange>, otp: Option<AmountRange>) -> Self {
        Self { rejected, otp }
    }

    /// Build from raw config strings; malformed ranges disable their branch
    pub fn from_config(rejected: Option<&str>, otp: Option<&str>) -> Self {
        let rejected_range = AmountRange::parse_opt(rejected);
        let otp_range = AmountRange::parse_opt(otp);
        if rejected.is_some_and(|r| !r.trim().is_empty()) && rejected_range.is_none() {
            tracing::warn!(range = ?rejected, "Ignoring malformed rejected-transaction amount range");
        }
        if otp.is_some_and(|r| !r.trim().is_empty()) && otp_range.is_none() {
            tracing::warn!(range = ?otp, "Ignoring malformed OTP-verification amount range");
        }
        Self::new(rejected_range, otp_range)
    }

    pub fn classify(&self, amount: Option<&str>) -> ProtocolOutcome {
        classify(amount, self.rejected.as_ref(), self.otp.as_ref())
    }
}
