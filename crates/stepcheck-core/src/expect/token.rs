//! Symbolic expectation tokens
//!
//! Expected-value cells are either a sentinel token (`NULL`, `UUID`,
//! `ARRAY[3]`, `APPROXIMATELY(200)`, `BOOLEAN[TRUE]`, `NOW[+5mins]`) or a
//! literal JSON value compared structurally.

use serde_json::Value;

/// Unit for `NOW[...]` offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Secs,
    Mins,
}

impl TimeUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secs => "secs",
            Self::Mins => "mins",
        }
    }

    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Secs => 1,
            Self::Mins => 60,
        }
    }
}

/// A parsed expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// `NULL` - actual must be JSON null
    Null,
    /// `UUID` - hyphenated 8-4-4-4-12 hex string
    Uuid,
    /// `STRING` - any JSON string
    AnyString,
    /// `NUMBER` - any JSON number
    AnyNumber,
    /// `OBJECT` - any JSON object
    AnyObject,
    /// `BOOLEAN[TRUE]` / `BOOLEAN[FALSE]` - boolean with exact value
    Boolean(bool),
    /// `ARRAY[n]` - array of exactly n elements
    ArrayLen(usize),
    /// `APPROXIMATELY(n)` - number within the matcher tolerance of n
    Approximately(f64),
    /// `DATETIME` - parseable date-time string
    DateTime,
    /// `DATE` - parseable `YYYY-MM-DD` string
    Date,
    /// `TIME` - parseable `HH:MM:SS` string
    Time,
    /// `NOW[+5mins]` - timestamp near now plus/minus an offset
    Now { amount: i64, unit: TimeUnit },
    /// Anything else - deep structural equality
    Literal(Value),
}

impl Expected {
    /// Parse a normalized table cell into an expectation.
    ///
    /// Only strings can carry sentinel tokens; any other JSON value is a
    /// literal. A string that merely *starts* with a sentinel prefix but has
    /// a malformed payload is an error, not a literal.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] for malformed sentinel payloads such as
    /// `ARRAY[x]` or `BOOLEAN[YES]`.
    pub fn parse(cell: &Value) -> Result<Self, TokenError> {
        let Value::String(text) = cell else {
            return Ok(Self::Literal(cell.clone()));
        };

        match text.as_str() {
            "NULL" => return Ok(Self::Null),
            "UUID" => return Ok(Self::Uuid),
            "STRING" => return Ok(Self::AnyString),
            "NUMBER" => return Ok(Self::AnyNumber),
            "OBJECT" => return Ok(Self::AnyObject),
            "DATETIME" => return Ok(Self::DateTime),
            "DATE" => return Ok(Self::Date),
            "TIME" => return Ok(Self::Time),
            _ => {}
        }

        if let Some(payload) = text.strip_prefix("ARRAY") {
            let n = bracket_payload(payload)
                .and_then(|p| p.parse::<usize>().ok())
                .ok_or_else(|| TokenError::Malformed(text.clone()))?;
            return Ok(Self::ArrayLen(n));
        }

        if let Some(payload) = text.strip_prefix("APPROXIMATELY") {
            let n = payload
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .and_then(|p| p.parse::<f64>().ok())
                .filter(|n| n.is_finite())
                .ok_or_else(|| TokenError::Malformed(text.clone()))?;
            return Ok(Self::Approximately(n));
        }

        if let Some(payload) = text.strip_prefix("BOOLEAN") {
            return match bracket_payload(payload) {
                Some("TRUE") => Ok(Self::Boolean(true)),
                Some("FALSE") => Ok(Self::Boolean(false)),
                _ => Err(TokenError::Malformed(text.clone())),
            };
        }

        if let Some(payload) = text.strip_prefix("NOW") {
            return Ok(parse_now(payload));
        }

        Ok(Self::Literal(cell.clone()))
    }

    /// Render the expectation back to its token form for diagnostics.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Uuid => "UUID".to_string(),
            Self::AnyString => "STRING".to_string(),
            Self::AnyNumber => "NUMBER".to_string(),
            Self::AnyObject => "OBJECT".to_string(),
            Self::Boolean(true) => "BOOLEAN[TRUE]".to_string(),
            Self::Boolean(false) => "BOOLEAN[FALSE]".to_string(),
            Self::ArrayLen(n) => format!("ARRAY[{n}]"),
            Self::Approximately(n) => format!("APPROXIMATELY({n})"),
            Self::DateTime => "DATETIME".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time => "TIME".to_string(),
            Self::Now { amount, unit } => {
                let sign = if *amount < 0 { '-' } else { '+' };
                format!("NOW[{sign}{}{}]", amount.abs(), unit.as_str())
            }
            Self::Literal(v) => v.to_string(),
        }
    }
}

/// Extract `payload` from a `[payload]` suffix.
fn bracket_payload(s: &str) -> Option<&str> {
    s.strip_prefix('[')?.strip_suffix(']')
}

/// Parse the `NOW` payload. Bare `NOW` and unrecognized payloads mean
/// `+0secs`.
fn parse_now(payload: &str) -> Expected {
    let default = Expected::Now {
        amount: 0,
        unit: TimeUnit::Secs,
    };

    let Some(inner) = bracket_payload(payload) else {
        return default;
    };

    let (negative, rest) = match inner.as_bytes().first() {
        Some(b'+') => (false, &inner[1..]),
        Some(b'-') => (true, &inner[1..]),
        _ => return default,
    };

    let (digits, unit) = rest
        .strip_suffix("mins")
        .map(|d| (d, TimeUnit::Mins))
        .or_else(|| rest.strip_suffix("secs").map(|d| (d, TimeUnit::Secs)))
        .map_or((None, TimeUnit::Secs), |(d, u)| (Some(d), u));

    let Some(digits) = digits else {
        return default;
    };

    // Empty digits parse as 0, so `NOW[+mins]` is a zero offset
    let amount = if digits.is_empty() {
        0
    } else {
        match digits.parse::<i64>() {
            Ok(n) => n,
            Err(_) => return default,
        }
    };

    Expected::Now {
        amount: if negative { -amount } else { amount },
        unit,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed expectation token '{0}'")]
    Malformed(String),
}
