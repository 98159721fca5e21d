//! # 時間ウィンドウ
//!
//! `RATE_LIMIT_WINDOW` の文字列（`1 minute`, `30s`, `60000` など）を解釈する。
//! 数値のみの場合はミリ秒として扱う。
//!
//! [`TimeWindow::label`] はレスポンスの `tempoEspera` やメッセージに埋め込む表示用文字列で、
//! 値を最大の単位に丸めて表す（`60000` → `1 minute`、`90s` → `2 minutes`）。

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// 入力文字列の上限
const MAX_INPUT_LEN: usize = 100;

/// 時間ウィンドウの解釈エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowParseError {
    #[error("time window is empty")]
    Empty,

    #[error("time window is too long")]
    TooLong,

    #[error("invalid number in time window: {0}")]
    InvalidNumber(String),

    #[error("unknown time unit: {0}")]
    UnknownUnit(String),

    #[error("time window must be at least 1 ms")]
    NotPositive,
}

/// レート制限の時間ウィンドウ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    duration: Duration,
    label:    String,
}

impl TimeWindow {
    pub fn from_millis(millis: u64) -> Result<Self, WindowParseError> {
        if millis == 0 {
            return Err(WindowParseError::NotPositive);
        }
        Ok(Self {
            duration: Duration::from_millis(millis),
            label:    long_label(millis),
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 表示用の文字列（例: `1 minute`）
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl FromStr for TimeWindow {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WindowParseError::Empty);
        }
        if s.len() > MAX_INPUT_LEN {
            return Err(WindowParseError::TooLong);
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| WindowParseError::InvalidNumber(number.to_string()))?;
        let factor = unit_factor(unit.trim())?;

        let millis = (value * factor).round();
        if !millis.is_finite() || millis < 1.0 {
            return Err(WindowParseError::NotPositive);
        }

        Self::from_millis(millis as u64)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// 単位 1 つあたりのミリ秒数（大文字小文字は区別しない）
fn unit_factor(unit: &str) -> Result<f64, WindowParseError> {
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return Err(WindowParseError::UnknownUnit(unit.to_string())),
    };
    Ok(factor)
}

/// ミリ秒を最大の単位に丸めた表示用文字列にする
///
/// 単位の 1.5 倍以上で複数形になる。1 秒未満は `N ms`。
fn long_label(millis: u64) -> String {
    let value = millis as f64;

    for (unit, name) in [
        (DAY, "day"),
        (HOUR, "hour"),
        (MINUTE, "minute"),
        (SECOND, "second"),
    ] {
        if value >= unit {
            let count = (value / unit).round();
            let plural = if value >= unit * 1.5 { "s" } else { "" };
            return format!("{count} {name}{plural}");
        }
    }

    format!("{millis} ms")
}
