//! Gregorian → Jalali (Solar Hijri) date conversion.
//!
//! Uses the 33-year break table arithmetic, valid for Jalali years
//! -61..3177.

use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::error::{WatchError, WatchResult};

/// Jalali years at which the leap cycle pattern changes.
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for JalaliDate {
    /// `yyyy/MM/dd`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

struct YearInfo {
    /// 0 when the Jalali year is leap, otherwise years since the last leap
    leap: i32,
    /// March day of 1 Farvardin in the matching Gregorian year
    march: u32,
}

fn year_info(jy: i32) -> WatchResult<YearInfo> {
    let last = BREAKS[BREAKS.len() - 1];
    if jy < BREAKS[0] || jy >= last {
        return Err(WatchError::TimeParse(format!(
            "Jalali year {} outside supported range",
            jy
        )));
    }

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;
    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Ok(YearInfo {
        leap,
        march: march as u32,
    })
}

/// Convert a Gregorian calendar date to its Jalali equivalent.
pub fn to_jalali(date: NaiveDate) -> WatchResult<JalaliDate> {
    let gy = date.year();
    let mut jy = gy - 621;
    let info = year_info(jy)?;
    let nowruz = NaiveDate::from_ymd_opt(gy, 3, info.march).ok_or_else(|| {
        WatchError::TimeParse(format!("no Nowruz date for Gregorian year {}", gy))
    })?;

    let mut k = (date - nowruz).num_days();
    if k >= 0 {
        if k <= 185 {
            return Ok(JalaliDate {
                year: jy,
                month: 1 + (k / 31) as u32,
                day: (k % 31) as u32 + 1,
            });
        }
        k -= 186;
    } else {
        // Dey, Bahman or Esfand of the previous Jalali year
        jy -= 1;
        k += 179;
        if info.leap == 1 {
            k += 1;
        }
    }

    Ok(JalaliDate {
        year: jy,
        month: 7 + (k / 30) as u32,
        day: (k % 30) as u32 + 1,
    })
}
