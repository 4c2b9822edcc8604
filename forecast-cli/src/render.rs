//! Plain-text rendering: a current-conditions header, an hourly strip and a
//! daily list.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use forecast_core::{
    CurrentConditions, DailyEntry, ForecastResponse, HourlyEntry, model::timestamp_utc,
};

/// How much of each series to show.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub hours: usize,
    pub days: usize,
}

pub fn render(forecast: &ForecastResponse, limits: Limits) -> String {
    Report { forecast, limits }.to_string()
}

/// A forecast laid out for the terminal.
pub struct Report<'a> {
    pub forecast: &'a ForecastResponse,
    pub limits: Limits,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { forecast, limits } = self;
        let offset = forecast.utc_offset();

        header(f, forecast)?;

        if limits.hours > 0 && !forecast.hourly.is_empty() {
            writeln!(f, "\nHourly: {}", forecast.hourly.summary)?;
            for entry in forecast.hourly.iter().take(limits.hours) {
                hourly_line(f, entry, offset)?;
            }
        }

        if limits.days > 0 && !forecast.daily.is_empty() {
            writeln!(f, "\nDaily: {}", forecast.daily.summary)?;
            for entry in forecast.daily.iter().take(limits.days) {
                daily_line(f, entry, offset)?;
            }
        }

        Ok(())
    }
}

fn header(f: &mut fmt::Formatter<'_>, forecast: &ForecastResponse) -> fmt::Result {
    let c: &CurrentConditions = &forecast.currently;
    writeln!(
        f,
        "{} ({:.4}, {:.4})",
        forecast.timezone, forecast.coordinates.latitude, forecast.coordinates.longitude
    )?;
    writeln!(f, "{}°  {}  (feels like {}°)", c.temperature, c.summary, c.apparent_temperature)?;
    write!(
        f,
        "humidity {:.0}%  wind {} from {}°  uv {}",
        c.humidity * 100.0,
        c.wind_speed,
        c.wind_bearing,
        c.uv_index
    )?;
    if let Some(kind) = &c.precip_type {
        write!(f, "  {kind} {:.0}%", c.precip_probability * 100.0)?;
    }
    writeln!(f)
}

fn hourly_line(
    f: &mut fmt::Formatter<'_>,
    entry: &HourlyEntry,
    offset: Option<FixedOffset>,
) -> fmt::Result {
    let when = local(entry.time, offset)
        .map(|t| t.format("%a %H:%M").to_string())
        .unwrap_or_else(|| entry.time.to_string());
    writeln!(f, "  {when}  {:>6}°  {}", entry.temperature, entry.icon)
}

fn daily_line(
    f: &mut fmt::Formatter<'_>,
    entry: &DailyEntry,
    offset: Option<FixedOffset>,
) -> fmt::Result {
    let when = local(entry.time, offset)
        .map(|t| t.format("%a %b %d").to_string())
        .unwrap_or_else(|| entry.time.to_string());
    write!(
        f,
        "  {when}  low {:>6}°  high {:>6}°  {}",
        entry.temperature_low, entry.temperature_high, entry.icon
    )?;
    if let Some(amount) = entry.precip_accumulation {
        write!(f, "  accumulation {amount}")?;
    }
    writeln!(f)
}

/// Provider timestamps shown in the location's own offset; UTC if unknown.
fn local(ts: i64, offset: Option<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let utc = timestamp_utc(ts)?;
    Some(match offset {
        Some(offset) => utc.with_timezone(&offset),
        None => utc.fixed_offset(),
    })
}
