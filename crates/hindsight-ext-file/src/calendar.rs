//! Holiday calendars delivered as JSON files.

use std::path::Path;

use tracing::info;

use hindsight_core::calendars::{Calendar, CalendarRegistry, HolidayCalendar};
use hindsight_traits::TraitError;

/// Load a holiday calendar from a JSON file.
///
/// ```json
/// { "name": "Desk Closures", "holidays": ["2024-01-02", "2024-07-05"] }
/// ```
pub fn load_holiday_calendar(path: impl AsRef<Path>) -> Result<HolidayCalendar, TraitError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| TraitError::IoError(format!("{}: {e}", path.display())))?;
    parse_holiday_calendar(&content)
}

/// Parse a holiday calendar from JSON text.
pub fn parse_holiday_calendar(content: &str) -> Result<HolidayCalendar, TraitError> {
    serde_json::from_str(content).map_err(|e| TraitError::ParseError(e.to_string()))
}

/// Load a holiday calendar file and register it under `name`.
pub fn register_holiday_calendar(
    registry: &mut CalendarRegistry,
    name: &str,
    path: impl AsRef<Path>,
) -> Result<(), TraitError> {
    let calendar = load_holiday_calendar(path)?;
    info!(
        name,
        calendar = calendar.name(),
        holidays = calendar.holidays().count(),
        "registered holiday calendar"
    );
    registry.register(name, calendar);
    Ok(())
}
