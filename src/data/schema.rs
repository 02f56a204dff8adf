use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const MONTH_COLUMN: &str = "사용월";
pub const LINE_COLUMN: &str = "호선명";
pub const STATION_COLUMN: &str = "지하철역";
pub const WORK_DATE_COLUMN: &str = "작업일자";

const SLOT_HEADER_PATTERN: &str = r"^(\d{2})시-(\d{2})시\s+(승차|하차)인원$";

static SLOT_HEADER: OnceLock<Option<Regex>> = OnceLock::new();

fn slot_header_regex() -> Option<&'static Regex> {
    SLOT_HEADER
        .get_or_init(|| match Regex::new(SLOT_HEADER_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                log::error!("slot header pattern does not compile: {e}");
                None
            }
        })
        .as_ref()
}

// ---------------------------------------------------------------------------
// Non-fatal schema problems
// ---------------------------------------------------------------------------

/// A recoverable problem with the loaded table. The affected filter or view
/// degrades to a no-op; nothing aborts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataWarning {
    #[error("데이터에 '{0}' 컬럼이 없습니다.")]
    MissingColumn(&'static str),
    #[error("시간대 컬럼(예: '07시-08시 승차인원')을 찾지 못했습니다.")]
    NoTimeSlots,
}

// ---------------------------------------------------------------------------
// Direction / TimeSlot / TimeColumn
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Ride,
    Alight,
}

impl Direction {
    /// Header suffix used by the source files.
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Ride => "승차인원",
            Direction::Alight => "하차인원",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Ride => "승차",
            Direction::Alight => "하차",
        }
    }
}

/// One-hour interval such as `07시-08시`. Ordered by start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl TimeSlot {
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        TimeSlot {
            start_hour,
            end_hour,
        }
    }

    pub fn label(&self) -> String {
        format!("{:02}시-{:02}시", self.start_hour, self.end_hour)
    }

    /// Full header for this slot in the given direction, e.g. `07시-08시 승차인원`.
    pub fn header(&self, direction: Direction) -> String {
        format!("{} {}", self.label(), direction.suffix())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}시-{:02}시", self.start_hour, self.end_hour)
    }
}

/// Parse a header like `07시-08시 승차인원`. Anything else yields `None`.
pub fn parse_slot_header(header: &str) -> Option<(TimeSlot, Direction)> {
    let caps = slot_header_regex()?.captures(header.trim())?;
    let start_hour = caps[1].parse().ok()?;
    let end_hour = caps[2].parse().ok()?;
    let direction = match &caps[3] {
        "승차" => Direction::Ride,
        _ => Direction::Alight,
    };
    Some((TimeSlot::new(start_hour, end_hour), direction))
}

/// Sorted, distinct slots referenced by any ride/alight header.
pub fn discover_time_slots<S: AsRef<str>>(columns: &[S]) -> Vec<TimeSlot> {
    columns
        .iter()
        .filter_map(|c| parse_slot_header(c.as_ref()))
        .map(|(slot, _)| slot)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Identifies one count column: a slot (by position in the [`SlotSchema`])
/// and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeColumn {
    pub slot: usize,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// SlotSchema – typed description of the time-slot columns
// ---------------------------------------------------------------------------

/// Where the ride/alight counts of one slot live in the source header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotColumns {
    pub slot: TimeSlot,
    pub ride: Option<usize>,
    pub alight: Option<usize>,
}

impl SlotColumns {
    pub fn index(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Ride => self.ride,
            Direction::Alight => self.alight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSchema {
    slots: Vec<SlotColumns>,
}

impl SlotSchema {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let slots = discover_time_slots(headers);
        let mut columns: Vec<SlotColumns> = slots
            .into_iter()
            .map(|slot| SlotColumns {
                slot,
                ride: None,
                alight: None,
            })
            .collect();

        for (idx, header) in headers.iter().enumerate() {
            let Some((slot, direction)) = parse_slot_header(header.as_ref()) else {
                continue;
            };
            let Ok(pos) = columns.binary_search_by(|c| c.slot.cmp(&slot)) else {
                continue;
            };
            let target = match direction {
                Direction::Ride => &mut columns[pos].ride,
                Direction::Alight => &mut columns[pos].alight,
            };
            // first occurrence wins on duplicated headers
            if target.is_none() {
                *target = Some(idx);
            }
        }

        SlotSchema { slots: columns }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[SlotColumns] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<TimeSlot> {
        self.slots.get(index).map(|c| c.slot)
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(|c| c.slot.label()).collect()
    }

    /// Whether the source actually carries this column.
    pub fn has_column(&self, column: TimeColumn) -> bool {
        self.slots
            .get(column.slot)
            .and_then(|c| c.index(column.direction))
            .is_some()
    }

    pub fn header(&self, column: TimeColumn) -> Option<String> {
        self.slot(column.slot).map(|s| s.header(column.direction))
    }
}

// ---------------------------------------------------------------------------
// DatasetSchema – everything the pipeline needs to know about the header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSchema {
    pub month: Option<usize>,
    pub line: Option<usize>,
    pub station: Option<usize>,
    pub work_date: Option<usize>,
    pub slots: SlotSchema,
}

impl DatasetSchema {
    /// Describe a header once at load time.
    pub fn describe<S: AsRef<str>>(headers: &[S]) -> (Self, Vec<DataWarning>) {
        let find = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);

        let schema = DatasetSchema {
            month: find(MONTH_COLUMN),
            line: find(LINE_COLUMN),
            station: find(STATION_COLUMN),
            work_date: find(WORK_DATE_COLUMN),
            slots: SlotSchema::from_headers(headers),
        };

        let mut warnings = Vec::new();
        for (present, name) in [
            (schema.month.is_some(), MONTH_COLUMN),
            (schema.line.is_some(), LINE_COLUMN),
            (schema.station.is_some(), STATION_COLUMN),
        ] {
            if !present {
                log::warn!("column '{name}' not found in header");
                warnings.push(DataWarning::MissingColumn(name));
            }
        }

        match (schema.slots.slots().first(), schema.slots.slots().last()) {
            (Some(first), Some(last)) => log::info!(
                "discovered {} time slots ({} .. {})",
                schema.slots.len(),
                first.slot,
                last.slot
            ),
            _ => {
                log::warn!("no time-slot columns found");
                warnings.push(DataWarning::NoTimeSlots);
            }
        }

        (schema, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_header_pattern_compiles() {
        let re = slot_header_regex().unwrap();
        assert!(re.is_match("07시-08시 승차인원"));
        assert!(!re.is_match("07시-08시 인원"));
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn discovers_sorted_distinct_slots() {
        let cols = headers(&[
            "사용월",
            "08시-09시 하차인원",
            "07시-08시 승차인원",
            "08시-09시 승차인원",
            "00시-01시 승차인원",
            "07시-08시 하차인원",
        ]);
        let slots = discover_time_slots(&cols);
        assert_eq!(
            slots,
            vec![
                TimeSlot::new(0, 1),
                TimeSlot::new(7, 8),
                TimeSlot::new(8, 9)
            ]
        );
    }

    #[test]
    fn ignores_columns_outside_the_convention() {
        let cols = headers(&["07시-08시 합계", "07시 승차인원", "7시-8시 승차인원", "호선명"]);
        assert!(discover_time_slots(&cols).is_empty());
    }

    #[test]
    fn parses_header_direction() {
        assert_eq!(
            parse_slot_header(" 23시-24시 하차인원 "),
            Some((TimeSlot::new(23, 24), Direction::Alight))
        );
        assert_eq!(TimeSlot::new(7, 8).header(Direction::Ride), "07시-08시 승차인원");
    }

    #[test]
    fn slot_schema_tracks_one_sided_slots() {
        let cols = headers(&["07시-08시 승차인원", "08시-09시 하차인원"]);
        let schema = SlotSchema::from_headers(&cols);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.slots()[0].ride, Some(0));
        assert_eq!(schema.slots()[0].alight, None);
        assert_eq!(schema.slots()[1].alight, Some(1));
        assert!(!schema.has_column(TimeColumn {
            slot: 1,
            direction: Direction::Ride
        }));
    }

    #[test]
    fn describe_reports_missing_columns_without_failing() {
        let (schema, warnings) = DatasetSchema::describe(&headers(&["호선명", "지하철역"]));
        assert_eq!(schema.line, Some(0));
        assert_eq!(schema.station, Some(1));
        assert!(schema.slots.is_empty());
        assert_eq!(
            warnings,
            vec![DataWarning::MissingColumn(MONTH_COLUMN), DataWarning::NoTimeSlots]
        );
    }

    #[test]
    fn describe_full_header_has_no_warnings() {
        let (schema, warnings) = DatasetSchema::describe(&headers(&[
            "사용월",
            "호선명",
            "지하철역",
            "04시-05시 승차인원",
            "04시-05시 하차인원",
            "작업일자",
        ]));
        assert!(warnings.is_empty());
        assert_eq!(schema.work_date, Some(5));
        assert_eq!(schema.slots.labels(), vec!["04시-05시".to_string()]);
    }
}
