//! Records kept in the document store: codes, batches and found reports
use crate::error::UnknownStatus;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

// `Utc` itself has no ordering, so a derive would never apply here
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(TimeStamp)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Calendar day on which the finder picked the item up
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct FoundDate(NaiveDate);

impl FoundDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }
    /// Parses the `YYYY-MM-DD` form used by date inputs
    pub fn parse(raw: &str) -> Option<Self> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok().map(Self)
    }
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }
    pub fn to_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for FoundDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl<C> minicbor::Encode<C> for FoundDate {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        use chrono::Datelike;
        e.i32(self.0.num_days_from_ce())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for FoundDate {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let days = d.i32()?;

        NaiveDate::from_num_days_from_ce_opt(days)
            .map(FoundDate)
            .ok_or(minicbor::decode::Error::message("found date out of range"))
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeStatus {
    #[n(0)]
    Available, // not yet assigned to a specific item
    #[n(1)]
    Assigned,
    #[n(2)]
    Disabled, // permanently unusable for new reports
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Available => "available",
            CodeStatus::Assigned => "assigned",
            CodeStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CodeStatus::Available),
            "assigned" => Ok(CodeStatus::Assigned),
            "disabled" => Ok(CodeStatus::Disabled),
            other => Err(UnknownStatus {
                kind: "code",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Contacted,
    #[n(2)]
    Recovered,
    #[n(3)]
    Expired,
    #[n(4)]
    Invalid,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Contacted => "contacted",
            ReportStatus::Recovered => "recovered",
            ReportStatus::Expired => "expired",
            ReportStatus::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "contacted" => Ok(ReportStatus::Contacted),
            "recovered" => Ok(ReportStatus::Recovered),
            "expired" => Ok(ReportStatus::Expired),
            "invalid" => Ok(ReportStatus::Invalid),
            other => Err(UnknownStatus {
                kind: "report",
                value: other.to_string(),
            }),
        }
    }
}

/// A physical tag identifier. Keyed by `id`, which is the normalized code itself.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Code {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub status: CodeStatus,
    #[n(2)]
    pub batch_id: Option<String>,
    #[n(3)]
    pub product_type: Option<String>,
    #[n(4)]
    pub owner_id: Option<String>,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
    #[n(6)]
    pub assigned_at: Option<TimeStamp<Utc>>,
    #[n(7)]
    pub report_count: u32,
    #[n(8)]
    pub last_report_id: Option<String>,
    #[n(9)]
    pub last_reported_at: Option<TimeStamp<Utc>>,
}

impl Code {
    pub fn new(id: &str, status: CodeStatus) -> Self {
        Self {
            id: id.to_string(),
            status,
            batch_id: None,
            product_type: None,
            owner_id: None,
            created_at: TimeStamp::new(),
            assigned_at: None,
            report_count: 0,
            last_report_id: None,
            last_reported_at: None,
        }
    }
    pub fn set_batch(mut self, batch_id: &str) -> Self {
        self.batch_id = Some(batch_id.to_string());
        self
    }
    pub fn set_product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }
    pub fn assign_to(mut self, owner_id: &str) -> Self {
        self.owner_id = Some(owner_id.to_string());
        self.assigned_at = Some(TimeStamp::new());
        self
    }
    pub fn is_disabled(&self) -> bool {
        self.status == CodeStatus::Disabled
    }
}

/// Channels a user wants notifications on. Users without stored settings get
/// email and push.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    #[n(0)]
    pub email: bool,
    #[n(1)]
    pub push: bool,
    #[n(2)]
    pub sms: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
        }
    }
}

/// Provisioning metadata shared by a group of codes
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: Option<String>,
    #[n(3)]
    pub prefix: String,
    #[n(4)]
    pub product_type: Option<String>,
}

impl Batch {
    pub fn new(id: &str, name: &str, prefix: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            prefix: prefix.to_string(),
            product_type: None,
        }
    }
    pub fn set_product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }
}

/// A finder's submission, as persisted
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Report {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub code: String,
    #[n(2)]
    pub code_id: String,
    #[n(3)]
    pub batch_id: Option<String>,
    #[n(4)]
    pub product_type: Option<String>,
    #[n(5)]
    pub finder_name: String,
    #[n(6)]
    pub finder_email: String,
    #[n(7)]
    pub finder_phone: Option<String>,
    #[n(8)]
    pub location_found: String,
    #[n(9)]
    pub found_date: FoundDate,
    #[n(10)]
    pub message: Option<String>,
    #[n(11)]
    pub latitude: Option<f64>,
    #[n(12)]
    pub longitude: Option<f64>,
    #[n(13)]
    pub photos: Vec<String>,
    #[n(14)]
    pub status: ReportStatus,
    #[n(15)]
    pub reported_at: TimeStamp<Utc>,
    #[n(16)]
    pub owner_notified: bool,
    #[n(17)]
    pub owner_notified_at: Option<TimeStamp<Utc>>,
    #[n(18)]
    pub owner_contacted_finder: bool,
    #[n(19)]
    pub resolved_at: Option<TimeStamp<Utc>>,
}

/// A report before the store has assigned it an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub code: String,
    pub code_id: String,
    pub batch_id: Option<String>,
    pub product_type: Option<String>,
    pub finder_name: String,
    pub finder_email: String,
    pub finder_phone: Option<String>,
    pub location_found: String,
    pub found_date: FoundDate,
    pub message: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photos: Vec<String>,
    pub status: ReportStatus,
    pub reported_at: TimeStamp<Utc>,
    pub owner_notified: bool,
    pub owner_contacted_finder: bool,
    pub resolved_at: Option<TimeStamp<Utc>>,
}

impl NewReport {
    pub fn with_id(self, id: String) -> Report {
        Report {
            id,
            code: self.code,
            code_id: self.code_id,
            batch_id: self.batch_id,
            product_type: self.product_type,
            finder_name: self.finder_name,
            finder_email: self.finder_email,
            finder_phone: self.finder_phone,
            location_found: self.location_found,
            found_date: self.found_date,
            message: self.message,
            latitude: self.latitude,
            longitude: self.longitude,
            photos: self.photos,
            status: self.status,
            reported_at: self.reported_at,
            owner_notified: self.owner_notified,
            owner_notified_at: None,
            owner_contacted_finder: self.owner_contacted_finder,
            resolved_at: self.resolved_at,
        }
    }
}
