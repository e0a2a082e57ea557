//! Found item form state and local validation
use crate::report::ReportInput;
use crate::types::FoundDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    FinderName,
    FinderEmail,
    FinderPhone,
    LocationFound,
    FoundDate,
    Message,
    Latitude,
    Longitude,
}

/// What the finder has typed so far. Values are kept as entered; errors are per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportForm {
    code: String,
    values: BTreeMap<FormField, String>,
    errors: BTreeMap<FormField, String>,
}

impl ReportForm {
    /// Empty form for `code`, with the found date defaulting to `today`
    pub fn new(code: &str, today: FoundDate) -> Self {
        let mut values = BTreeMap::new();
        values.insert(FormField::FoundDate, today.to_string());
        Self {
            code: code.to_string(),
            values,
            errors: BTreeMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn value(&self, field: FormField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    /// Edit a field. Clears that field's error and no other.
    pub fn set(&mut self, field: FormField, value: &str) {
        self.values.insert(field, value.to_string());
        self.errors.remove(&field);
    }

    pub fn with(mut self, field: FormField, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    fn text(&self, field: FormField) -> &str {
        self.value(field).trim()
    }

    /// Run every local check, replacing the error set. Returns true when clean.
    pub fn validate(&mut self, today: FoundDate) -> bool {
        let mut errors = BTreeMap::new();

        if self.text(FormField::FinderName).is_empty() {
            errors.insert(FormField::FinderName, "Name is required".to_string());
        }

        let email = self.text(FormField::FinderEmail);
        if email.is_empty() {
            errors.insert(FormField::FinderEmail, "Email is required".to_string());
        } else if !EMAIL_SHAPE.is_match(email) {
            errors.insert(
                FormField::FinderEmail,
                "Please enter a valid email address".to_string(),
            );
        }

        if self.text(FormField::LocationFound).is_empty() {
            errors.insert(FormField::LocationFound, "Location is required".to_string());
        }

        let date = self.text(FormField::FoundDate);
        if date.is_empty() {
            errors.insert(FormField::FoundDate, "Date found is required".to_string());
        } else {
            match FoundDate::parse(date) {
                None => {
                    errors.insert(FormField::FoundDate, "Please enter a valid date".to_string());
                }
                Some(found) if found > today => {
                    errors.insert(
                        FormField::FoundDate,
                        "Date found cannot be in the future".to_string(),
                    );
                }
                Some(_) => {}
            }
        }

        self.check_position(&mut errors);

        self.errors = errors;
        self.errors.is_empty()
    }

    fn check_position(&self, errors: &mut BTreeMap<FormField, String>) {
        let lat = self.text(FormField::Latitude);
        let lng = self.text(FormField::Longitude);
        match (lat.is_empty(), lng.is_empty()) {
            (true, true) => {}
            (false, true) | (true, false) => {
                let field = if lat.is_empty() {
                    FormField::Latitude
                } else {
                    FormField::Longitude
                };
                errors.insert(
                    field,
                    "Latitude and longitude must be provided together".to_string(),
                );
            }
            (false, false) => {
                if !in_range(lat, 90.0) {
                    errors.insert(
                        FormField::Latitude,
                        "Latitude must be between -90 and 90".to_string(),
                    );
                }
                if !in_range(lng, 180.0) {
                    errors.insert(
                        FormField::Longitude,
                        "Longitude must be between -180 and 180".to_string(),
                    );
                }
            }
        }
    }

    /// Fill the position from a device geolocation fix
    pub fn set_position(&mut self, latitude: f64, longitude: f64) {
        self.set(FormField::Latitude, &latitude.to_string());
        self.set(FormField::Longitude, &longitude.to_string());
    }

    /// Validate and, when clean, turn the form into submission input
    pub fn to_input(&mut self, today: FoundDate) -> Option<ReportInput> {
        if !self.validate(today) {
            return None;
        }

        let mut input = ReportInput::new(&self.code)
            .set_finder_name(self.value(FormField::FinderName))
            .set_finder_email(self.value(FormField::FinderEmail))
            .set_finder_phone(self.value(FormField::FinderPhone))
            .set_location_found(self.value(FormField::LocationFound))
            .set_message(self.value(FormField::Message));

        if let Some(date) = FoundDate::parse(self.value(FormField::FoundDate)) {
            input = input.set_found_date(date);
        }
        if let (Ok(lat), Ok(lng)) = (
            self.text(FormField::Latitude).parse::<f64>(),
            self.text(FormField::Longitude).parse::<f64>(),
        ) {
            input = input.set_position(lat, lng);
        }
        Some(input)
    }
}

fn in_range(raw: &str, bound: f64) -> bool {
    raw.parse::<f64>()
        .map(|v| v.is_finite() && (-bound..=bound).contains(&v))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> FoundDate {
        FoundDate::parse("2024-06-01").unwrap()
    }

    fn filled() -> ReportForm {
        ReportForm::new("IFL-A1", today())
            .with(FormField::FinderName, "Alex")
            .with(FormField::FinderEmail, "alex@example.com")
            .with(FormField::LocationFound, "Gate 5")
            .with(FormField::FoundDate, "2024-01-01")
    }

    #[test]
    fn found_date_defaults_to_today() {
        let form = ReportForm::new("IFL-A1", today());
        assert_eq!(form.value(FormField::FoundDate), "2024-06-01");
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let mut form = ReportForm::new("IFL-A1", today()).with(FormField::FoundDate, "");

        assert!(!form.validate(today()));
        assert_eq!(form.error(FormField::FinderName), Some("Name is required"));
        assert_eq!(form.error(FormField::FinderEmail), Some("Email is required"));
        assert_eq!(form.error(FormField::LocationFound), Some("Location is required"));
        assert_eq!(form.error(FormField::FoundDate), Some("Date found is required"));
        assert_eq!(form.errors().len(), 4);
    }

    #[test]
    fn editing_clears_only_that_field() {
        let mut form = ReportForm::new("IFL-A1", today());
        form.validate(today());

        form.set(FormField::FinderName, "Alex");
        assert_eq!(form.error(FormField::FinderName), None);
        assert!(form.error(FormField::FinderEmail).is_some());
    }

    #[test]
    fn email_needs_a_domain_segment() {
        for bad in ["alex", "alex@example", "@example.com", "alex @example"] {
            let mut form = filled().with(FormField::FinderEmail, bad);
            assert!(!form.validate(today()), "{bad} should be rejected");
            assert_eq!(
                form.error(FormField::FinderEmail),
                Some("Please enter a valid email address")
            );
        }
    }

    #[test]
    fn future_and_garbled_dates_are_rejected() {
        let mut form = filled().with(FormField::FoundDate, "2024-06-02");
        assert!(!form.validate(today()));
        assert_eq!(
            form.error(FormField::FoundDate),
            Some("Date found cannot be in the future")
        );

        let mut form = filled().with(FormField::FoundDate, "yesterday");
        assert!(!form.validate(today()));

        // today itself is fine
        let mut form = filled().with(FormField::FoundDate, "2024-06-01");
        assert!(form.validate(today()));
    }

    #[test]
    fn position_must_be_paired_and_in_range() {
        let mut form = filled().with(FormField::Latitude, "51.5");
        assert!(!form.validate(today()));
        assert!(form.error(FormField::Longitude).is_some());

        let mut form = filled()
            .with(FormField::Latitude, "91")
            .with(FormField::Longitude, "-181");
        assert!(!form.validate(today()));
        assert!(form.error(FormField::Latitude).is_some());
        assert!(form.error(FormField::Longitude).is_some());

        let mut form = filled();
        form.set_position(51.5, -0.12);
        let input = form.to_input(today()).unwrap();
        assert_eq!(input.latitude, Some(51.5));
        assert_eq!(input.longitude, Some(-0.12));
    }

    #[test]
    fn clean_form_becomes_input() {
        let input = filled()
            .with(FormField::FinderPhone, " ")
            .with(FormField::Message, "Blue backpack")
            .to_input(today())
            .unwrap();

        assert_eq!(input.code, "IFL-A1");
        assert_eq!(input.finder_phone, None);
        assert_eq!(input.message.as_deref(), Some("Blue backpack"));
        assert_eq!(input.found_date, FoundDate::parse("2024-01-01"));
        assert!(input.validate().is_ok());
    }
}
