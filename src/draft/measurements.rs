use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
        }
    }

    /// Display label; children render as boy/girl while the stored value
    /// stays men/women.
    pub fn label_for(&self, age_group: AgeGroup) -> &'static str {
        match (self, age_group) {
            (Gender::Men, AgeGroup::Adult) => "men",
            (Gender::Women, AgeGroup::Adult) => "women",
            (Gender::Men, AgeGroup::Child) => "boy",
            (Gender::Women, AgeGroup::Child) => "girl",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Adult,
    Child,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Adult => "adult",
            AgeGroup::Child => "child",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    Cm,
    In,
}

const ADULT_MEN: &[&str] = &[
    "chest", "waist", "hips", "shoulder", "sleeve", "length", "neck", "inseam", "height",
];
const ADULT_WOMEN: &[&str] = &[
    "bust", "waist", "hips", "shoulder", "sleeve", "length", "neck", "height",
];
const CHILD_BOY: &[&str] = &[
    "chest", "waist", "hips", "shoulder", "sleeve", "length", "neck", "height", "age",
];
const CHILD_GIRL: &[&str] = &[
    "bust", "waist", "hips", "shoulder", "sleeve", "length", "neck", "height", "age",
];

/// Required field names for one gender / age-group combination.
pub fn required_fields(gender: Gender, age_group: AgeGroup) -> &'static [&'static str] {
    match (gender, age_group) {
        (Gender::Men, AgeGroup::Adult) => ADULT_MEN,
        (Gender::Women, AgeGroup::Adult) => ADULT_WOMEN,
        (Gender::Men, AgeGroup::Child) => CHILD_BOY,
        (Gender::Women, AgeGroup::Child) => CHILD_GIRL,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Checks a custom measurement set against the profile for the wearer.
/// Every required field must be present, finite and strictly positive;
/// fields outside the profile are rejected rather than silently kept.
pub fn validate_measurements(
    gender: Gender,
    age_group: AgeGroup,
    values: &BTreeMap<String, f64>,
) -> Result<(), Vec<FieldError>> {
    let required = required_fields(gender, age_group);
    let mut errors = Vec::new();

    for field in required {
        match values.get(*field) {
            None => errors.push(FieldError::new(field, "is required")),
            Some(v) if !v.is_finite() => errors.push(FieldError::new(field, "must be a number")),
            Some(v) if *v <= 0.0 => {
                errors.push(FieldError::new(field, "must be greater than 0"))
            }
            Some(_) => {}
        }
    }

    for field in values.keys() {
        if !required.contains(&field.as_str()) {
            errors.push(FieldError::new(field, "is not a known measurement"));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set(gender: Gender, age_group: AgeGroup, value: f64) -> BTreeMap<String, f64> {
        required_fields(gender, age_group)
            .iter()
            .map(|f| (f.to_string(), value))
            .collect()
    }

    #[test]
    fn profiles_differ_by_gender_and_age() {
        assert!(required_fields(Gender::Men, AgeGroup::Adult).contains(&"inseam"));
        assert!(!required_fields(Gender::Women, AgeGroup::Adult).contains(&"inseam"));
        assert!(required_fields(Gender::Women, AgeGroup::Child).contains(&"age"));
        assert!(!required_fields(Gender::Men, AgeGroup::Adult).contains(&"age"));
    }

    #[test]
    fn complete_positive_set_passes() {
        let values = full_set(Gender::Men, AgeGroup::Adult, 42.0);
        assert!(validate_measurements(Gender::Men, AgeGroup::Adult, &values).is_ok());
    }

    #[test]
    fn barely_positive_value_passes() {
        let mut values = full_set(Gender::Women, AgeGroup::Adult, 60.0);
        values.insert("neck".into(), 0.1);
        assert!(validate_measurements(Gender::Women, AgeGroup::Adult, &values).is_ok());
    }

    #[test]
    fn zero_and_negative_are_rejected() {
        let mut values = full_set(Gender::Men, AgeGroup::Adult, 42.0);
        values.insert("waist".into(), 0.0);
        values.insert("neck".into(), -3.0);
        let errors = validate_measurements(Gender::Men, AgeGroup::Adult, &values).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["waist", "neck"]);
    }

    #[test]
    fn missing_and_unknown_fields_are_reported() {
        let mut values = full_set(Gender::Women, AgeGroup::Child, 30.0);
        values.remove("age");
        values.insert("wingspan".into(), 90.0);
        let errors =
            validate_measurements(Gender::Women, AgeGroup::Child, &values).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "age" && e.message == "is required"));
        assert!(errors.iter().any(|e| e.field == "wingspan"));
    }

    #[test]
    fn child_labels_map_to_boy_girl() {
        assert_eq!(Gender::Men.label_for(AgeGroup::Child), "boy");
        assert_eq!(Gender::Women.label_for(AgeGroup::Child), "girl");
        assert_eq!(Gender::Women.label_for(AgeGroup::Adult), "women");
    }
}
