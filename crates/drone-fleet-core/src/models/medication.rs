//! Medication catalog and cargo models.

use serde::{Deserialize, Serialize};

/// A medication item.
///
/// Items with no `drone_serial` are catalog entries that can be loaded;
/// items with a `drone_serial` are cargo owned by that drone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationItem {
    /// Unique identifier
    pub id: String,
    /// Display name (letters, digits, dash, underscore)
    pub name: String,
    /// Weight in grams
    pub weight: f64,
    /// Number of units this record stands for
    pub quantity: i32,
    /// Product code (uppercase letters, digits, underscore)
    pub code: String,
    /// Optional image reference
    pub image: Option<String>,
    /// Owning drone, `None` for catalog entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drone_serial: Option<String>,
}

impl MedicationItem {
    /// Create a new catalog item with a generated id and a quantity of one.
    pub fn new(name: String, weight: f64, code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            weight,
            quantity: 1,
            code,
            image: None,
            drone_serial: None,
        }
    }

    /// Whether this item is a catalog entry rather than loaded cargo.
    pub fn is_catalog_entry(&self) -> bool {
        self.drone_serial.is_none()
    }

    /// Clone this catalog item into a cargo record for `drone_serial`.
    ///
    /// The clone gets a fresh id, `quantity + 1` units and a weight of
    /// `weight * new_quantity`, so the stored weight is the total for the
    /// new quantity rather than a unit weight.
    pub fn clone_for_drone(&self, drone_serial: &str) -> Self {
        let quantity = self.quantity + 1;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.clone(),
            weight: self.weight * f64::from(quantity),
            quantity,
            code: self.code.clone(),
            image: self.image.clone(),
            drone_serial: Some(drone_serial.to_string()),
        }
    }

    /// Check name, code and weight constraints.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_name(&self.name) {
            return Err(format!(
                "Name can only contain letters, numbers, dashes, and underscores: {:?}",
                self.name
            ));
        }
        if !is_valid_code(&self.code) {
            return Err(format!(
                "Code can only contain uppercase letters, numbers, and underscores: {:?}",
                self.code
            ));
        }
        if self.weight.is_nan() || self.weight <= 0.0 {
            return Err(format!("Weight must be positive: {}", self.weight));
        }
        Ok(())
    }
}

/// `^[a-zA-Z0-9-_]+$`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `^[A-Z0-9_]+$`
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_catalog_entry() {
        let item = MedicationItem::new("Biogesic".into(), 100.0, "MED01".into());
        assert!(item.is_catalog_entry());
        assert_eq!(item.quantity, 1);
        assert_eq!(item.id.len(), 36);
    }

    #[test]
    fn test_clone_for_drone_compounds_quantity_and_weight() {
        let mut item = MedicationItem::new("Alaxan".into(), 150.0, "MED02".into());
        item.image = Some("images/antibiotic.png".into());

        let cargo = item.clone_for_drone("D1");
        assert_eq!(cargo.quantity, 2);
        assert_eq!(cargo.weight, 300.0);
        assert_eq!(cargo.drone_serial.as_deref(), Some("D1"));
        assert_eq!(cargo.image, item.image);
        assert_ne!(cargo.id, item.id);

        // Catalog entry is untouched
        assert_eq!(item.quantity, 1);
        assert_eq!(item.weight, 150.0);
        assert!(item.is_catalog_entry());
    }

    #[test]
    fn test_name_pattern() {
        assert!(is_valid_name("Pain-Reliever_2"));
        assert!(!is_valid_name("Pain Reliever"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_code_pattern() {
        assert!(is_valid_code("MED_01"));
        assert!(!is_valid_code("med01"));
        assert!(!is_valid_code("MED-01"));
    }

    #[test]
    fn test_validate_rejects_non_positive_weight() {
        let item = MedicationItem::new("Biogesic".into(), 0.0, "MED01".into());
        assert!(item.validate().is_err());
    }
}
