//! Declarative column maps for positional row data
//!
//! The portal has no stable header contract, so fields are read by column
//! index. Each record type declares its index mapping here and validates it
//! once at job startup; a source layout change then fails fast and loudly
//! instead of silently misassigning fields.

use crate::extract::ExtractError;

/// A field-name to column-index mapping for one record type
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    /// Record type name, used in validation errors
    pub name: &'static str,

    /// Number of columns the source is expected to render
    pub expected_columns: usize,

    /// Field name to zero-based column index
    pub fields: &'static [(&'static str, usize)],
}

impl ColumnMap {
    /// Validates the map against its own expected column count
    ///
    /// Called once at job startup, before any extraction.
    pub fn validate(&self) -> Result<(), ExtractError> {
        for (field, index) in self.fields {
            if *index >= self.expected_columns {
                return Err(ExtractError::InvalidColumnMap {
                    map: self.name,
                    message: format!(
                        "field {:?} maps to column {} but only {} columns are expected",
                        field, index, self.expected_columns
                    ),
                });
            }
        }

        for (i, (field, _)) in self.fields.iter().enumerate() {
            if self.fields[i + 1..].iter().any(|(other, _)| other == field) {
                return Err(ExtractError::InvalidColumnMap {
                    map: self.name,
                    message: format!("field {:?} is mapped twice", field),
                });
            }
        }

        Ok(())
    }

    /// Looks up the column index for a field
    ///
    /// Unknown field names are a programming error caught by the tests that
    /// exercise every mapped field, so this panics rather than returning an
    /// Option that every call site would unwrap anyway.
    pub fn index(&self, field: &str) -> usize {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, index)| *index)
            .unwrap_or_else(|| panic!("column map {} has no field {:?}", self.name, field))
    }
}

/// Arrivals parent row: cell 0 is the expand/collapse control, data starts
/// at cell 1
pub const ARRIVAL_COLUMNS: ColumnMap = ColumnMap {
    name: "arrival",
    expected_columns: 11,
    fields: &[
        ("flight", 1),
        ("date", 2),
        ("origin", 3),
        ("ac_reg", 4),
        ("status", 5),
        ("sta", 6),
        ("eta", 7),
        ("ata", 8),
        ("stand", 9),
        ("bag_transfer_status", 10),
    ],
};

/// Transfer manifest child row nested under an arrival
pub const TRANSFER_COLUMNS: ColumnMap = ColumnMap {
    name: "transfer",
    expected_columns: 9,
    fields: &[
        ("outbound_flight", 0),
        ("destination", 1),
        ("ac_reg", 2),
        ("status", 3),
        ("total_bags", 4),
        ("std_etd", 5),
        ("connection_estimate", 6),
        ("gate", 7),
        ("stand", 8),
    ],
};

/// Bulk movement export row
pub const MOVEMENT_COLUMNS: ColumnMap = ColumnMap {
    name: "movement",
    expected_columns: 19,
    fields: &[
        ("flight", 0),
        ("date", 1),
        ("origin", 2),
        ("destination", 3),
        ("ac_reg", 4),
        ("std", 5),
        ("etd", 6),
        ("atd", 7),
        ("takeoff", 8),
        ("touchdown", 9),
        ("sta", 10),
        ("eta", 11),
        ("ata", 12),
        ("dep_delay", 13),
        ("arr_delay", 14),
        ("taxi_out", 15),
        ("taxi_in", 16),
        ("delay_codes", 17),
        ("cancelled", 18),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_maps_validate() {
        ARRIVAL_COLUMNS.validate().unwrap();
        TRANSFER_COLUMNS.validate().unwrap();
        MOVEMENT_COLUMNS.validate().unwrap();
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let map = ColumnMap {
            name: "bad",
            expected_columns: 2,
            fields: &[("a", 0), ("b", 5)],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let map = ColumnMap {
            name: "bad",
            expected_columns: 3,
            fields: &[("a", 0), ("a", 1)],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn index_lookup() {
        assert_eq!(ARRIVAL_COLUMNS.index("flight"), 1);
        assert_eq!(MOVEMENT_COLUMNS.index("cancelled"), 18);
    }

    #[test]
    #[should_panic(expected = "no field")]
    fn unknown_field_panics() {
        ARRIVAL_COLUMNS.index("nonexistent");
    }
}
