//! Numeric coercion of measurement value columns.
//!
//! Columns following the value-suffix convention are converted to numbers
//! only when every present cell parses. A single failing cell keeps the whole
//! column as text so that qualifier strings such as `<1.0` are never lost.

use crate::conventions::NamingConventions;
use crate::models::{ColumnValues, Diagnostic, Table};
use crate::reader::parse_number;
use tracing::{debug, warn};

/// Convert every text value column whose cells are all numeric.
///
/// Returns the number of columns converted.
pub fn coerce_value_columns(
    table: &mut Table,
    conventions: &NamingConventions,
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    let mut converted = 0;

    for column in table.columns_mut() {
        if !conventions.is_value_column(column.name()) {
            continue;
        }
        let ColumnValues::Text(cells) = column.values() else {
            continue;
        };

        match coerce_cells(cells) {
            Ok(values) => {
                *column.values_mut() = ColumnValues::Numeric(values);
                converted += 1;
            }
            Err((failed, example)) => {
                warn!(
                    "Column '{}' kept as text: {} non-numeric cells (e.g. '{}')",
                    column.name(),
                    failed,
                    example
                );
                diagnostics.push(Diagnostic::NumericCoercionFailure {
                    column: column.name().to_string(),
                    failed,
                    example,
                });
            }
        }
    }

    debug!("Coerced {} value columns to numeric", converted);
    converted
}

/// All-or-nothing parse; on failure returns the failure count and the first
/// offending cell
fn coerce_cells(cells: &[Option<String>]) -> Result<Vec<Option<f64>>, (usize, String)> {
    let mut values = Vec::with_capacity(cells.len());
    let mut failed = 0;
    let mut example = None;

    for cell in cells {
        match cell.as_deref() {
            None => values.push(None),
            Some(text) => match parse_number(text) {
                Some(value) => values.push(Some(value)),
                None => {
                    failed += 1;
                    example.get_or_insert_with(|| text.to_string());
                }
            },
        }
    }

    match example {
        None => Ok(values),
        Some(example) => Err((failed, example)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::RDB1_CONVENTIONS;
    use crate::models::{Column, ColumnKind};

    fn text(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn test_numeric_value_column_converted() {
        let mut table = Table::from_columns(
            3,
            vec![Column::text(
                "result_va",
                text(&[Some("1.2"), None, Some("-3e2")]),
            )],
        )
        .unwrap();
        let mut diagnostics = Vec::new();

        let converted = coerce_value_columns(&mut table, &RDB1_CONVENTIONS, &mut diagnostics);

        assert_eq!(converted, 1);
        assert!(diagnostics.is_empty());
        assert_eq!(
            table.column("result_va").unwrap().as_numeric().unwrap(),
            &[Some(1.2), None, Some(-300.0)]
        );
    }

    #[test]
    fn test_qualified_value_keeps_column_as_text() {
        let cells = text(&[Some("1.2"), Some("3.4"), Some("<1.0")]);
        let mut table =
            Table::from_columns(3, vec![Column::text("result_va", cells.clone())]).unwrap();
        let mut diagnostics = Vec::new();

        coerce_value_columns(&mut table, &RDB1_CONVENTIONS, &mut diagnostics);

        let column = table.column("result_va").unwrap();
        assert_eq!(column.kind(), ColumnKind::Text);
        assert_eq!(column.as_text().unwrap(), cells.as_slice());
        match &diagnostics[0] {
            Diagnostic::NumericCoercionFailure {
                column,
                failed,
                example,
            } => {
                assert_eq!(column, "result_va");
                assert_eq!(*failed, 1);
                assert_eq!(example, "<1.0");
            }
            other => panic!("Expected NumericCoercionFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_other_columns_untouched() {
        let mut table = Table::from_columns(
            1,
            vec![
                Column::text("site_no", text(&[Some("01646500")])),
                Column::numeric("flow_va", vec![Some(2.0)]),
            ],
        )
        .unwrap();
        let mut diagnostics = Vec::new();

        let converted = coerce_value_columns(&mut table, &RDB1_CONVENTIONS, &mut diagnostics);

        assert_eq!(converted, 0);
        assert_eq!(table.column("site_no").unwrap().kind(), ColumnKind::Text);
        assert!(diagnostics.is_empty());
    }
}
