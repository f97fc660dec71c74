use std::borrow::Cow;

use super::model::{Column, Table};

/// Name of the column the cycle filter applies to.
pub const CYCLE_COLUMN: &str = "cycle";

/// Rows of `table` belonging to cycle `cycle`, in original order.
///
/// `cycle == 0` means "all cycles": the table is returned as-is, as it is
/// when the table has no `cycle` column.
pub fn cycle_view(table: &Table, cycle: u64) -> Cow<'_, Table> {
    if cycle == 0 {
        return Cow::Borrowed(table);
    }
    let Some(column) = table.column(CYCLE_COLUMN) else {
        return Cow::Borrowed(table);
    };

    let mask: Vec<bool> = match column {
        Column::Integer(v) => v.iter().map(|&c| u64::try_from(c) == Ok(cycle)).collect(),
        Column::Float(v) => v.iter().map(|&c| c == cycle as f64).collect(),
    };
    Cow::Owned(table.retain_rows(&mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_columns([
            ("cycle", Column::Integer(vec![1, 2, 3, 2, 1])),
            ("Ewe", Column::Float(vec![0.0, 0.1, 0.2, 0.3, 0.4])),
        ])
        .unwrap()
    }

    #[test]
    fn zero_returns_everything_borrowed() {
        let t = table();
        let view = cycle_view(&t, 0);
        assert!(matches!(view, Cow::Borrowed(_)));
        assert_eq!(view.num_rows(), 5);
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let t = table();
        let view = cycle_view(&t, 2);
        assert_eq!(view.column("cycle"), Some(&Column::Integer(vec![2, 2])));
        assert_eq!(view.column("Ewe"), Some(&Column::Float(vec![0.1, 0.3])));
    }

    #[test]
    fn unknown_cycle_gives_empty_table_with_same_columns() {
        let t = table();
        let view = cycle_view(&t, 9);
        assert!(view.is_empty());
        assert_eq!(view.column_names(), t.column_names());
    }

    #[test]
    fn tables_without_cycle_column_are_unfiltered() {
        let t = Table::from_columns([("freq", Column::Float(vec![1.0, 2.0]))]).unwrap();
        assert_eq!(cycle_view(&t, 3).num_rows(), 2);
    }

    #[test]
    fn cycle_beyond_i64_matches_nothing() {
        let t = table();
        assert!(cycle_view(&t, u64::MAX).is_empty());
    }
}
