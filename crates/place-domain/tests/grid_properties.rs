#![expect(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

//! Property tests for the grid write/read contract.

use place_domain::CellCoord;
use place_domain::GRID_SIZE;
use place_domain::Grid;
use place_domain::GridError;
use proptest::prelude::*;

const SIZE: i64 = GRID_SIZE as i64;

fn arb_color() -> impl Strategy<Value = String> {
    prop_oneof![
        "#[0-9a-f]{6}",
        ".{0,12}",
    ]
}

fn arb_out_of_range() -> impl Strategy<Value = (i64, i64)> {
    prop_oneof![
        (i64::MIN..0, any::<i64>()),
        (SIZE..i64::MAX, any::<i64>()),
        (any::<i64>(), i64::MIN..0),
        (any::<i64>(), SIZE..i64::MAX),
    ]
}

fn painted_grid() -> impl Strategy<Value = Grid> {
    prop::collection::vec((0..SIZE, 0..SIZE, arb_color()), 0..30).prop_map(|writes| {
        let mut grid = Grid::new();
        for (row, col, color) in writes {
            grid.paint(CellCoord::try_new(row, col).unwrap(), color);
        }
        grid
    })
}

proptest! {
    #[test]
    fn valid_write_changes_only_target_cell(
        grid in painted_grid(),
        row in 0..SIZE,
        col in 0..SIZE,
        color in arb_color(),
    ) {
        let before = grid.clone();
        let mut after = grid;
        let target = CellCoord::try_new(row, col).unwrap();
        after.paint(target, color.clone());

        prop_assert_eq!(after.get(target).as_str(), color.as_str());
        for r in 0..SIZE {
            for c in 0..SIZE {
                let coord = CellCoord::try_new(r, c).unwrap();
                if coord != target {
                    prop_assert_eq!(after.get(coord), before.get(coord));
                }
            }
        }
    }

    #[test]
    fn out_of_range_coordinates_are_rejected((row, col) in arb_out_of_range()) {
        prop_assert_eq!(
            CellCoord::try_new(row, col),
            Err(GridError::InvalidCoordinates { row, col })
        );
    }
}

#[test]
fn untouched_grid_is_all_white() {
    let grid = Grid::new();
    let json = serde_json::to_value(&grid).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), GRID_SIZE);
    for row in rows {
        let row = row.as_array().unwrap();
        assert_eq!(row.len(), GRID_SIZE);
        assert!(row.iter().all(|cell| cell == "#ffffff"));
    }
}
