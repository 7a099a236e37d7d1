use std::path::Path;

use circle_packer::config::Config;
use circle_packer::{AppState, ColumnSelection, Dataset, Viewport};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

struct Case {
    file: &'static str,
    grouping: &'static [&'static str],
    label: &'static str,
    color: &'static str,
}

// Keep this list explicit so new fixtures must be added intentionally.
const CASES: &[Case] = &[
    Case {
        file: "cities.csv",
        grouping: &["country", "state"],
        label: "city",
        color: "region",
    },
    Case {
        file: "cities.csv",
        grouping: &["region", "country", "state"],
        label: "city",
        color: "country",
    },
    Case {
        file: "teams.csv",
        grouping: &["department", "team"],
        label: "name",
        color: "role",
    },
    Case {
        file: "teams.csv",
        grouping: &[],
        label: "name",
        color: "department",
    },
    Case {
        file: "ragged.csv",
        grouping: &["kind", "group"],
        label: "label",
        color: "kind",
    },
];

fn load(file: &str) -> Dataset {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(file);
    assert!(path.exists(), "fixture missing: {file}");
    Dataset::from_path(&path).expect("fixture read failed")
}

#[test]
fn render_all_fixtures() {
    for case in CASES {
        let dataset = load(case.file);
        let rows = dataset.rows.len();
        let mut app = AppState::new(Config::default());
        app.load_dataset(dataset);

        let selection = ColumnSelection::new(
            case.grouping.iter().map(|column| column.to_string()).collect(),
            case.label,
            case.color,
        );
        let result = app
            .on_render_requested(&selection, Viewport::new(Some(800.0), 900.0))
            .expect("render failed");
        assert_valid_svg(&result.svg, case.file);
        assert_eq!(result.leaf_count, rows, "{}: leaf count", case.file);

        let export = app.on_export_requested().expect("export failed");
        assert_valid_svg(&export.svg, case.file);
        assert!(export.diagram_size >= 1.0, "{}: empty export", case.file);
    }
}

#[test]
fn ragged_rows_attach_where_their_columns_end() {
    let dataset = load("ragged.csv");
    assert_eq!(dataset.rows.len(), 5);

    let tree = circle_packer::build_tree(&dataset.rows, &["kind", "group"]);
    let vegetable = tree.group("vegetable").expect("vegetable group");
    assert_eq!(vegetable.leaf_count(), 2);
    assert_eq!(vegetable.groups().count(), 1);
    assert_eq!(tree.leaf_count(), 5);
}

#[test]
fn blank_grouping_value_forms_its_own_group() {
    let dataset = load("teams.csv");
    let tree = circle_packer::build_tree(&dataset.rows, &["department", "team"]);
    let support = tree.group("Support").expect("support group");
    let unnamed = support.group("").expect("blank team");
    assert_eq!(unnamed.leaf_count(), 2);
}
