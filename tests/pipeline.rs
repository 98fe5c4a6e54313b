mod common;

use std::collections::BTreeSet;

use common::TestWorkspace;
use encoding_rs::UTF_8;
use student_performance::{
    chart::{self, Heatmap},
    data::Cell,
    dataset::Dataset,
    export,
    filter::{AverageRange, Facets, FilterPreset, FilterSet},
    grade::Grade,
    profile::StudentProfile,
    report, stats,
    workbook::{RawTable, Source, Tables},
};

fn load_sample(workspace: &TestWorkspace) -> Dataset {
    let (marks, attendance) = workspace.sample_pair();
    let source = Source::CsvPair {
        marks,
        attendance,
        delimiter: None,
        encoding: UTF_8,
    };
    Dataset::load(&source).expect("load sample pair")
}

fn names(records: impl Iterator<Item = String>) -> Vec<String> {
    records.collect()
}

#[test]
fn joined_table_keeps_every_marks_row_and_fans_out_duplicates() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    assert_eq!(
        dataset.headers(),
        vec![
            "Name",
            "Math",
            "Science",
            "English",
            "Total",
            "Average",
            "Attendance",
            "Grade"
        ]
    );
    assert_eq!(
        names(dataset.records().iter().map(|r| r.name.clone())),
        vec!["Alice", "Bob", "Cara", "Dan", "Eve", "Eve"]
    );
    let eve_attendance = dataset
        .records()
        .iter()
        .filter(|r| r.name == "Eve")
        .map(|r| r.attendance[0].clone())
        .collect::<Vec<_>>();
    assert_eq!(eve_attendance, vec![Cell::from("88"), Cell::from("90")]);

    let cara = &dataset.records()[2];
    assert!(!cara.matched_attendance);
    assert_eq!(cara.attendance, vec![Cell::Empty]);
}

#[test]
fn derived_metrics_and_grades_follow_the_scores() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let records = dataset.records();

    assert_eq!(records[0].total, 51.0);
    assert_eq!(records[0].average, 17.0);
    assert_eq!(records[0].grade, Grade::A);

    // "absent" is coerced to missing and skipped by both Total and Average.
    assert_eq!(records[1].scores, vec![Some(10.0), Some(8.0), None]);
    assert_eq!(records[1].total, 18.0);
    assert_eq!(records[1].average, 9.0);
    assert_eq!(records[1].grade, Grade::C);

    assert_eq!(records[2].grade, Grade::B);

    assert_eq!(records[3].total, 0.0);
    assert!(records[3].average.is_nan());
    assert_eq!(records[3].grade, Grade::Fail);

    assert_eq!(records[4].grade, Grade::A);
}

#[test]
fn default_filters_hide_undefined_averages_only() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    let defaults = FilterSet::defaults_for(&dataset);
    assert_eq!(defaults.average_range, Some(AverageRange::new(9.0, 17.0)));
    assert_eq!(
        defaults.grades,
        BTreeSet::from([Grade::A, Grade::B, Grade::C, Grade::Fail])
    );

    let view = defaults.apply(&dataset);
    assert_eq!(view.len(), 5);
    assert!(view.records().all(|r| r.name != "Dan"));

    let unrestricted = FilterSet::default().apply(&dataset);
    assert_eq!(unrestricted.len(), dataset.len());
}

#[test]
fn filters_combine_search_range_and_grades() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    let filters = FilterSet {
        search: "E".into(),
        average_range: Some(AverageRange::new(14.0, 20.0)),
        grades: BTreeSet::from([Grade::A]),
    };
    let view = filters.apply(&dataset);
    assert_eq!(
        names(view.records().map(|r| r.name.clone())),
        vec!["Alice", "Eve", "Eve"]
    );

    let inverted = FilterSet {
        average_range: Some(AverageRange::new(17.0, 9.0)),
        ..FilterSet::default()
    };
    assert!(inverted.apply(&dataset).is_empty());
}

#[test]
fn preset_file_is_overridden_by_flags() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let preset_path = workspace.write("filters.yaml", "search: e\ngrades: [A]\n");

    let preset = FilterPreset::load(&preset_path).expect("load preset");
    let view = preset.resolve(&dataset).apply(&dataset);
    assert_eq!(view.len(), 3);

    let merged = preset.merge(FilterPreset {
        search: Some("ev".into()),
        ..FilterPreset::default()
    });
    let view = merged.resolve(&dataset).apply(&dataset);
    assert_eq!(names(view.records().map(|r| r.name.clone())), vec!["Eve", "Eve"]);
}

#[test]
fn preset_rejects_unknown_fields() {
    let workspace = TestWorkspace::new();
    let preset_path = workspace.write("filters.yaml", "serch: typo\n");
    let err = FilterPreset::load(&preset_path).unwrap_err();
    assert!(format!("{err:#}").contains("Parsing filter preset"));
}

#[test]
fn summary_statistics_cover_score_columns_of_the_view() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let view = FilterSet::defaults_for(&dataset).apply(&dataset);

    let summaries = stats::summarize(&view);
    let columns = summaries.iter().map(|s| s.column.as_str()).collect::<Vec<_>>();
    assert_eq!(columns, vec!["Math", "Science", "English"]);

    let math = &summaries[0];
    assert_eq!(math.count, 5);
    assert_eq!(math.mean, Some(14.0));
    assert_eq!(math.min, Some(10.0));
    assert_eq!(math.median, Some(15.0));
    assert_eq!(math.max, Some(18.0));
    assert_eq!(summaries[2].count, 4);
}

#[test]
fn top_students_rank_by_total_with_stable_ties() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let view = FilterSet::defaults_for(&dataset).apply(&dataset);

    let top = report::top_n(&view, 3);
    let ranked = top
        .iter()
        .map(|r| (r.name.as_str(), r.attendance[0].to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        ranked,
        vec![
            ("Alice", "95".to_string()),
            ("Eve", "88".to_string()),
            ("Eve", "90".to_string())
        ]
    );
    assert_eq!(report::top_n(&view, 50).len(), view.len());
}

#[test]
fn report_lists_the_three_sections() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let view = FilterSet::defaults_for(&dataset).apply(&dataset);

    let rendered = report::render_report(&view, report::DEFAULT_TOP_N);
    assert!(rendered.starts_with("Filtered dataset (5 of 6 rows)"));
    assert!(rendered.contains("\nSummary statistics\n"));
    assert!(rendered.contains("\nTop 5 students by Total\n"));
}

#[test]
fn export_matches_the_filtered_view() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let filters = FilterSet {
        grades: BTreeSet::from([Grade::Fail, Grade::C]),
        ..FilterSet::default()
    };
    let view = filters.apply(&dataset);

    let bytes = export::to_csv_bytes(&view).expect("export bytes");
    let text = String::from_utf8(bytes).expect("utf-8 export");
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            r#""Name","Math","Science","English","Total","Average","Attendance","Grade""#,
            r#""Bob","10","8","","18","9","70","C""#,
            r#""Dan","","","","0","","","Fail""#,
        ]
    );
}

#[test]
fn heatmap_covers_scores_derived_and_attendance_columns() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    let full = FilterSet::defaults_for(&dataset).apply(&dataset);
    let Heatmap::Matrix(matrix) = chart::correlation_heatmap(&full) else {
        panic!("expected a correlation matrix");
    };
    assert!(matrix.columns.contains(&"Attendance".to_string()));
    assert!(!matrix.columns.contains(&"Grade".to_string()));
    let diagonal = matrix.get("Math", "Math").expect("defined diagonal");
    assert!((diagonal - 1.0).abs() < 1e-12);

    let nobody = FilterSet {
        search: "zzz".into(),
        ..FilterSet::default()
    }
    .apply(&dataset);
    let Heatmap::Matrix(empty) = chart::correlation_heatmap(&nobody) else {
        panic!("derived columns stay numeric in an empty view");
    };
    assert_eq!(empty.columns, vec!["Math", "Science", "English", "Total", "Average"]);
    assert!(empty.values.iter().flatten().all(Option::is_none));
}

#[test]
fn bar_series_orders_totals_descending() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let view = FilterSet::defaults_for(&dataset).apply(&dataset);

    let series = chart::bar_total(&view);
    let totals = series.bars.iter().map(|bar| bar.value).collect::<Vec<_>>();
    assert_eq!(totals, vec![51.0, 45.0, 45.0, 36.0, 18.0]);
    assert_eq!(series.label_column, "Name");
}

#[test]
fn profile_reports_first_occurrence() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    let profile = StudentProfile::lookup(&dataset, "Eve").expect("Eve exists");
    assert_eq!(profile.duplicates_ignored, 1);
    assert_eq!(profile.attendance, Some(Cell::from("88")));
    let rendered = profile.render();
    assert!(rendered.contains("Average Score: 15.00"));
    assert!(rendered.contains("Attendance: 88%"));
}

#[test]
fn facets_list_choices_in_first_appearance_order() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);

    let facets = Facets::from_dataset(&dataset);
    assert_eq!(facets.grades, vec![Grade::A, Grade::C, Grade::B, Grade::Fail]);
    assert_eq!(facets.students, vec!["Alice", "Bob", "Cara", "Dan", "Eve"]);
}

#[test]
fn attendance_without_the_join_column_is_rejected() {
    let tables = Tables {
        marks: RawTable {
            name: "Marks".into(),
            headers: vec!["Name".into(), "Math".into()],
            rows: vec![vec![Cell::from("Alice"), Cell::Number(12.0)]],
        },
        attendance: RawTable {
            name: "Attendance".into(),
            headers: vec!["Student".into(), "Attendance".into()],
            rows: Vec::new(),
        },
    };
    let err = Dataset::from_tables(tables).unwrap_err();
    assert!(
        format!("{err:#}").contains("table 'Attendance' has no 'Name' column to join on")
    );
}

#[test]
fn corrupt_upload_bytes_fail_to_load() {
    let err = Dataset::from_workbook_bytes(b"not a workbook".to_vec(), &Default::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("Opening uploaded workbook"));
}

#[test]
fn score_columns_named_like_derived_columns_survive_export() {
    let workspace = TestWorkspace::new();
    let marks = workspace.write("marks.csv", "Name,Quiz,Total\nAnn,10,40\n");
    let attendance = workspace.write("attendance.csv", "Name,Attendance\n");
    let dataset = Dataset::load(&Source::CsvPair {
        marks,
        attendance,
        delimiter: None,
        encoding: UTF_8,
    })
    .expect("load clashing headers");

    let bytes = export::to_csv_bytes(&dataset.view_all()).expect("export bytes");
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    assert_eq!(
        headers,
        vec!["Name", "Quiz", "marks_Total", "Total", "Average", "Attendance", "Grade"]
    );
    let unique = headers.iter().collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), headers.len());

    let rows = reader
        .records()
        .map(|record| record.expect("record"))
        .collect::<Vec<_>>();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].iter().collect::<Vec<_>>(),
        vec!["Ann", "10", "40", "50", "25", "", "A"]
    );
}

#[test]
fn preset_grades_accept_any_letter_case() {
    let workspace = TestWorkspace::new();
    let dataset = load_sample(&workspace);
    let preset_path = workspace.write("filters.yaml", "grades: [fail, c]\n");

    let preset = FilterPreset::load(&preset_path).expect("load preset");
    assert_eq!(preset.grades, vec![Grade::Fail, Grade::C]);
    let view = FilterSet {
        grades: preset.grades.iter().copied().collect(),
        ..FilterSet::default()
    }
    .apply(&dataset);
    assert_eq!(names(view.records().map(|r| r.name.clone())), vec!["Bob", "Dan"]);
}
