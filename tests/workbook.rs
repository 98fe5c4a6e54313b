mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::str::contains;
use rust_xlsxwriter::Workbook;
use student_performance::{
    data::Cell,
    dataset::Dataset,
    grade::Grade,
    workbook::SheetNames,
};

fn add_sheet(workbook: &mut Workbook, name: &str, rows: &[Vec<Cell>]) {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name).expect("sheet name");
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (row_idx, col_idx) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(row_idx, col_idx, text.as_str()).expect("write text");
                }
                Cell::Number(value) => {
                    sheet.write_number(row_idx, col_idx, *value).expect("write number");
                }
                Cell::Boolean(value) => {
                    sheet.write_boolean(row_idx, col_idx, *value).expect("write boolean");
                }
                Cell::Empty => {}
            }
        }
    }
}

fn marks_rows() -> Vec<Vec<Cell>> {
    vec![
        vec![Cell::from(" Name"), Cell::from("Math "), Cell::from("Sci")],
        vec![Cell::from("Alice"), Cell::Number(18.0), Cell::Number(16.0)],
        vec![Cell::from("Bob"), Cell::Number(10.0), Cell::from("absent")],
    ]
}

fn attendance_rows() -> Vec<Vec<Cell>> {
    vec![
        vec![Cell::from("Name"), Cell::from("Attendance")],
        vec![Cell::from("Alice"), Cell::Number(95.0)],
    ]
}

fn workbook_bytes(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        add_sheet(&mut workbook, name, rows);
    }
    workbook.save_to_buffer().expect("save workbook")
}

#[test]
fn workbook_upload_runs_the_whole_pipeline() {
    let bytes = workbook_bytes(&[
        ("Marks", marks_rows()),
        ("Attendance", attendance_rows()),
    ]);
    let dataset =
        Dataset::from_workbook_bytes(bytes, &SheetNames::default()).expect("load workbook");

    assert_eq!(
        dataset.headers(),
        vec!["Name", "Math", "Sci", "Total", "Average", "Attendance", "Grade"]
    );
    let alice = &dataset.records()[0];
    assert_eq!((alice.total, alice.average, alice.grade), (34.0, 17.0, Grade::A));
    assert_eq!(alice.attendance, vec![Cell::Number(95.0)]);

    let bob = &dataset.records()[1];
    assert_eq!(bob.scores, vec![Some(10.0), None]);
    assert_eq!((bob.total, bob.average, bob.grade), (10.0, 10.0, Grade::C));
    assert_eq!(bob.attendance, vec![Cell::Empty]);
    assert!(!bob.matched_attendance);
}

#[test]
fn workbook_without_attendance_sheet_is_rejected() {
    let bytes = workbook_bytes(&[("Marks", marks_rows())]);
    let err = Dataset::from_workbook_bytes(bytes, &SheetNames::default()).unwrap_err();
    assert!(
        format!("{err:#}").contains("sheet 'Attendance' not found (available sheets: Marks)")
    );
}

#[test]
fn report_reads_a_workbook_file_with_custom_sheet_names() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("class.xlsx");
    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "Scores", &marks_rows());
    add_sheet(&mut workbook, "Presence", &attendance_rows());
    workbook.save(&path).expect("save workbook");

    Command::cargo_bin("student-performance")
        .expect("binary exists")
        .args([
            "report",
            "-i",
            path.to_str().unwrap(),
            "--marks-sheet",
            "Scores",
            "--attendance-sheet",
            "Presence",
        ])
        .assert()
        .success()
        .stdout(contains("Filtered dataset (2 of 2 rows)"))
        .stdout(contains("Top 5 students by Total"));
}

#[test]
fn report_fails_when_the_marks_sheet_is_missing() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("class.xlsx");
    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "Attendance", &attendance_rows());
    workbook.save(&path).expect("save workbook");

    Command::cargo_bin("student-performance")
        .expect("binary exists")
        .args(["report", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("sheet 'Marks' not found"));
}
