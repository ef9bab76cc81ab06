//! Tests for CSV parsing, labelling, union merging and serialisation.

use super::*;
use rstest::{fixture, rstest};

#[fixture]
fn january() -> Table {
    Table::parse_csv("id,val\n1,10\n2,20\n").expect("january parses")
}

#[fixture]
fn february() -> Table {
    Table::parse_csv("id,val\n3,30\n").expect("february parses")
}

fn csv_text(table: &Table) -> String {
    let bytes = table.to_csv_bytes().expect("serialises");
    let body = bytes.strip_prefix(UTF8_BOM).expect("BOM prefix");
    String::from_utf8(body.to_vec()).expect("UTF-8 output")
}

#[rstest]
fn parses_header_and_integer_columns(january: Table) {
    assert_eq!(january.columns(), ["id", "val"]);
    assert_eq!(january.row_count(), 2);
    assert_eq!(january.cell(1, "val"), Some(&CellValue::Integer(20)));
}

#[rstest]
#[case("x\n1.5\n2\n", CellValue::Float(2.0))]
#[case("x\n1\nabc\n", CellValue::Text("abc".to_owned()))]
#[case("x\n1\nNA\n", CellValue::Null)]
#[case("x\n1\n\"\"\n", CellValue::Null)]
fn infers_column_kinds(#[case] text: &str, #[case] expected_second: CellValue) {
    let table = Table::parse_csv(text).expect("parses");
    assert_eq!(table.cell(1, "x"), Some(&expected_second));
}

#[test]
fn mixed_columns_keep_original_text() {
    let table = Table::parse_csv("x\n007\nabc\n").expect("parses");
    assert_eq!(table.cell(0, "x"), Some(&CellValue::Text("007".to_owned())));
}

#[rstest]
#[case::beyond_i64("order_id\n12345678901234567890\n98765432109876543210123\n")]
#[case::mixed_with_small("order_id\n7\n-98765432109876543210123\n")]
#[case::mixed_with_float("order_id\n1.5\n12345678901234567890\n")]
fn oversized_integers_keep_every_digit(#[case] text: &str) {
    let table = Table::parse_csv(text).expect("parses");

    assert!(
        table
            .rows()
            .iter()
            .all(|row| matches!(row[0], CellValue::Text(_))),
        "column should fall back to text"
    );
    assert_eq!(csv_text(&table), text);
}

#[test]
fn header_only_file_yields_zero_rows() {
    let table = Table::parse_csv("a,b\n").expect("parses");
    assert_eq!(table.columns(), ["a", "b"]);
    assert_eq!(table.row_count(), 0);
}

#[rstest]
#[case("")]
#[case("\n\n")]
fn empty_files_are_rejected(#[case] text: &str) {
    assert_eq!(Table::parse_csv(text), Err(TableParseError::Empty));
}

#[test]
fn long_rows_are_rejected() {
    let error = Table::parse_csv("a,b\n1,2\n1,2,3\n").expect_err("ragged");
    assert_eq!(
        error,
        TableParseError::RaggedRow {
            line: 3,
            expected: 2,
            found: 3,
        }
    );
}

#[test]
fn short_rows_are_padded_with_nulls() {
    let table = Table::parse_csv("a,b\n1\n").expect("parses");
    assert_eq!(table.cell(0, "b"), Some(&CellValue::Null));
}

#[test]
fn blank_lines_are_skipped() {
    let table = Table::parse_csv("\na,b\n\n1,2\n\n").expect("parses");
    assert_eq!(table.columns(), ["a", "b"]);
    assert_eq!(table.row_count(), 1);
}

#[test]
fn duplicate_and_blank_headers_are_renamed() {
    let table = Table::new(["a", "a", "", "a"]);
    assert_eq!(table.columns(), ["a", "a.1", "Unnamed: 2", "a.2"]);
}

#[rstest]
fn labelling_appends_constant_column(january: Table) {
    let labeled = january.labeled("日期", "jan");
    assert_eq!(labeled.columns(), ["id", "val", "日期"]);
    assert_eq!(labeled.cell(1, "日期"), Some(&CellValue::from("jan")));
}

#[test]
fn labelling_overwrites_existing_column_in_place() {
    let table = Table::parse_csv("日期,val\n2024-01-01,1\n")
        .expect("parses")
        .labeled("日期", "jan");
    assert_eq!(table.columns(), ["日期", "val"]);
    assert_eq!(table.cell(0, "日期"), Some(&CellValue::from("jan")));
}

#[rstest]
fn concat_keeps_input_order(january: Table, february: Table) {
    let merged = Table::concat(vec![
        january.labeled("日期", "jan"),
        february.labeled("日期", "feb"),
    ]);
    assert_eq!(
        csv_text(&merged),
        "id,val,日期\n1,10,jan\n2,20,jan\n3,30,feb\n"
    );
}

#[test]
fn concat_unions_disjoint_columns() {
    let first = Table::parse_csv("a\n1\n").expect("parses");
    let second = Table::parse_csv("b\n2\n").expect("parses");
    let merged = Table::concat(vec![first, second]);
    assert_eq!(merged.columns(), ["a", "b"]);
    assert_eq!(csv_text(&merged), "a,b\n1,\n,2\n");
}

#[test]
fn serialisation_quotes_only_when_needed() {
    let mut table = Table::new(["note"]);
    table
        .push_row(vec![CellValue::from("hello, world")])
        .expect("width matches");
    table
        .push_row(vec![CellValue::from("plain")])
        .expect("width matches");
    assert_eq!(csv_text(&table), "note\n\"hello, world\"\nplain\n");
}

#[test]
fn push_row_enforces_width() {
    let mut table = Table::new(["a", "b"]);
    let error = table
        .push_row(vec![CellValue::Null])
        .expect_err("too narrow");
    assert_eq!(
        error,
        RowWidthError {
            expected: 2,
            found: 1,
        }
    );
}

#[rstest]
#[case(CellValue::Float(2.0), "2.0")]
#[case(CellValue::Float(2.5), "2.5")]
#[case(CellValue::Integer(-4), "-4")]
#[case(CellValue::Null, "")]
fn renders_cells(#[case] cell: CellValue, #[case] expected: &str) {
    assert_eq!(cell.render(), expected);
}
