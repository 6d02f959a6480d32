//! Shared test workbook: a small two-sheet portfolio.
//!
//! ```text
//! Sheet1  A5 "MSFT Scottrade"  A6 "T"   A7 "Cash"   → last symbol row 6
//!         C1 stamped date      C13 next available row = 20
//!         D10 total  T10 avg age  X10/Y10 avg returns
//!         row 19: last history row, D19 "=(B19-B18)/B18"
//! Sheet2  A5 "VFIAX"           A6 "Cash"
//! ```

use chrono::NaiveDate;

use super::{date_to_serial, CellRef, CellValue, Font, FontColor, LedgerWriter, Workbook};

pub fn cell(a1: &str) -> CellRef {
    a1.parse().unwrap()
}

pub fn portfolio_workbook(stamped: NaiveDate) -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").add_sheet("Sheet2");

    let text = |s: &str| CellValue::Text(s.to_string());
    let num = CellValue::Number;

    let cells = [
        ("Sheet1", "C1", num(date_to_serial(stamped))),
        ("Sheet1", "A5", text("MSFT Scottrade")),
        ("Sheet1", "C5", num(65.10)),
        ("Sheet1", "A6", text("T")),
        ("Sheet1", "A7", text("Cash")),
        ("Sheet1", "D10", num(123456.78)),
        ("Sheet1", "T10", num(3.5)),
        ("Sheet1", "X10", num(0.081)),
        ("Sheet1", "Y10", num(0.074)),
        ("Sheet1", "C13", num(20.0)),
        ("Sheet1", "A19", num(45443.0)),
        ("Sheet1", "B19", num(121000.0)),
        ("Sheet2", "A5", text("VFIAX")),
        ("Sheet2", "A6", text("Cash")),
    ];
    for (sheet, a1, value) in cells {
        wb.write_value(sheet, cell(a1), value).unwrap();
    }

    wb.set_number_format("Sheet1", cell("C1"), "dd-mmm-yy").unwrap();
    wb.write_formula("Sheet1", cell("D19"), "=(B19-B18)/B18").unwrap();
    wb.set_number_format("Sheet1", cell("D19"), "0.00%").unwrap();
    // template emphasis on the next total cell
    wb.set_font("Sheet1", cell("B20"), Font { bold: true, color: FontColor::Indexed(3) }).unwrap();
    wb
}

/// Quote service envelope around `rows` (a JSON array or single object).
pub fn payload(created: &str, rows: &str) -> String {
    format!(
        r#"{{"query":{{"count":0,"created":"{created}","lang":"en-US","results":{{"row":{rows}}}}}}}"#
    )
}
