//! Guest list export as delimited text.
//!
//! The plain style joins raw field values with `,` and does no quoting, so a
//! value containing a comma or newline shifts columns in the output. The
//! quoted style applies RFC 4180 quoting to such fields and is opt-in.

use shared::domain::RegistrationRecord;

pub const GUEST_LIST_HEADERS: [&str; 4] = ["Name", "Email", "Phone", "Family Side"];
pub const GUEST_LIST_FILE_NAME: &str = "Wedding_Guest_List.csv";

const DELIMITER: char = ',';
const LINE_SEPARATOR: char = '\n';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvStyle {
    #[default]
    Plain,
    Quoted,
}

/// Header line followed by one `name,email,phone,family_side` line per record,
/// separated by `\n` with no trailing newline.
pub fn guest_list_csv(headers: &[&str], records: &[RegistrationRecord], style: CsvStyle) -> String {
    let mut out = String::new();
    push_line(&mut out, headers.iter().copied(), style);
    for record in records {
        out.push(LINE_SEPARATOR);
        push_line(
            &mut out,
            [
                record.name.as_str(),
                record.email.as_str(),
                record.phone.as_str(),
                record.side_label(),
            ],
            style,
        );
    }
    out
}

fn push_line<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>, style: CsvStyle) {
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(DELIMITER);
        }
        match style {
            CsvStyle::Plain => out.push_str(field),
            CsvStyle::Quoted => push_quoted(out, field),
        }
    }
}

fn push_quoted(out: &mut String, field: &str) {
    let needs_quotes = field.contains([DELIMITER, '"', '\r', LINE_SEPARATOR]);
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
}
