use crate::config::EventDetails;

pub const INVITATION_FILE_NAME: &str = "Wedding_Invitation.txt";

/// Printable text version of the invitation card.
pub fn invitation_text(event: &EventDetails) -> String {
    let lines = [
        "Wedding Invitation",
        "",
        event.couple.as_str(),
        "Request the pleasure of your presence",
        "",
        event.date_label.as_str(),
        event.theme_line.as_str(),
    ];
    let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for line in lines {
        let pad = (width - line.chars().count()) / 2;
        out.push_str(&" ".repeat(pad));
        out.push_str(line);
        out.push('\n');
    }
    out
}
