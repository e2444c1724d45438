//! Reminder message rendering.
//!
//! Templates are clinic-authored free text with three placeholders:
//! `{name}`, `{category}` and `{days}`. Anything else passes through
//! untouched, so staff can write in whatever language they like.

use super::DuePair;

pub fn render(pair: &DuePair, reply_contact: Option<&str>) -> String {
    let mut message = pair
        .template
        .replace("{name}", &pair.patient_name)
        .replace("{category}", pair.category.label())
        .replace("{days}", &pair.days_since.to_string());

    if let Some(contact) = reply_contact {
        message.push_str("\n\n");
        message.push_str(contact);
    }
    message
}
