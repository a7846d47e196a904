//! Template Personalization
//!
//! Case-insensitive placeholder substitution. `{name}` takes the
//! recipient's display name, `{phone}` their number, `{date}`/`{time}`
//! the send moment. Placeholder text is substituted literally, never
//! interpreted.

use chrono::{DateTime, Local};
use regex::{NoExpand, Regex};
use shared::models::Recipient;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\{name\}").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\{phone\}").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\{date\}").unwrap());
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\{time\}").unwrap());

/// Render a template for one recipient at the current moment.
///
/// When personalization is off, or the recipient has no usable name,
/// `{name}` placeholders are left in the text untouched.
pub fn render(template: &str, recipient: &Recipient, personalize: bool) -> String {
    render_at(template, recipient, personalize, Local::now())
}

fn render_at(
    template: &str,
    recipient: &Recipient,
    personalize: bool,
    when: DateTime<Local>,
) -> String {
    let mut out = PHONE_RE
        .replace_all(template, NoExpand(&recipient.phone))
        .into_owned();
    out = DATE_RE
        .replace_all(&out, NoExpand(&when.format("%d/%m/%Y").to_string()))
        .into_owned();
    out = TIME_RE
        .replace_all(&out, NoExpand(&when.format("%H:%M").to_string()))
        .into_owned();
    if personalize
        && let Some(name) = usable_name(recipient)
    {
        out = NAME_RE.replace_all(&out, NoExpand(name)).into_owned();
    }
    out
}

fn usable_name(recipient: &Recipient) -> Option<&str> {
    match recipient.display_name.as_deref() {
        Some(name) if !name.trim().is_empty() && name != "Unknown" => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(phone: &str, name: Option<&str>) -> Recipient {
        Recipient {
            phone: phone.to_string(),
            display_name: name.map(String::from),
        }
    }

    #[test]
    fn substitutes_name_case_insensitively() {
        let r = recipient("+255700000001", Some("Amina"));
        assert_eq!(render("Hi {name}!", &r, true), "Hi Amina!");
        assert_eq!(render("Hi {NAME}!", &r, true), "Hi Amina!");
        assert_eq!(render("Hi {Name}!", &r, true), "Hi Amina!");
    }

    #[test]
    fn leaves_placeholder_when_name_missing() {
        let r = recipient("+255700000001", None);
        assert_eq!(render("Hi {name}!", &r, true), "Hi {name}!");
    }

    #[test]
    fn unknown_name_is_not_usable() {
        let r = recipient("+255700000001", Some("Unknown"));
        assert_eq!(render("Hi {name}!", &r, true), "Hi {name}!");
    }

    #[test]
    fn personalize_flag_gates_name_substitution() {
        let r = recipient("+255700000001", Some("Amina"));
        assert_eq!(render("Hi {name}!", &r, false), "Hi {name}!");
    }

    #[test]
    fn substitutes_phone_regardless_of_flag() {
        let r = recipient("+255700000001", None);
        assert_eq!(
            render("Reply to {phone}", &r, false),
            "Reply to +255700000001"
        );
    }

    #[test]
    fn name_containing_dollar_is_literal() {
        let r = recipient("+255700000001", Some("A$ap"));
        assert_eq!(render("Hi {name}!", &r, true), "Hi A$ap!");
    }

    #[test]
    fn date_and_time_use_the_send_moment() {
        use chrono::TimeZone;

        let r = recipient("+255700000001", None);
        let when = Local.with_ymd_and_hms(2026, 8, 29, 14, 5, 0).unwrap();
        assert_eq!(
            render_at("Leo {date} saa {TIME}", &r, true, when),
            "Leo 29/08/2026 saa 14:05"
        );
    }

    #[test]
    fn multiple_placeholders_all_replaced() {
        let r = recipient("+255700000001", Some("Amina"));
        assert_eq!(
            render("{name} {name} {phone}", &r, true),
            "Amina Amina +255700000001"
        );
    }
}
