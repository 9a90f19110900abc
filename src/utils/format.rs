//! Bot message texts. Everything user-supplied goes through [`escape_html`]
//! because messages are sent with `parse_mode = HTML`.

pub const START_TEXT: &str = "расчёт резьб";
pub const HELP_TEXT: &str = "Чтобы открыть калькуляторы резьб, используйте команду /start";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Confirmation sent to the user after a calculator posted a verified result.
pub fn result_confirmation(user_name: &str, value: &str) -> String {
    format!(
        "✅ <b>Результат расчёта получен</b>\n\n{}, ваш результат:\n<code>{}</code>",
        escape_html(user_name),
        escape_html(value)
    )
}

/// Echo of data a keyboard-button Mini App sent through the chat.
pub fn web_app_echo(button_text: &str, data: &str) -> String {
    format!(
        "📐 <b>{}</b>\n<pre>{}</pre>",
        escape_html(button_text),
        escape_html(data)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"M8 & M10"</b>"#),
            "&lt;b&gt;&quot;M8 &amp; M10&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("M8x1.25"), "M8x1.25");
    }

    #[test]
    fn confirmation_wraps_value_in_code() {
        let text = result_confirmation("Ann", "d2 = 7.188 <mm>");
        assert!(text.starts_with("✅ <b>"));
        assert!(text.contains("Ann, ваш результат"));
        assert!(text.ends_with("<code>d2 = 7.188 &lt;mm&gt;</code>"));
    }

    #[test]
    fn echo_keeps_button_label() {
        let text = web_app_echo("Metric", r#"{"pitch":1.25}"#);
        assert_eq!(
            text,
            "📐 <b>Metric</b>\n<pre>{&quot;pitch&quot;:1.25}</pre>"
        );
    }
}
