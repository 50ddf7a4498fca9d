use super::batch::Batch;
use super::provider::ProviderKind;

/// Render a batch as SSML with a `<mark/>` before every unit.
///
/// Polly takes speed as a prosody rate wrapping the whole body; Google gets
/// it as a request parameter instead.
pub fn build(batch: &Batch, provider: ProviderKind) -> String {
    if batch.units.is_empty() {
        return "<speak></speak>".to_string();
    }

    let body = batch
        .units
        .iter()
        .map(|unit| {
            format!(
                "<mark name=\"{}\"/>{}",
                escape_xml(&unit.mark_name),
                escape_xml(&unit.rendered_text)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    match provider {
        ProviderKind::Polly => format!(
            "<speak><prosody rate=\"{}\">{}</prosody></speak>",
            rate_percentage(batch.speed),
            body
        ),
        ProviderKind::Google => format!("<speak>{}</speak>", body),
    }
}

/// `0.7` -> `"70%"`.
pub fn rate_percentage(speed: f64) -> String {
    format!("{}%", (speed * 100.0).round() as i64)
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
