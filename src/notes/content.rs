use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CoreConfig;
use crate::types::errors::{CoreError, CoreResult};

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\s*(/)?\s*([A-Za-z][A-Za-z0-9:_.-]*)([^<>]*?)(/)?\s*>").expect("valid tag pattern")
});

static UNSAFE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\bon[a-z]+\s*=|javascript\s*:)").expect("valid attribute pattern")
});

/// Checks that markup in user content is well formed and free of active content.
///
/// Runs before any write; a rejected item never reaches the store.
pub fn check_content(content: &str, config: &CoreConfig) -> CoreResult<()> {
    let mut open: Vec<String> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if content[last..whole.start()].contains('<') {
            return Err(CoreError::MalformedContent("stray '<' in content".into()));
        }
        last = whole.end();

        let closing = caps.get(1).is_some();
        let name = caps[2].to_ascii_lowercase();
        let attributes = caps.get(3).map_or("", |m| m.as_str());
        let self_closing = caps.get(4).is_some();

        if config.forbidden_tags.contains(&name) {
            return Err(CoreError::MalformedContent(format!("<{name}> is not allowed")));
        }
        if UNSAFE_ATTRIBUTE.is_match(attributes) {
            return Err(CoreError::MalformedContent(format!(
                "active attribute in <{name}>"
            )));
        }

        if closing {
            match open.pop() {
                Some(expected) if expected == name => {}
                Some(expected) => {
                    return Err(CoreError::MalformedContent(format!(
                        "</{name}> closes <{expected}>"
                    )))
                }
                None => {
                    return Err(CoreError::MalformedContent(format!("</{name}> was never opened")))
                }
            }
        } else if !self_closing {
            open.push(name);
        }
    }

    if content[last..].contains('<') {
        return Err(CoreError::MalformedContent("stray '<' in content".into()));
    }
    if let Some(name) = open.pop() {
        return Err(CoreError::MalformedContent(format!("<{name}> is never closed")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str) -> CoreResult<()> {
        check_content(content, &CoreConfig::v0())
    }

    #[test]
    fn accepts_plain_and_balanced_markup() {
        assert!(check("plain note").is_ok());
        assert!(check("une <b>annotation</b> avec <i>du <u>markup</u></i>").is_ok());
        assert!(check("line<br/>break and a <a href=\"x/y/\">link</a>").is_ok());
        assert!(check("a > b").is_ok());
    }

    #[test]
    fn rejects_unbalanced_markup() {
        assert!(matches!(check("<b>open"), Err(CoreError::MalformedContent(_))));
        assert!(matches!(check("<b><i>x</b></i>"), Err(CoreError::MalformedContent(_))));
        assert!(matches!(check("x</b>"), Err(CoreError::MalformedContent(_))));
        assert!(matches!(check("a < b"), Err(CoreError::MalformedContent(_))));
    }

    #[test]
    fn rejects_active_content() {
        assert!(matches!(check("<script>alert(1)</script>"), Err(CoreError::MalformedContent(_))));
        assert!(matches!(check("<b onclick=\"x()\">y</b>"), Err(CoreError::MalformedContent(_))));
        assert!(matches!(
            check("<a href=\"javascript:x()\">y</a>"),
            Err(CoreError::MalformedContent(_))
        ));
    }
}
