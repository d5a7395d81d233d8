/*!
 * Rich Text Content
 * Toolbar vocabulary of the blog editor and the sanitizer derived from it
 */
use std::collections::HashSet;

/// Formatting commands offered by the blog editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    Heading2,
    Heading3,
    Paragraph,
    BulletList,
    NumberedList,
    Link,
    ClearFormatting,
}

impl ToolbarCommand {
    pub const ALL: [ToolbarCommand; 10] = [
        ToolbarCommand::Bold,
        ToolbarCommand::Italic,
        ToolbarCommand::Underline,
        ToolbarCommand::Heading2,
        ToolbarCommand::Heading3,
        ToolbarCommand::Paragraph,
        ToolbarCommand::BulletList,
        ToolbarCommand::NumberedList,
        ToolbarCommand::Link,
        ToolbarCommand::ClearFormatting,
    ];

    /// Elements the browser may emit when the command runs.
    pub fn elements(self) -> &'static [&'static str] {
        match self {
            ToolbarCommand::Bold => &["b", "strong"],
            ToolbarCommand::Italic => &["i", "em"],
            ToolbarCommand::Underline => &["u"],
            ToolbarCommand::Heading2 => &["h2"],
            ToolbarCommand::Heading3 => &["h3"],
            ToolbarCommand::Paragraph => &["p"],
            ToolbarCommand::BulletList => &["ul", "li"],
            ToolbarCommand::NumberedList => &["ol", "li"],
            ToolbarCommand::Link => &["a"],
            ToolbarCommand::ClearFormatting => &[],
        }
    }
}

/// Wrappers contenteditable inserts on its own (line breaks, pasted blocks).
const STRUCTURAL_ELEMENTS: &[&str] = &["p", "br", "div", "span"];

pub fn allowed_elements() -> HashSet<&'static str> {
    ToolbarCommand::ALL
        .iter()
        .flat_map(|cmd| cmd.elements().iter().copied())
        .chain(STRUCTURAL_ELEMENTS.iter().copied())
        .collect()
}

fn sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::empty();
    builder
        .add_tags(allowed_elements())
        .add_tag_attributes("a", &["href", "title"])
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("noopener noreferrer"))
        .clean_content_tags(HashSet::from(["script", "style"]));
    builder
}

/// Strip everything the editor toolbar could not have produced.
pub fn sanitize_content(html: &str) -> String {
    sanitizer().clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_elements_cover_every_command() {
        let allowed = allowed_elements();
        for cmd in ToolbarCommand::ALL {
            for element in cmd.elements() {
                assert!(allowed.contains(element), "{element} missing");
            }
        }
        assert!(!allowed.contains("script"));
        assert!(!allowed.contains("img"));
    }

    #[test]
    fn test_sanitize_keeps_toolbar_markup() {
        let html = "<h2>Title</h2><p><b>bold</b> <em>it</em> <u>u</u></p><ul><li>one</li></ul>";
        assert_eq!(sanitize_content(html), html);
    }

    #[test]
    fn test_sanitize_drops_scripts_with_content() {
        let cleaned = sanitize_content("<p>hi</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>hi</p>");
    }

    #[test]
    fn test_sanitize_strips_event_handlers_and_unsafe_links() {
        let cleaned = sanitize_content(
            r#"<p onclick="x()">a</p><a href="javascript:alert(1)">bad</a><a href="https://example.com">ok</a>"#,
        );
        assert!(!cleaned.contains("onclick"));
        assert!(!cleaned.contains("javascript:"));
        assert!(cleaned.contains(r#"href="https://example.com""#));
        assert!(cleaned.contains(r#"rel="noopener noreferrer""#));
    }

    #[test]
    fn test_sanitize_unwraps_unknown_tags() {
        assert_eq!(sanitize_content("<marquee>move</marquee>"), "move");
    }
}
