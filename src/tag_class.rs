use crate::models::TagReport;
use crate::tags::{Locale, Tag, TagMatch};

/// A named group of tags sharing one report.
///
/// This lets a display name such as "Action Items" cover several tag rules,
/// e.g. an exact `TODO` plus a case-insensitive `fixme`.
#[derive(Debug, Clone)]
pub struct TagClass {
    display_name: String,
    link_id: String,
    tags: Vec<Tag>,
    report: TagReport,
}

/// A successful [`TagClass::try_match`]: which tag matched and where
#[derive(Debug, Clone, Copy)]
pub struct ClassMatch<'a> {
    pub tag: &'a Tag,
    pub index: usize,
    pub length: usize,
}

impl ClassMatch<'_> {
    /// Byte offset just past the matched tag text
    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Literal string of the tag that matched
    pub fn tag_string(&self) -> &str {
        self.tag.tag_string()
    }
}

impl TagClass {
    /// Create an empty tag class. `link_id` must be unique among the classes of one scan.
    pub fn new(display_name: impl Into<String>, link_id: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let link_id = link_id.into();
        let report = TagReport::new(display_name.clone(), link_id.clone());

        Self {
            display_name,
            link_id,
            tags: Vec::new(),
            report,
        }
    }

    /// Append a tag; tags are tried in the order they were added
    pub fn add_tag(&mut self, tag: Tag) {
        self.report.add_tag_string(tag.tag_string());
        self.tags.push(tag);
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.add_tag(tag);
        self
    }

    /// First tag of this class found in `line`, in registration order
    pub fn try_match(&self, line: &str, locale: &Locale) -> Option<ClassMatch<'_>> {
        self.tags.iter().find_map(|tag| {
            tag.find(line, locale)
                .map(|TagMatch { index, length }| ClassMatch { tag, index, length })
        })
    }

    /// True if `text` begins with any tag of this class
    pub fn starts_with_any(&self, text: &str, locale: &Locale) -> bool {
        self.tags.iter().any(|tag| tag.starts_with(text, locale))
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn report(&self) -> &TagReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut TagReport {
        &mut self.report
    }

    pub fn into_report(self) -> TagReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::MatchKind;

    fn action_items() -> TagClass {
        TagClass::new("Action Items", "tag_class_1")
            .with_tag(Tag::new(MatchKind::Exact, "TODO").unwrap())
            .with_tag(Tag::new(MatchKind::RegEx, "fixme[0-9]+").unwrap())
    }

    #[test]
    fn test_first_registered_tag_wins() {
        let class = action_items();
        let locale = Locale::english();

        let found = class.try_match("// fixme12 and TODO", &locale).unwrap();
        assert_eq!(found.tag_string(), "TODO");
        assert_eq!(found.index, 15);
        assert_eq!(found.length, 4);
    }

    #[test]
    fn test_match_reports_regex_length() {
        let class = action_items();
        let found = class.try_match("// fixme123: soon", &Locale::english()).unwrap();

        assert_eq!(found.tag_string(), "fixme[0-9]+");
        assert_eq!(found.index, 3);
        assert_eq!(found.length, 8);
        assert_eq!(found.end(), 11);
    }

    #[test]
    fn test_no_match() {
        let class = action_items();
        assert!(class.try_match("// nothing here", &Locale::english()).is_none());
    }

    #[test]
    fn test_starts_with_any() {
        let class = action_items();
        let locale = Locale::english();

        assert!(class.starts_with_any("TODO next", &locale));
        assert!(class.starts_with_any("fixme7 next", &locale));
        assert!(!class.starts_with_any("see TODO", &locale));
    }

    #[test]
    fn test_tag_strings_are_recorded_on_report() {
        let class = action_items();
        assert_eq!(class.report().tag_strings(), ["TODO", "fixme[0-9]+"]);
        assert_eq!(class.report().display_name(), "Action Items");
        assert_eq!(class.report().link_id(), "tag_class_1");
    }
}
