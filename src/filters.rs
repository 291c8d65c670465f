use crate::models::TagReport;

/// Keep only the tag classes whose display name matches (case-insensitive exact match)
pub fn filter_by_tag_class(reports: Vec<TagReport>, name: &str) -> Vec<TagReport> {
    let name_lower = name.to_lowercase();

    reports
        .into_iter()
        .filter(|report| report.display_name().to_lowercase() == name_lower)
        .collect()
}

/// Keep only occurrences in files whose path contains `fragment` (case-insensitive)
pub fn filter_by_file(reports: Vec<TagReport>, fragment: &str) -> Vec<TagReport> {
    let fragment_lower = fragment.to_lowercase();

    reports
        .into_iter()
        .map(|mut report| {
            report.retain_file_reports(|file| {
                file.path()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(&fragment_lower)
            });
            report
        })
        .collect()
}
