use crate::catalog::entry::{CatalogEntry, OrbitalState};

enum NamePattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(s) => name == *s,
            NamePattern::Prefix(p) => name.starts_with(p),
        }
    }
}

/// Catalog names of marquee objects and the display names they are shown
/// under. Matching entries are flagged special.
const MARQUEE_OBJECTS: &[(NamePattern, &str)] = &[
    (NamePattern::Exact("HST"), "Hubble Space Telescope"),
    (NamePattern::Exact("ISS (ZARYA)"), "International Space Station"),
    (NamePattern::Prefix("STS"), "Space Shuttle"),
    (NamePattern::Exact("NANOSAILD"), "NanoSail-D"),
    (NamePattern::Exact("FASTSAT"), "FastSat"),
];

const CATALOG_LABELS: &[(&str, &str)] = &[
    ("visual.txt", "brightest"),
    ("amateur.txt", "amateur radio"),
    ("iridium.txt", "Iridium Constellation"),
];

/// Display name and special flag for a raw catalog name line.
pub fn normalize_name(raw: &str) -> (String, bool) {
    let name = raw.trim_end_matches(|c: char| c.is_whitespace() || c.is_control());
    MARQUEE_OBJECTS
        .iter()
        .find(|(pattern, _)| pattern.matches(name))
        .map(|(_, display)| (display.to_string(), true))
        .unwrap_or_else(|| (name.to_string(), false))
}

/// Human readable label of a catalog, keyed by its cache filename.
pub fn catalog_label(filename: &str) -> &'static str {
    CATALOG_LABELS
        .iter()
        .find(|(f, _)| *f == filename)
        .map(|(_, label)| *label)
        .unwrap_or("")
}

/// Split file content into record lines, dropping blank lines.
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(String::from)
        .collect()
}

/// Split a raw overlay blob into lines, keeping only non-trivial ones.
pub fn overlay_lines(blob: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(blob)
        .split('\n')
        .filter(|l| l.len() > 1)
        .map(String::from)
        .collect()
}

/// Drop a trailing partial record, then append the overlay records.
pub fn assemble(mut lines: Vec<String>, overlay: Option<Vec<String>>) -> Vec<String> {
    let partial = lines.len() % 3;
    lines.truncate(lines.len() - partial);
    if let Some(overlay) = overlay {
        lines.extend(overlay);
    }
    lines
}

/// Build catalog entries from name/line1/line2 triples.
///
/// Records that fail to parse are skipped. A trailing partial record is
/// ignored.
pub fn load(lines: &[String]) -> Vec<CatalogEntry> {
    lines
        .chunks_exact(3)
        .filter_map(|record| {
            let (name, special) = normalize_name(&record[0]);
            let line1 = record[1].trim_end();
            let line2 = record[2].trim_end();
            let state = match OrbitalState::from_tle(Some(name.clone()), line1, line2) {
                Ok(state) => state,
                Err(e) => {
                    log::debug!("Skipping record {}: {}", name, e);
                    return None;
                }
            };
            // Initial propagation validates the record; errors only count later.
            let _ = state.propagate(0.0);
            Some(CatalogEntry {
                state,
                name,
                special,
                error_count: 0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entry::fixtures::{lines, text, ISS_2008, ISS_2020};
    use rstest::rstest;

    #[rstest]
    #[case("HST", "Hubble Space Telescope", true)]
    #[case("ISS (ZARYA)   \r", "International Space Station", true)]
    #[case("STS-134", "Space Shuttle", true)]
    #[case("NANOSAILD\t", "NanoSail-D", true)]
    #[case("FASTSAT", "FastSat", true)]
    #[case("NOAA 19  \0", "NOAA 19", false)]
    #[case("HST-2", "HST-2", false)]
    fn normalizes_names(#[case] raw: &str, #[case] name: &str, #[case] special: bool) {
        assert_eq!(normalize_name(raw), (name.to_string(), special));
    }

    #[test]
    fn loads_triples() {
        let entries = load(&lines(&[ISS_2008, ISS_2020]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "International Space Station");
        assert!(entries[0].special);
        assert_eq!(entries[1].name, "ZARYA 2020");
        assert!(!entries[1].special);
        assert!(entries.iter().all(|e| e.error_count == 0));
    }

    #[test]
    fn drops_partial_record_before_overlay() {
        let mut raw = lines(&[ISS_2020]);
        raw.push("DANGLING NAME".into());
        let overlay = overlay_lines(text(&[ISS_2008]).as_bytes());
        let assembled = assemble(raw, Some(overlay));
        assert_eq!(assembled.len(), 6);
        let entries = load(&assembled);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "International Space Station");
    }

    #[test]
    fn skips_unparseable_records() {
        let mut raw = lines(&[ISS_2020]);
        raw.extend(["BROKEN".to_string(), "1 nope".into(), "2 nope".into()]);
        raw.extend(lines(&[ISS_2008]));
        let entries = load(&raw);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn split_lines_ignores_blank_lines() {
        let content = format!("\n{}\n\n", text(&[ISS_2020]));
        assert_eq!(split_lines(&content).len(), 3);
    }

    #[test]
    fn labels_known_catalogs() {
        assert_eq!(catalog_label("visual.txt"), "brightest");
        assert_eq!(catalog_label("stations.txt"), "");
    }
}
