//! # Field Extractors
//!
//! Pure functions that derive normalized sub-fields from the free text the
//! feeds give us:
//!
//! - `extract_country`: location text → ISO-style country code, via a lookup
//!   table of country names/abbreviations and remote-class synonyms, with a
//!   "City, Region" fallback that resolves the region through the same table
//!   and then through first-level subdivisions (US states, Canadian
//!   provinces). Unresolvable text passes through unchanged — never empty,
//!   never an error.
//! - `extract_experience`: title/description → experience band, via an
//!   ordered rule list (numeric range > bounded single threshold >
//!   qualitative level). A soft annotation: `""` when nothing matches.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static COUNTRIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for (k, v) in [
        // Remote-class synonyms normalize to the "Remote" pseudo-country.
        ("remote", "Remote"),
        ("anywhere", "Remote"),
        ("worldwide", "Remote"),
        ("global", "Remote"),
        ("work from home", "Remote"),
        ("wfh", "Remote"),
        ("fully remote", "Remote"),
        ("united states", "US"),
        ("usa", "US"),
        ("us", "US"),
        ("u.s.", "US"),
        ("u.s.a.", "US"),
        ("america", "US"),
        ("united kingdom", "UK"),
        ("uk", "UK"),
        ("great britain", "UK"),
        ("england", "UK"),
        ("scotland", "UK"),
        ("canada", "CA"),
        ("germany", "DE"),
        ("deutschland", "DE"),
        ("france", "FR"),
        ("netherlands", "NL"),
        ("nl", "NL"),
        ("spain", "ES"),
        ("portugal", "PT"),
        ("poland", "PL"),
        ("italy", "IT"),
        ("ireland", "IE"),
        ("switzerland", "CH"),
        ("austria", "AT"),
        ("belgium", "BE"),
        ("sweden", "SE"),
        ("norway", "NO"),
        ("denmark", "DK"),
        ("finland", "FI"),
        ("estonia", "EE"),
        ("czech republic", "CZ"),
        ("czechia", "CZ"),
        ("india", "IN"),
        ("australia", "AU"),
        ("new zealand", "NZ"),
        ("japan", "JP"),
        ("singapore", "SG"),
        ("brazil", "BR"),
        ("mexico", "MX"),
        ("argentina", "AR"),
        ("south africa", "ZA"),
        ("united arab emirates", "AE"),
        ("uae", "AE"),
    ] {
        m.insert(k, v);
    }
    m
});

/// First-level subdivisions → owning country. Abbreviations and full names
/// both resolve, so "Austin, TX" and "Austin, Texas" agree.
static SUBDIVISIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    const US_STATES: [(&str, &str); 50] = [
        ("al", "alabama"),
        ("ak", "alaska"),
        ("az", "arizona"),
        ("ar", "arkansas"),
        ("ca", "california"),
        ("co", "colorado"),
        ("ct", "connecticut"),
        ("de", "delaware"),
        ("fl", "florida"),
        ("ga", "georgia"),
        ("hi", "hawaii"),
        ("id", "idaho"),
        ("il", "illinois"),
        ("in", "indiana"),
        ("ia", "iowa"),
        ("ks", "kansas"),
        ("ky", "kentucky"),
        ("la", "louisiana"),
        ("me", "maine"),
        ("md", "maryland"),
        ("ma", "massachusetts"),
        ("mi", "michigan"),
        ("mn", "minnesota"),
        ("ms", "mississippi"),
        ("mo", "missouri"),
        ("mt", "montana"),
        ("ne", "nebraska"),
        ("nv", "nevada"),
        ("nh", "new hampshire"),
        ("nj", "new jersey"),
        ("nm", "new mexico"),
        ("ny", "new york"),
        ("nc", "north carolina"),
        ("nd", "north dakota"),
        ("oh", "ohio"),
        ("ok", "oklahoma"),
        ("or", "oregon"),
        ("pa", "pennsylvania"),
        ("ri", "rhode island"),
        ("sc", "south carolina"),
        ("sd", "south dakota"),
        ("tn", "tennessee"),
        ("tx", "texas"),
        ("ut", "utah"),
        ("vt", "vermont"),
        ("va", "virginia"),
        ("wa", "washington"),
        ("wv", "west virginia"),
        ("wi", "wisconsin"),
        ("wy", "wyoming"),
    ];
    for (abbr, name) in US_STATES {
        m.insert(abbr, "US");
        m.insert(name, "US");
    }
    const CA_PROVINCES: [(&str, &str); 10] = [
        ("ab", "alberta"),
        ("bc", "british columbia"),
        ("mb", "manitoba"),
        ("nb", "new brunswick"),
        ("nl", "newfoundland and labrador"),
        ("ns", "nova scotia"),
        ("on", "ontario"),
        ("pe", "prince edward island"),
        ("qc", "quebec"),
        ("sk", "saskatchewan"),
    ];
    for (abbr, name) in CA_PROVINCES {
        m.insert(abbr, "CA");
        m.insert(name, "CA");
    }
    m
});

/// Resolve a location string to a country code. Unknown input is returned
/// unchanged so callers can still display something meaningful.
pub fn extract_country(location: &str) -> String {
    let trimmed = location.trim();
    let lower = trimmed.to_lowercase();

    if let Some(code) = COUNTRIES.get(lower.as_str()) {
        return (*code).to_string();
    }

    // "City, Region" — resolve the region part: country table first, then
    // subdivisions (NL the province must not shadow NL the country).
    if let Some((_, region)) = lower.rsplit_once(',') {
        let region = region.trim();
        if let Some(code) = COUNTRIES.get(region) {
            return (*code).to_string();
        }
        if let Some(code) = SUBDIVISIONS.get(region) {
            return (*code).to_string();
        }
    }

    trimmed.to_string()
}

const MIN_PLAUSIBLE_YEARS: u32 = 1;
const MAX_PLAUSIBLE_YEARS: u32 = 15;

static RE_YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*(?:-|–|to)\s*(\d{1,2})\s*\+?\s*years?").unwrap());
static RE_YEAR_MIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*\+\s*years?").unwrap());

/// Qualitative levels, evaluated top to bottom. The order is policy: the
/// most specific label that appears wins.
static LEVEL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\b(senior|sr\.?)\b", "Senior"),
        (r"(?i)\b(lead|principal|staff)\b", "Lead"),
        (r"(?i)\b(entry[ -]?level|junior|jr\.?|graduate|intern(ship)?)\b", "Entry level"),
        (r"(?i)\b(mid[ -]?level|intermediate)\b", "Mid level"),
    ]
    .into_iter()
    .map(|(p, label)| (Regex::new(p).expect("level rule regex"), label))
    .collect()
});

fn plausible(years: u32) -> bool {
    (MIN_PLAUSIBLE_YEARS..=MAX_PLAUSIBLE_YEARS).contains(&years)
}

/// Infer an experience band from free text. Rule precedence: numeric range,
/// then single numeric threshold, then qualitative level. Numbers outside
/// 1–15 years are ignored (they are usually ZIP codes or salary fragments).
pub fn extract_experience(text: &str) -> String {
    if let Some(caps) = RE_YEAR_RANGE.captures(text) {
        let lo: u32 = caps[1].parse().unwrap_or(0);
        let hi: u32 = caps[2].parse().unwrap_or(0);
        if plausible(lo) && plausible(hi) && lo <= hi {
            return format!("{lo}-{hi} years");
        }
    }

    if let Some(caps) = RE_YEAR_MIN.captures(text) {
        let n: u32 = caps[1].parse().unwrap_or(0);
        if plausible(n) {
            return format!("{n}+ years");
        }
    }

    for (re, label) in LEVEL_RULES.iter() {
        if re.is_match(text) {
            return (*label).to_string();
        }
    }

    String::new()
}
